//! Two-thread client protocol driver.
//!
//! A listener thread reads server messages and answers the handshake on
//! its own; a sender thread drains an [`IntentQueue`] onto the socket. Both
//! share a [`StatusMonitor`] so nothing but the result acknowledgement goes
//! out once the game has stopped.

use anyhow::{Error, anyhow};
use log::{debug, info, warn};
use std::{
    collections::VecDeque,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
};

use super::{
    super::game::entities::Username,
    client::Client,
    messages::{ClientMessage, ServerMessage, StateTag, StopReason},
};

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum DriverStatus {
    Setup,
    Readying,
    Playing,
    Stopping,
}

/// Shared driver status. Once it reaches [`DriverStatus::Stopping`] it never
/// changes again.
#[derive(Debug)]
pub struct StatusMonitor {
    status: Mutex<DriverStatus>,
}

impl Default for StatusMonitor {
    fn default() -> Self {
        Self {
            status: Mutex::new(DriverStatus::Setup),
        }
    }
}

impl StatusMonitor {
    fn lock(&self) -> MutexGuard<'_, DriverStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn get(&self) -> DriverStatus {
        *self.lock()
    }

    /// Move to `status`. Returns false, changing nothing, if the driver is
    /// stopping or already there.
    pub fn set(&self, status: DriverStatus) -> bool {
        let mut current = self.lock();
        if *current == DriverStatus::Stopping || *current == status {
            return false;
        }
        *current = status;
        true
    }

    pub fn stop(&self) {
        *self.lock() = DriverStatus::Stopping;
    }

    #[must_use]
    pub fn is_stopping(&self) -> bool {
        self.get() == DriverStatus::Stopping
    }
}

/// Messages waiting to go to the server. `None` entries only wake the
/// sender up.
#[derive(Debug, Default)]
pub struct IntentQueue {
    queue: Mutex<VecDeque<Option<ClientMessage>>>,
    ready: Condvar,
}

impl IntentQueue {
    fn lock(&self) -> MutexGuard<'_, VecDeque<Option<ClientMessage>>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push_entry(&self, entry: Option<ClientMessage>) {
        self.lock().push_back(entry);
        self.ready.notify_one();
    }

    pub fn push(&self, msg: ClientMessage) {
        self.push_entry(Some(msg));
    }

    pub fn push_sentinel(&self) {
        self.push_entry(None);
    }

    /// Block until an entry is available.
    pub fn pop(&self) -> Option<ClientMessage> {
        let mut queue = self.lock();
        loop {
            if let Some(entry) = queue.pop_front() {
                return entry;
            }
            queue = self
                .ready
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Whatever shows the game to a player.
pub trait Frontend: Send + 'static {
    /// Called from the listener thread for every server message, after the
    /// driver has handled its own part of the protocol.
    fn on_message(&mut self, msg: &ServerMessage, intents: &IntentQueue);
}

/// How the game ended for this client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameResult {
    pub reason: StopReason,
    pub detail: Option<String>,
}

pub struct Driver {
    intents: Arc<IntentQueue>,
    status: Arc<StatusMonitor>,
    listener: JoinHandle<Option<GameResult>>,
    sender: JoinHandle<()>,
}

impl Driver {
    /// Spawn the listener and sender threads for a connected client.
    pub fn start<F: Frontend>(client: Client, name: Username, frontend: F) -> Result<Self, Error> {
        let reader = client.try_clone()?;
        let intents = Arc::new(IntentQueue::default());
        let status = Arc::new(StatusMonitor::default());

        let listener = {
            let intents = intents.clone();
            let status = status.clone();
            thread::spawn(move || listen(reader, &name, frontend, &intents, &status))
        };
        let sender = {
            let intents = intents.clone();
            let status = status.clone();
            thread::spawn(move || send_intents(client, &intents, &status))
        };
        Ok(Self {
            intents,
            status,
            listener,
            sender,
        })
    }

    #[must_use]
    pub fn intents(&self) -> Arc<IntentQueue> {
        self.intents.clone()
    }

    #[must_use]
    pub fn status(&self) -> DriverStatus {
        self.status.get()
    }

    /// Tell the server we're leaving and stop.
    pub fn quit(&self) {
        self.intents.push(ClientMessage::Quitting);
    }

    /// Wait for both threads. Returns the result if the game reached one.
    pub fn join(self) -> Result<Option<GameResult>, Error> {
        let result = self
            .listener
            .join()
            .map_err(|_| anyhow!("listener thread panicked"))?;
        self.sender
            .join()
            .map_err(|_| anyhow!("sender thread panicked"))?;
        Ok(result)
    }
}

fn listen<F: Frontend>(
    mut client: Client,
    name: &Username,
    mut frontend: F,
    intents: &IntentQueue,
    status: &StatusMonitor,
) -> Option<GameResult> {
    let mut result = None;
    loop {
        let msg = match client.recv() {
            Ok(Some(msg)) => msg,
            Ok(None) => {
                info!("server closed the connection");
                break;
            }
            Err(error) => {
                if !status.is_stopping() {
                    warn!("lost the server: {error}");
                }
                break;
            }
        };
        debug!("received {msg}");
        match &msg {
            ServerMessage::NameRequest => intents.push(ClientMessage::PlayerName(name.clone())),
            ServerMessage::AllNames(_) => {
                if status.set(DriverStatus::Readying) {
                    intents.push(ClientMessage::Ready);
                }
            }
            ServerMessage::State(StateTag::Initial, _) => {
                status.set(DriverStatus::Playing);
            }
            _ => {}
        }
        frontend.on_message(&msg, intents);
        if let ServerMessage::GameStopped { reason, detail } = msg {
            if reason.is_result() {
                intents.push(ClientMessage::GotResult);
            }
            result = Some(GameResult { reason, detail });
            break;
        }
    }
    status.stop();
    intents.push_sentinel();
    result
}

fn send_intents(mut client: Client, intents: &IntentQueue, status: &StatusMonitor) {
    loop {
        let Some(msg) = intents.pop() else {
            if status.is_stopping() {
                break;
            }
            continue;
        };
        let game_msg = matches!(
            msg,
            ClientMessage::Play(_) | ClientMessage::Ready | ClientMessage::DoneMoving
        );
        if game_msg && status.is_stopping() {
            debug!("game is over, not sending that it {msg}");
            continue;
        }
        if let Err(error) = client.send(&msg) {
            warn!("couldn't send that it {msg}: {error}");
            status.stop();
            client.shutdown();
            break;
        }
        if msg == ClientMessage::Quitting {
            status.stop();
            client.shutdown();
            break;
        }
    }
}
