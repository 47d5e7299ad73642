//! Readiness-driven connection multiplexing for the Spit server.
//!
//! A [`Hub`] owns the listening socket and every open connection. It knows
//! nothing about the game; everything it reads is handed to a [`Handler`],
//! and the handler talks back through the hub's send methods.

use log::{debug, error, info, warn};
use mio::{
    Events, Interest, Poll, Token,
    net::{TcpListener, TcpStream},
};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::HashMap,
    fmt,
    io::{self, Read, Write},
    net::SocketAddr,
    time::{Duration, Instant},
};

use super::{
    errors::{is_disconnect, is_transient_accept},
    utils::{FrameDecoder, MAX_MESSAGE_SIZE, encode_frame},
};

/// Token reserved for the listening socket.
pub const LISTENER: Token = Token(0);

const READ_CHUNK: usize = 4096;
const EVENT_CAPACITY: usize = 128;

/// Most unsent output a connection may hold before it's dropped.
pub const MAX_BUFFERED_BYTES: usize = 4 * MAX_MESSAGE_SIZE;

/// Identity of an open connection. Never reused within one hub.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ConnectionId(pub(crate) usize);

impl From<Token> for ConnectionId {
    fn from(token: Token) -> Self {
        Self(token.0)
    }
}

impl From<ConnectionId> for Token {
    fn from(id: ConnectionId) -> Self {
        Token(id.0)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Callbacks a [`Hub`] drives while it waits on sockets.
pub trait Handler {
    type Message: DeserializeOwned;

    /// Whether a pending connection should be admitted. Connections that
    /// arrive while this is false are accepted and immediately closed.
    fn accepting(&self) -> bool;

    /// Checked between events; once false, remaining events are dropped.
    fn is_running(&self) -> bool;

    fn on_connect(&mut self, hub: &mut Hub, id: ConnectionId, addr: SocketAddr);

    fn on_message(&mut self, hub: &mut Hub, id: ConnectionId, msg: Self::Message);

    /// The connection is already gone by the time this is called.
    fn on_disconnect(&mut self, hub: &mut Hub, id: ConnectionId);
}

struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
    decoder: FrameDecoder,
    outbuf: Vec<u8>,
    wants_write: bool,
}

impl Connection {
    fn new(stream: TcpStream, addr: SocketAddr) -> Self {
        Self {
            stream,
            addr,
            decoder: FrameDecoder::new(),
            outbuf: Vec::new(),
            wants_write: false,
        }
    }

    /// Write as much buffered output as the socket will take. Returns
    /// whether the buffer drained.
    fn flush(&mut self) -> io::Result<bool> {
        while !self.outbuf.is_empty() {
            match self.stream.write(&self.outbuf) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.outbuf.drain(..n);
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error),
            }
        }
        Ok(true)
    }

    /// Drain the socket and decode every complete frame. The flag is set
    /// when the connection can't be read from anymore.
    fn receive<T: DeserializeOwned>(&mut self) -> (Vec<T>, bool) {
        let mut buf = [0; READ_CHUNK];
        let mut closed = false;
        loop {
            match self.stream.read(&mut buf) {
                Ok(0) => {
                    closed = true;
                    break;
                }
                Ok(n) => self.decoder.extend(&buf[..n]),
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => break,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => {
                    if is_disconnect(&error) {
                        debug!("{} went away: {error}", self.addr);
                    } else {
                        error!("{} read failed: {error}", self.addr);
                    }
                    closed = true;
                    break;
                }
            }
        }

        let mut messages = Vec::new();
        loop {
            let pending = self.decoder.pending();
            match self.decoder.next_frame() {
                Ok(Some(msg)) => messages.push(msg),
                Ok(None) => break,
                // The bad frame was consumed, so the stream is still aligned.
                Err(error) if self.decoder.pending() < pending => {
                    warn!("{} sent an invalid message: {error}", self.addr);
                }
                Err(error) => {
                    warn!("{} sent an unreadable frame: {error}", self.addr);
                    closed = true;
                    break;
                }
            }
        }
        (messages, closed)
    }
}

pub struct Hub {
    poll: Poll,
    events: Events,
    listener: TcpListener,
    connections: HashMap<ConnectionId, Connection>,
    next_token: usize,
    dead: Vec<ConnectionId>,
}

impl Hub {
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(addr)?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        Ok(Self {
            poll,
            events: Events::with_capacity(EVENT_CAPACITY),
            listener,
            connections: HashMap::new(),
            next_token: LISTENER.0 + 1,
            dead: Vec::new(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Take the next waiting connection off the listener. Connections that
    /// die before they're accepted are skipped. `None` means nothing more
    /// can be accepted right now.
    fn next_pending(&mut self) -> Option<(TcpStream, SocketAddr)> {
        loop {
            match self.listener.accept() {
                Ok(pending) => return Some(pending),
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return None,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) if is_transient_accept(&error) => {
                    debug!("pending connection went away: {error}");
                }
                Err(error) => {
                    error!("can't accept connections: {error}");
                    return None;
                }
            }
        }
    }

    /// Accept up to `n` connections that are already waiting, without
    /// blocking. Each is registered for reads.
    pub fn accept_connections(&mut self, n: usize) -> Vec<(ConnectionId, SocketAddr)> {
        let mut accepted = Vec::new();
        while accepted.len() < n {
            let Some((mut stream, addr)) = self.next_pending() else {
                break;
            };
            let id = ConnectionId(self.next_token);
            self.next_token += 1;
            if let Err(error) = self
                .poll
                .registry()
                .register(&mut stream, id.into(), Interest::READABLE)
            {
                warn!("{addr} dropped, can't register it: {error}");
                continue;
            }
            self.connections.insert(id, Connection::new(stream, addr));
            info!("{addr} connected as {id}");
            accepted.push((id, addr));
        }
        accepted
    }

    /// Accept and immediately close up to `n` waiting connections. Returns
    /// how many were turned away.
    pub fn reject_connections(&mut self, n: usize) -> usize {
        let mut rejected = 0;
        while rejected < n {
            let Some((stream, addr)) = self.next_pending() else {
                break;
            };
            warn!("{addr} rejected, no seats left");
            drop(stream);
            rejected += 1;
        }
        rejected
    }

    /// Open connections in the order they were accepted. Connections with a
    /// failed send are left out even before they're reaped.
    #[must_use]
    pub fn connections(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<_> = self
            .connections
            .keys()
            .filter(|id| !self.dead.contains(*id))
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Queue a message and write as much of it as the socket takes. Returns
    /// false if the connection is unknown or broken. A broken connection,
    /// including one whose unsent output would pass [`MAX_BUFFERED_BYTES`],
    /// is reaped by the next [`Hub::receive_one`].
    pub fn send<T: Serialize>(&mut self, id: ConnectionId, msg: &T) -> bool {
        if self.dead.contains(&id) {
            return false;
        }
        let frame = match encode_frame(msg) {
            Ok(frame) => frame,
            Err(error) => {
                error!("can't encode message for {id}: {error}");
                return false;
            }
        };
        let Some(conn) = self.connections.get_mut(&id) else {
            return false;
        };
        if conn.outbuf.len() + frame.len() > MAX_BUFFERED_BYTES {
            warn!(
                "{} ({id}) isn't reading, dropping it with {} bytes unsent",
                conn.addr,
                conn.outbuf.len()
            );
            self.dead.push(id);
            return false;
        }
        conn.outbuf.extend(frame);
        self.write_out(id)
    }

    /// Close a connection without telling the handler. Returns whether it
    /// was open.
    pub fn remove_connection(&mut self, id: ConnectionId) -> bool {
        self.dead.retain(|dead| *dead != id);
        match self.connections.remove(&id) {
            Some(mut conn) => {
                if let Err(error) = self.poll.registry().deregister(&mut conn.stream) {
                    debug!("{id} deregister failed: {error}");
                }
                info!("{} ({id}) disconnected", conn.addr);
                true
            }
            None => false,
        }
    }

    /// Wait for socket readiness and dispatch whatever arrived. A `None`
    /// timeout blocks until something happens; an interrupted wait returns
    /// without dispatching anything. Only a failed poll is an error.
    pub fn receive_one<H: Handler>(
        &mut self,
        handler: &mut H,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        if let Err(error) = self.poll.poll(&mut self.events, timeout) {
            if error.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(error);
        }
        self.reap(handler);

        let ready: Vec<_> = self
            .events
            .iter()
            .map(|event| {
                let readable = event.is_readable() || event.is_read_closed() || event.is_error();
                (event.token(), readable, event.is_writable())
            })
            .collect();
        for (token, readable, writable) in ready {
            if !handler.is_running() {
                break;
            }
            if token == LISTENER {
                self.admit(handler);
            } else {
                let id = ConnectionId::from(token);
                if writable {
                    self.write_out(id);
                }
                if readable {
                    self.read_from(handler, id);
                }
            }
            self.reap(handler);
        }
        Ok(())
    }

    /// Keep writing buffered output until it's all out or the deadline
    /// passes.
    pub fn flush_pending(&mut self, deadline: Instant) {
        loop {
            let pending: Vec<_> = self
                .connections
                .iter()
                .filter(|(id, conn)| !conn.outbuf.is_empty() && !self.dead.contains(*id))
                .map(|(id, _)| *id)
                .collect();
            if pending.is_empty() {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                warn!("{} connection(s) still had unsent data", pending.len());
                return;
            }
            if let Err(error) = self.poll.poll(&mut self.events, Some(deadline - now)) {
                if error.kind() != io::ErrorKind::Interrupted {
                    error!("poll failed while flushing: {error}");
                    return;
                }
            }
            for id in pending {
                self.write_out(id);
            }
        }
    }

    fn admit<H: Handler>(&mut self, handler: &mut H) {
        loop {
            if handler.accepting() {
                let Some(&(id, addr)) = self.accept_connections(1).first() else {
                    return;
                };
                handler.on_connect(self, id, addr);
            } else if self.reject_connections(1) == 0 {
                return;
            }
        }
    }

    fn write_out(&mut self, id: ConnectionId) -> bool {
        let Some(conn) = self.connections.get_mut(&id) else {
            return false;
        };
        let result = conn.flush().and_then(|drained| {
            let wants_write = !drained;
            if wants_write != conn.wants_write {
                let interest = if wants_write {
                    Interest::READABLE.add(Interest::WRITABLE)
                } else {
                    Interest::READABLE
                };
                self.poll
                    .registry()
                    .reregister(&mut conn.stream, id.into(), interest)?;
                conn.wants_write = wants_write;
            }
            Ok(())
        });
        match result {
            Ok(()) => true,
            Err(error) => {
                if is_disconnect(&error) {
                    debug!("{} ({id}) went away mid-write: {error}", conn.addr);
                } else {
                    warn!("{} ({id}) write failed: {error}", conn.addr);
                }
                if !self.dead.contains(&id) {
                    self.dead.push(id);
                }
                false
            }
        }
    }

    fn read_from<H: Handler>(&mut self, handler: &mut H, id: ConnectionId) {
        let (messages, closed) = match self.connections.get_mut(&id) {
            Some(conn) => conn.receive::<H::Message>(),
            None => return,
        };
        for msg in messages {
            if !handler.is_running() {
                break;
            }
            handler.on_message(self, id, msg);
        }
        if closed && !self.dead.contains(&id) {
            self.dead.push(id);
        }
    }

    fn reap<H: Handler>(&mut self, handler: &mut H) {
        while let Some(id) = self.dead.pop() {
            if self.remove_connection(id) {
                handler.on_disconnect(self, id);
            }
        }
    }
}
