//! A low-level blocking TCP Spit client.
//!
//! Used directly by tests and wrapped by [`Driver`](super::driver::Driver)
//! for real play.

use anyhow::{Error, bail};
use std::{
    net::{Shutdown, SocketAddr, TcpStream},
    thread,
    time::Duration,
};

use super::{
    super::game::entities::{PlayAction, Username},
    messages::{ClientMessage, ServerMessage},
    utils,
};

/// Default timeout for writing to the server.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// A blocking connection to a Spit server. Reads have no timeout unless
/// one is set.
pub struct Client {
    /// The underlying TCP stream.
    pub stream: TcpStream,
}

impl Client {
    /// Connect to a Spit server.
    ///
    /// This method tries three times with increasing timeouts (100ms,
    /// 500ms, 1s), sleeping between failed attempts.
    ///
    /// # Errors
    ///
    /// Returns an error if every attempt fails.
    pub fn connect(addr: &SocketAddr) -> Result<Self, Error> {
        let mut connect_timeouts = vec![
            Duration::from_secs(1),
            Duration::from_millis(500),
            Duration::from_millis(100),
        ];
        while let Some(connect_timeout) = connect_timeouts.pop() {
            match TcpStream::connect_timeout(addr, connect_timeout) {
                Ok(stream) => {
                    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
                    stream.set_nodelay(true)?;
                    return Ok(Self { stream });
                }
                _ => thread::sleep(connect_timeout),
            }
        }
        bail!("couldn't connect to {addr}")
    }

    /// Another handle on the same connection, for reading and writing from
    /// different threads.
    pub fn try_clone(&self) -> Result<Self, Error> {
        Ok(Self {
            stream: self.stream.try_clone()?,
        })
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), Error> {
        self.stream.set_read_timeout(timeout)?;
        Ok(())
    }

    pub fn send(&mut self, msg: &ClientMessage) -> Result<(), Error> {
        utils::write_prefixed(&mut self.stream, msg)?;
        Ok(())
    }

    /// Block for the next message. `Ok(None)` means the server closed the
    /// connection.
    pub fn recv(&mut self) -> Result<Option<ServerMessage>, Error> {
        Ok(utils::read_prefixed(&mut self.stream)?)
    }

    /// Like [`Client::recv`], but a closed connection is an error.
    pub fn expect_msg(&mut self) -> Result<ServerMessage, Error> {
        match self.recv()? {
            Some(msg) => Ok(msg),
            None => bail!("server closed the connection"),
        }
    }

    pub fn set_name(&mut self, name: &Username) -> Result<(), Error> {
        self.send(&ClientMessage::PlayerName(name.clone()))
    }

    pub fn ready(&mut self) -> Result<(), Error> {
        self.send(&ClientMessage::Ready)
    }

    pub fn play(&mut self, slot: usize, pile: usize) -> Result<(), Error> {
        self.send(&ClientMessage::Play(PlayAction { slot, pile }))
    }

    pub fn done_moving(&mut self) -> Result<(), Error> {
        self.send(&ClientMessage::DoneMoving)
    }

    pub fn got_result(&mut self) -> Result<(), Error> {
        self.send(&ClientMessage::GotResult)
    }

    pub fn quit(&mut self) -> Result<(), Error> {
        self.send(&ClientMessage::Quitting)
    }

    /// Close both directions. Unblocks any thread reading from a clone.
    pub fn shutdown(&self) {
        // The peer may already be gone, which is fine.
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
