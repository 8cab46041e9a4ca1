//! Per-socket connection state owned exclusively by the reactor thread.
//!
//! Grounded on the teacher's `net::channel::Channel`, with the encrypted
//! framing stripped out: a connection here is nothing more than two
//! [`Buffer`]s and the socket they wrap.

use crate::buffer::{Buffer, DEFAULT_SOFT_CAP};
use flux::logging::Logger;
use mio::net::TcpStream;
use std::io;

/// Stable logical identity for a connection, assigned on accept. Never
/// reused across a close/reopen the way a raw fd or `mio::Token` might be.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ConnectionId(pub usize);

/// Default cap on the send buffer; a connection whose outbound queue grows
/// past this is closed rather than left to grow unbounded.
pub const SEND_SOFT_CAP: usize = 1024 * 1024;

pub struct Connection {
    pub id: ConnectionId,
    pub socket: TcpStream,
    recv: Buffer,
    send: Buffer,
    send_cap: usize,
    closed: bool,
}

impl Connection {
    pub fn new(id: ConnectionId, socket: TcpStream) -> Connection {
        Connection::with_caps(id, socket, DEFAULT_SOFT_CAP, SEND_SOFT_CAP)
    }

    pub fn with_caps(id: ConnectionId, socket: TcpStream, recv_cap: usize, send_cap: usize) -> Connection {
        Connection {
            id,
            socket,
            recv: Buffer::new(recv_cap),
            send: Buffer::new(send_cap),
            send_cap,
            closed: false,
        }
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub fn mark_closed(&mut self) {
        self.closed = true;
    }

    /// Drains the socket into the recv buffer until it would block or the
    /// peer closes. Marks the connection closed on EOF or hard error.
    pub fn on_readable(&mut self, log: &Logger) -> io::Result<()> {
        match self.recv.ingress(&mut self.socket) {
            Ok((_n, peer_closed)) => {
                if peer_closed {
                    self.closed = true;
                }
                Ok(())
            }
            Err(e) => {
                flux::logging::debug!(log, "connection read error"; "id" => self.id.0, "err" => %e);
                self.closed = true;
                Err(e)
            }
        }
    }

    /// True once the recv buffer contains a complete frame from the cursor.
    pub fn has_complete_packet(&self) -> bool {
        matches!(
            protocol::frame::try_decode_one(self.recv.pending()),
            protocol::ReadOutcome::Ok { .. }
        )
    }

    /// Returns the unconsumed recv bytes for the reactor to parse frames out of.
    pub fn view_pending(&self) -> &[u8] {
        self.recv.pending()
    }

    /// Advances the recv cursor past a fully parsed frame.
    pub fn consume(&mut self, n: usize) {
        self.recv.consume(n);
    }

    /// Attempts an immediate write; anything that doesn't fit is queued.
    /// Returns `true` if bytes remain queued (the reactor should arm
    /// writable interest), `false` if everything was sent immediately.
    /// Returns `Err` if the send buffer would exceed its soft cap.
    pub fn try_send(&mut self, bytes: &[u8]) -> io::Result<bool> {
        self.send.push(bytes);
        self.send.egress(&mut self.socket)?;

        if self.send.len() > self.send_cap {
            self.closed = true;
            return Err(io::Error::new(io::ErrorKind::Other, "send buffer soft cap exceeded"));
        }

        Ok(!self.send.is_empty())
    }

    /// Drains the send buffer into the socket until it would block or empties.
    /// Returns `true` if the buffer is now empty (writable interest can be
    /// disarmed).
    pub fn on_writable(&mut self) -> io::Result<bool> {
        self.send.egress(&mut self.socket)?;
        Ok(self.send.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_is_stable_and_ordered() {
        let a = ConnectionId(1);
        let b = ConnectionId(2);
        assert!(a < b);
        assert_eq!(a, ConnectionId(1));
    }
}
