//! Single-threaded, edge-triggered event loop.
//!
//! Grounded on the teacher's `net::endpoint::Endpoint`, collapsed from its
//! three-`Poll` (server/handshake/live) design to a single `Poll` since
//! there is no handshake phase once the wire carries no encryption
//! negotiation. Modernized to the current `mio::{Poll, Events, Interest,
//! Token, Waker}` API (the teacher's own `mio` 0.6 `Ready`/`PollOpt::edge()`
//! API is no longer fetchable).

use crate::connection::{Connection, ConnectionId};
use flux::logging::{self, Logger};
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const LISTENER_TOKEN: Token = Token(0);
const WAKER_TOKEN: Token = Token(1);
/// Client tokens start past the two reserved tokens above.
const FIRST_CLIENT_TOKEN: usize = 2;

/// What happened on a given wake-up of the reactor loop.
pub enum ReactorEvent {
    Accepted(ConnectionId),
    Readable(ConnectionId),
    Writable(ConnectionId),
    Closed(ConnectionId),
    /// The reply-queue waker fired; the caller should drain its callbacks.
    WokeUp,
}

/// Owns every live [`Connection`] and the OS readiness primitive watching
/// them, the listening socket, and the reply-queue wake-up handle.
pub struct Reactor {
    poll: Poll,
    listener: TcpListener,
    connections: HashMap<ConnectionId, Connection>,
    tokens: HashMap<Token, ConnectionId>,
    ids_to_tokens: HashMap<ConnectionId, Token>,
    next_id: usize,
    next_token: usize,
    log: Logger,
}

impl Reactor {
    pub fn bind(addr: std::net::SocketAddr, log: &Logger) -> io::Result<(Reactor, Arc<Waker>)> {
        let mut listener = TcpListener::bind(addr)?;
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER_TOKEN, Interest::READABLE)?;

        let waker = Arc::new(Waker::new(poll.registry(), WAKER_TOKEN)?);

        Ok((
            Reactor {
                poll,
                listener,
                connections: HashMap::new(),
                tokens: HashMap::new(),
                ids_to_tokens: HashMap::new(),
                next_id: 0,
                next_token: FIRST_CLIENT_TOKEN,
                log: log.new(logging::o!("component" => "reactor")),
            },
            waker,
        ))
    }

    /// Blocks on the readiness primitive and returns the batch of events
    /// that occurred. `running` is checked between the wait and event
    /// processing so shutdown can interrupt a poll cleanly.
    pub fn poll_once(&mut self, events: &mut Events, running: &AtomicBool) -> io::Result<Vec<ReactorEvent>> {
        self.poll.poll(events, None)?;

        let mut out = Vec::new();
        if !running.load(Ordering::Acquire) {
            return Ok(out);
        }

        for event in events.iter() {
            match event.token() {
                LISTENER_TOKEN => {
                    out.extend(self.accept_loop());
                }
                WAKER_TOKEN => out.push(ReactorEvent::WokeUp),
                token => {
                    if let Some(&id) = self.tokens.get(&token) {
                        if event.is_readable() {
                            out.push(ReactorEvent::Readable(id));
                        }
                        if event.is_writable() {
                            out.push(ReactorEvent::Writable(id));
                        }
                    }
                }
            }
        }

        Ok(out)
    }

    fn accept_loop(&mut self) -> Vec<ReactorEvent> {
        let mut accepted = Vec::new();

        loop {
            match self.listener.accept() {
                Ok((socket, peer)) => {
                    let id = self.insert(socket);
                    logging::debug!(self.log, "accepted connection"; "id" => id.0, "peer" => %peer);
                    accepted.push(ReactorEvent::Accepted(id));
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    logging::warn!(self.log, "accept error"; "err" => %e);
                    break;
                }
            }
        }

        accepted
    }

    fn insert(&mut self, mut socket: TcpStream) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;

        let token = Token(self.next_token);
        self.next_token += 1;

        self.poll
            .registry()
            .register(&mut socket, token, Interest::READABLE)
            .expect("failed to register client socket");

        self.tokens.insert(token, id);
        self.ids_to_tokens.insert(id, token);
        self.connections.insert(id, Connection::new(id, socket));
        id
    }

    pub fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Arms or disarms writable interest for a connection's socket.
    pub fn set_writable_interest(&mut self, id: ConnectionId, want_writable: bool) -> io::Result<()> {
        if let Some(conn) = self.connections.get_mut(&id) {
            let interest = if want_writable {
                Interest::READABLE | Interest::WRITABLE
            } else {
                Interest::READABLE
            };
            let token = *self.ids_to_tokens.get(&id).expect("connection must have a registered token");
            self.poll.registry().reregister(&mut conn.socket, token, interest)?;
        }
        Ok(())
    }

    /// Removes and deregisters a connection once it's fully closed.
    pub fn remove(&mut self, id: ConnectionId) {
        if let Some(mut conn) = self.connections.remove(&id) {
            let _ = self.poll.registry().deregister(&mut conn.socket);
            if let Some(token) = self.ids_to_tokens.remove(&id) {
                self.tokens.remove(&token);
            }
        }
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }
}
