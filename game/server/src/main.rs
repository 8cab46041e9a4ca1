//! Binary entry point, grounded on
//! `examples/original_source/backend/src/network/Server.cpp`'s `run()` loop
//! (accept/read/dispatch/write) and on the pack's `rdaum-moor` daemon for the
//! signal-driven shutdown shape.

mod cli;
mod dispatch;
mod workerpool;

use clap::Parser;
use flux::logging::{self, Logger};
use mio::Events;
use netio::connection::ConnectionId;
use netio::reactor::{Reactor, ReactorEvent};
use protocol::frame;
use protocol::packets::PacketType;
use protocol::ReadOutcome;
use services::auth::Sha256Hasher;
use services::Services;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use workerpool::{Job, JobResult, PerSocketSequencer, WorkerPool};

fn main() {
    let args = cli::Args::parse();
    let log = logging::init(&args.log_level);

    if let Err(e) = run(args, &log) {
        logging::error!(log, "server exited with error"; "err" => %e);
        std::process::exit(1);
    }
}

fn run(args: cli::Args, log: &Logger) -> anyhow::Result<()> {
    let services = Arc::new(Services::new(&args.data_dir, Box::new(Sha256Hasher), log)?);

    let addr: SocketAddr = ([0, 0, 0, 0], args.port).into();
    let (mut reactor, waker) = Reactor::bind(addr, log)?;
    logging::info!(log, "listening"; "port" => args.port, "workers" => args.workers);

    let running = Arc::new(AtomicBool::new(true));
    spawn_signal_thread(running.clone(), waker.clone(), log.clone())?;

    let (reply_tx, reply_rx) = crossbeam_channel::unbounded::<JobResult>();
    let pool = WorkerPool::start(args.workers, services.clone(), reply_tx, waker.clone(), log);

    let mut sequencer = PerSocketSequencer::new();
    let mut next_seq: HashMap<ConnectionId, u64> = HashMap::new();
    let mut events = Events::with_capacity(1024);

    while running.load(Ordering::Acquire) {
        let batch = reactor.poll_once(&mut events, &running)?;

        for event in batch {
            match event {
                ReactorEvent::Accepted(id) => {
                    logging::debug!(log, "connection accepted"; "id" => id.0);
                }

                ReactorEvent::Readable(id) => {
                    let peer_closed = match reactor.connection_mut(id) {
                        Some(conn) => conn.on_readable(log).is_err() || conn.is_closed(),
                        None => continue,
                    };

                    let (frames, framing_fault) = drain_frames(&mut reactor, id, log);
                    for (packet_type, payload) in frames {
                        let seq_counter = next_seq.entry(id).or_insert(0);
                        let seq = *seq_counter;
                        *seq_counter += 1;
                        pool.push(Job {
                            connection_id: id,
                            seq,
                            packet_type,
                            payload,
                        });
                    }

                    if peer_closed || framing_fault {
                        close_connection(&mut reactor, &services, &mut sequencer, &mut next_seq, id, log);
                    }
                }

                ReactorEvent::Writable(id) => {
                    let outcome = reactor.connection_mut(id).map(|conn| conn.on_writable());
                    match outcome {
                        Some(Ok(flushed_empty)) => {
                            if flushed_empty {
                                let _ = reactor.set_writable_interest(id, false);
                            }
                        }
                        Some(Err(_)) => {
                            close_connection(&mut reactor, &services, &mut sequencer, &mut next_seq, id, log);
                        }
                        None => {}
                    }
                }

                ReactorEvent::Closed(id) => {
                    close_connection(&mut reactor, &services, &mut sequencer, &mut next_seq, id, log);
                }

                ReactorEvent::WokeUp => {
                    while let Ok(result) = reply_rx.try_recv() {
                        for ready in sequencer.complete(result) {
                            deliver(&mut reactor, ready, log);
                        }
                    }
                }
            }
        }
    }

    logging::info!(log, "shutting down");
    pool.shutdown();
    for id in reactor.connection_ids() {
        reactor.remove(id);
    }
    Ok(())
}

/// Pulls every complete frame out of a connection's recv buffer, translating
/// each into a `(PacketType, payload)` pair. Unknown packet types are logged
/// and dropped without producing a job; a framing fault is signalled via the
/// returned bool so the caller closes the connection.
fn drain_frames(reactor: &mut Reactor, id: ConnectionId, log: &Logger) -> (Vec<(PacketType, Vec<u8>)>, bool) {
    let mut frames = Vec::new();

    loop {
        let conn = match reactor.connection_mut(id) {
            Some(c) => c,
            None => return (frames, false),
        };

        let outcome = frame::try_decode_one(conn.view_pending());
        match outcome {
            ReadOutcome::NeedMore => return (frames, false),
            ReadOutcome::Bad => return (frames, true),
            ReadOutcome::BadVersion { consumed } => {
                logging::warn!(log, "dropped frame with mismatched protocol version"; "id" => id.0);
                conn.consume(consumed);
            }
            ReadOutcome::Ok {
                packet_type,
                payload_start,
                payload_end,
                consumed,
            } => {
                let payload = conn.view_pending()[payload_start..payload_end].to_vec();
                conn.consume(consumed);
                match PacketType::from_code(packet_type) {
                    Some(pt) => frames.push((pt, payload)),
                    None => {
                        logging::debug!(log, "dropped unknown packet type"; "id" => id.0, "code" => packet_type);
                    }
                }
            }
        }
    }
}

/// Writes a job result's reply and broadcasts out to their sockets, arming
/// writable interest for whichever connections still have bytes queued.
fn deliver(reactor: &mut Reactor, result: JobResult, log: &Logger) {
    if let Some(bytes) = result.reply {
        send_to(reactor, result.connection_id, &bytes, log);
    }
    for (target, bytes) in result.broadcasts {
        send_to(reactor, target, &bytes, log);
    }
}

fn send_to(reactor: &mut Reactor, id: ConnectionId, bytes: &[u8], log: &Logger) {
    let outcome = match reactor.connection_mut(id) {
        Some(conn) => conn.try_send(bytes),
        None => return,
    };
    match outcome {
        Ok(wants_writable) => {
            if wants_writable {
                let _ = reactor.set_writable_interest(id, true);
            }
        }
        Err(e) => {
            logging::warn!(log, "send failed, closing connection"; "id" => id.0, "err" => %e);
            reactor.remove(id);
        }
    }
}

fn close_connection(
    reactor: &mut Reactor,
    services: &Services,
    sequencer: &mut PerSocketSequencer,
    next_seq: &mut HashMap<ConnectionId, u64>,
    id: ConnectionId,
    log: &Logger,
) {
    let username = services
        .auth
        .all_sessions()
        .into_iter()
        .find(|s| s.connection_id == id.0)
        .map(|s| s.username);

    services.auth.handle_disconnect(id.0);
    if let Some(username) = &username {
        services.match_service.handle_disconnect(username);
        if let Some(outcome) = services.room.handle_disconnect(username) {
            if let Some((target, notification)) = outcome.notify {
                let bytes = {
                    use protocol::packets::Packet;
                    let (code, payload) = notification.encode();
                    frame::encode(code, &payload)
                };
                send_to(reactor, ConnectionId(target), &bytes, log);
            }
        }
    }

    logging::debug!(log, "connection closed"; "id" => id.0, "username" => username.as_deref().unwrap_or(""));
    sequencer.forget(id);
    next_seq.remove(&id);
    reactor.remove(id);
}

fn spawn_signal_thread(running: Arc<AtomicBool>, waker: Arc<mio::Waker>, log: Logger) -> anyhow::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::spawn(move || {
        if signals.forever().next().is_some() {
            logging::info!(log, "received shutdown signal");
            running.store(false, Ordering::Release);
            let _ = waker.wake();
        }
    });
    Ok(())
}
