//! Work queue + worker threads + reply queue, grounded on
//! `examples/original_source/backend/include/threading/{TaskQueue,CallbackQueue}.h`:
//! a blocking MPMC queue feeding N worker threads, a second MPMC queue for
//! results, and a waker used the way the original's `CallbackQueue` used an
//! eventfd to interrupt the event loop.
//!
//! `crossbeam-channel` stands in for the original's mutex+condvar queues,
//! matching the pack's (`examples/rdaum-moor`) use of that crate for the
//! same purpose; the teacher has no worker-pool precedent of its own.

use crate::dispatch;
use flux::logging::{self, Logger};
use mio::Waker;
use netio::connection::ConnectionId;
use protocol::packets::PacketType;
use services::Services;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A parsed request handed from the reactor to a worker, tagged with a
/// per-socket sequence number so the reactor can restore arrival order.
pub struct Job {
    pub connection_id: ConnectionId,
    pub seq: u64,
    pub packet_type: PacketType,
    pub payload: Vec<u8>,
}

/// A worker's finished output: framed reply bytes for the requester, plus
/// zero or more framed broadcasts to other connections.
pub struct JobResult {
    pub connection_id: ConnectionId,
    pub seq: u64,
    pub reply: Option<Vec<u8>>,
    pub broadcasts: Vec<(ConnectionId, Vec<u8>)>,
}

pub struct WorkerPool {
    job_tx: crossbeam_channel::Sender<Job>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `workers.max(1)` threads, each popping from the shared job
    /// queue, running the dispatch table against `services`, and pushing its
    /// result onto `reply_tx` before waking the reactor.
    pub fn start(
        workers: usize,
        services: Arc<Services>,
        reply_tx: crossbeam_channel::Sender<JobResult>,
        waker: Arc<Waker>,
        log: &Logger,
    ) -> WorkerPool {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();

        let handles = (0..workers.max(1))
            .map(|idx| {
                let job_rx = job_rx.clone();
                let services = services.clone();
                let reply_tx = reply_tx.clone();
                let waker = waker.clone();
                let worker_log = log.new(logging::o!("worker" => idx));
                thread::spawn(move || worker_loop(job_rx, &services, &reply_tx, &waker, &worker_log))
            })
            .collect();

        WorkerPool { job_tx, handles }
    }

    /// Non-blocking; the queue itself provides backpressure-free buffering.
    pub fn push(&self, job: Job) {
        // Channel is never closed while the pool is alive, so this cannot fail.
        let _ = self.job_tx.send(job);
    }

    /// Closes the job queue so every worker's blocking `recv` returns `Err`
    /// once drained, then joins them. Tasks already queued still run;
    /// nothing new can be pushed after this point.
    pub fn shutdown(self) {
        drop(self.job_tx);
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

fn worker_loop(
    job_rx: crossbeam_channel::Receiver<Job>,
    services: &Arc<Services>,
    reply_tx: &crossbeam_channel::Sender<JobResult>,
    waker: &Arc<Waker>,
    log: &Logger,
) {
    while let Ok(job) = job_rx.recv() {
        let connection_id = job.connection_id;
        let seq = job.seq;
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| dispatch::handle(job, services, log)));

        let result = match outcome {
            Ok(result) => result,
            Err(_) => {
                logging::error!(log, "dispatch handler panicked, dropping task"; "id" => connection_id.0, "seq" => seq);
                continue;
            }
        };

        if reply_tx.send(result).is_err() {
            break;
        }
        if let Err(e) = waker.wake() {
            logging::warn!(log, "failed to wake reactor"; "err" => %e);
        }
    }
}

/// Restores per-socket reply ordering when more than one worker is running:
/// requests from a given socket are handed to workers in arrival order and
/// tagged with an increasing sequence number; this holds completed results
/// back until every lower-numbered result for that socket has been released.
#[derive(Default)]
pub struct PerSocketSequencer {
    next_expected: HashMap<ConnectionId, u64>,
    pending: HashMap<ConnectionId, BTreeMap<u64, JobResult>>,
}

impl PerSocketSequencer {
    pub fn new() -> PerSocketSequencer {
        PerSocketSequencer::default()
    }

    /// Feeds one freshly completed result in; returns every result (possibly
    /// more than one, possibly none) now safe to deliver in order.
    pub fn complete(&mut self, result: JobResult) -> Vec<JobResult> {
        let conn = result.connection_id;
        let expected = self.next_expected.entry(conn).or_insert(0);
        let bucket = self.pending.entry(conn).or_default();
        bucket.insert(result.seq, result);

        let mut ready = Vec::new();
        while let Some(next) = bucket.remove(expected) {
            ready.push(next);
            *expected += 1;
        }
        ready
    }

    /// Drops all bookkeeping for a connection once it's closed; any results
    /// still pending for it are stale and not worth tracking further.
    pub fn forget(&mut self, conn: ConnectionId) {
        self.next_expected.remove(&conn);
        self.pending.remove(&conn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(conn: ConnectionId, seq: u64) -> JobResult {
        JobResult {
            connection_id: conn,
            seq,
            reply: None,
            broadcasts: Vec::new(),
        }
    }

    #[test]
    fn releases_in_order_even_when_completed_out_of_order() {
        let mut seq = PerSocketSequencer::new();
        let conn = ConnectionId(1);

        assert_eq!(seq.complete(result(conn, 1)).len(), 0);
        assert_eq!(seq.complete(result(conn, 2)).len(), 0);
        let released = seq.complete(result(conn, 0));
        assert_eq!(released.iter().map(|r| r.seq).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn sequences_are_independent_per_connection() {
        let mut seq = PerSocketSequencer::new();
        let a = ConnectionId(1);
        let b = ConnectionId(2);

        assert_eq!(seq.complete(result(b, 0)).len(), 1);
        assert_eq!(seq.complete(result(a, 0)).len(), 1);
    }
}
