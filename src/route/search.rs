use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use nalgebra::Vector2;
use thiserror::Error;

use crate::config::RouteConfig;
use crate::route::{leg_score, RouteSolution};
use crate::telemetry::channel;
use crate::telem;

// ---------------------------------------------------------------------------
// Parallel exhaustive route search
// ---------------------------------------------------------------------------
//
// Permutations are enumerated in lexicographic order and partitioned
// round-robin by index across a fixed set of worker threads, so the split is
// deterministic regardless of scheduling. Each worker keeps a local best
// (strict improvement only, which makes the lexicographically first ordering
// win ties) and reports once at the end over an mpsc channel. The caller
// polls; nothing here blocks a control tick.

const TAG: &str = "route";

#[derive(Debug, Error)]
pub enum RouteError {
    /// More waypoints than the factorial search is allowed to take on.
    #[error("{0} waypoints exceeds the exhaustive-search bound")]
    TooManyWaypoints(usize),
    /// A worker exited without reporting, i.e. it panicked.
    #[error("route worker exited without reporting a result")]
    WorkerLost,
}

struct WorkerBest {
    order: Option<Vec<usize>>,
    score: f64,
}

pub struct RouteSearch {
    handles: Vec<JoinHandle<()>>,
    rx: Receiver<WorkerBest>,
    received: usize,
    best: Option<WorkerBest>,
    waypoint_count: usize,
}

impl RouteSearch {
    /// Kick off the search over a waypoint snapshot. Returns immediately;
    /// poll [`try_harvest`](Self::try_harvest) for the result.
    pub fn spawn(
        cfg: &RouteConfig,
        start: Vector2<f64>,
        heading: f64,
        waypoints: &[Vector2<f64>],
    ) -> Result<Self, RouteError> {
        let n = waypoints.len();
        if n > cfg.max_exhaustive {
            return Err(RouteError::TooManyWaypoints(n));
        }
        let workers = if cfg.workers > 0 {
            cfg.workers
        } else {
            thread::available_parallelism().map(|p| p.get()).unwrap_or(1)
        };
        telem!(TAG, channel::ROUTE, "searching {n} waypoints on {workers} workers");

        let (tx, rx) = mpsc::channel();
        let mut handles = Vec::with_capacity(workers);
        for me in 0..workers {
            let tx = tx.clone();
            let cfg = cfg.clone();
            let wps: Vec<Vector2<f64>> = waypoints.to_vec();
            handles.push(thread::spawn(move || {
                let best = search_share(&cfg, start, heading, &wps, me, workers);
                // The receiver may already be gone if the caller lost
                // interest; that is not the worker's problem.
                let _ = tx.send(best);
            }));
        }
        Ok(Self { handles, rx, received: 0, best: None, waypoint_count: n })
    }

    /// Number of waypoints in the snapshot this search was started over.
    /// The caller compares it against its working set to detect staleness.
    pub fn waypoint_count(&self) -> usize {
        self.waypoint_count
    }

    /// Non-blocking poll. `Ok(Some(..))` exactly once, when every worker has
    /// reported; `Ok(None)` while the search is still running.
    pub fn try_harvest(&mut self) -> Result<Option<RouteSolution>, RouteError> {
        // Observe completion before draining: a report sent before a thread
        // finished is guaranteed visible to the try_recv loop below, so
        // "all finished, reports missing" can only mean a panic.
        let all_finished = self.handles.iter().all(|h| h.is_finished());
        loop {
            match self.rx.try_recv() {
                Ok(report) => {
                    self.merge(report);
                    self.received += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if self.received == self.handles.len() {
            for h in self.handles.drain(..) {
                let _ = h.join();
            }
            let best = self.best.take().ok_or(RouteError::WorkerLost)?;
            let order = best.order.ok_or(RouteError::WorkerLost)?;
            return Ok(Some(RouteSolution::new(order, best.score)));
        }
        if all_finished {
            return Err(RouteError::WorkerLost);
        }
        Ok(None)
    }

    fn merge(&mut self, report: WorkerBest) {
        if report.order.is_none() {
            return;
        }
        let better = match &self.best {
            None => true,
            Some(cur) => {
                report.score < cur.score
                    // Exact score tie across workers: lexicographically
                    // smaller ordering wins, keeping the merged result
                    // identical to a single-worker run.
                    || (report.score == cur.score && report.order < cur.order)
            }
        };
        if better {
            self.best = Some(report);
        }
    }
}

/// Enumerate every permutation, score the round-robin share for `me`.
fn search_share(
    cfg: &RouteConfig,
    start: Vector2<f64>,
    heading: f64,
    wps: &[Vector2<f64>],
    me: usize,
    workers: usize,
) -> WorkerBest {
    let mut perm: Vec<usize> = (0..wps.len()).collect();
    let mut idx = 0usize;
    let mut best: Option<Vec<usize>> = None;
    let mut best_score = f64::INFINITY;
    loop {
        if idx % workers == me {
            if let Some(score) = score_under(cfg, start, heading, wps, &perm, best_score) {
                if score < best_score {
                    best_score = score;
                    best = Some(perm.clone());
                }
            }
        }
        if !next_permutation(&mut perm) {
            break;
        }
        idx += 1;
    }
    WorkerBest { order: best, score: best_score }
}

/// Score an ordering, abandoning it as soon as the running total exceeds
/// the cutoff. Leg scores are non-negative, so the abandoned ordering could
/// not have won.
fn score_under(
    cfg: &RouteConfig,
    start: Vector2<f64>,
    heading: f64,
    wps: &[Vector2<f64>],
    order: &[usize],
    cutoff: f64,
) -> Option<f64> {
    let mut pos = start;
    let mut hdg = heading;
    let mut total = 0.0;
    for &i in order {
        let (s, bearing) = leg_score(cfg, pos, hdg, wps[i]);
        total += s;
        if total > cutoff {
            return None;
        }
        pos = wps[i];
        hdg = bearing;
    }
    Some(total)
}

/// Advance to the lexicographic successor in place; false after the last.
fn next_permutation(p: &mut [usize]) -> bool {
    if p.len() < 2 {
        return false;
    }
    let mut i = p.len() - 1;
    while i > 0 && p[i - 1] >= p[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = p.len() - 1;
    while p[j] <= p[i - 1] {
        j -= 1;
    }
    p.swap(i - 1, j);
    p[i..].reverse();
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
