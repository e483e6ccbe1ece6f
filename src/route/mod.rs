use nalgebra::{Vector2, Vector3};

use crate::config::RouteConfig;
use crate::gnc::angle::{bearing_deg, heading_error};

pub mod search;

pub use search::{RouteError, RouteSearch};

// ---------------------------------------------------------------------------
// Route scoring and ordering
// ---------------------------------------------------------------------------
//
// A route's cost folds each leg's turn and length into one number: sharp
// turns cost rotor time, long legs cost fuel, and very short hops are nearly
// free. The weights were tuned against the same vehicle model as the
// controllers.

/// Index of the waypoint nearest to `from` in the ground plane.
pub fn nearest_neighbor(from: Vector2<f64>, wps: &[Vector3<f64>]) -> Option<usize> {
    wps.iter()
        .enumerate()
        .map(|(i, wp)| (i, (Vector2::new(wp.x, wp.y) - from).norm()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Cost of one leg plus the bearing the vehicle leaves it on.
pub(crate) fn leg_score(
    cfg: &RouteConfig,
    from: Vector2<f64>,
    heading: f64,
    to: Vector2<f64>,
) -> (f64, f64) {
    let bearing = bearing_deg(from, to);
    let turn = heading_error(bearing, heading).abs().to_radians();
    let dist = (to - from).norm();
    let mut score = turn / cfg.heading_divisor + dist / cfg.distance_divisor;
    if dist > cfg.long_leg {
        score *= cfg.long_leg_penalty;
    } else if dist < cfg.short_leg {
        score *= cfg.short_leg_bonus;
    }
    (score, bearing)
}

/// Total cost of visiting `wps` in `order`, starting at `start` with the
/// given heading.
pub fn route_score(
    cfg: &RouteConfig,
    start: Vector2<f64>,
    heading: f64,
    wps: &[Vector2<f64>],
    order: &[usize],
) -> f64 {
    let mut pos = start;
    let mut hdg = heading;
    let mut total = 0.0;
    for &i in order {
        let (s, bearing) = leg_score(cfg, pos, hdg, wps[i]);
        total += s;
        pos = wps[i];
        hdg = bearing;
    }
    total
}

/// A completed ordering over a waypoint snapshot, consumed front to back.
#[derive(Debug, Clone)]
pub struct RouteSolution {
    order: Vec<usize>,
    score: f64,
    cursor: usize,
}

impl RouteSolution {
    pub(crate) fn new(order: Vec<usize>, score: f64) -> Self {
        Self { order, score, cursor: 0 }
    }

    /// Next waypoint index in optimized order, or `None` when exhausted.
    pub fn next_index(&mut self) -> Option<usize> {
        let i = self.order.get(self.cursor).copied();
        if i.is_some() {
            self.cursor += 1;
        }
        i
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v3(x: f64, y: f64) -> Vector3<f64> {
        Vector3::new(x, y, 0.0)
    }

    #[test]
    fn nearest_neighbor_picks_the_closest() {
        let wps = [v3(100.0, 0.0), v3(10.0, 10.0), v3(-500.0, 2.0)];
        let i = nearest_neighbor(Vector2::new(0.0, 0.0), &wps);
        assert_eq!(i, Some(1));
        assert_eq!(nearest_neighbor(Vector2::new(0.0, 0.0), &[]), None);
    }

    #[test]
    fn long_legs_cost_extra_and_short_hops_are_cheap() {
        let cfg = RouteConfig::default();
        let o = Vector2::new(0.0, 0.0);
        // Straight ahead, so the whole score is distance-driven.
        let (long, _) = leg_score(&cfg, o, 0.0, Vector2::new(400.0, 0.0));
        let (mid, _) = leg_score(&cfg, o, 0.0, Vector2::new(200.0, 0.0));
        let (short, _) = leg_score(&cfg, o, 0.0, Vector2::new(20.0, 0.0));
        assert!((long - 1.7 * 400.0 / 550.0).abs() < 1e-9, "long leg takes the penalty");
        assert!((mid - 200.0 / 550.0).abs() < 1e-9, "mid-range leg is unscaled");
        assert!((short - 0.7 * 20.0 / 550.0).abs() < 1e-9, "short hop takes the bonus");
    }

    #[test]
    fn turning_back_scores_worse_than_straight_on() {
        let cfg = RouteConfig::default();
        let o = Vector2::new(0.0, 0.0);
        let (ahead, _) = leg_score(&cfg, o, 0.0, Vector2::new(100.0, 0.0));
        let (behind, _) = leg_score(&cfg, o, 0.0, Vector2::new(-100.0, 0.0));
        assert!(behind > ahead, "a 180 degree turn must cost more");
    }

    #[test]
    fn route_score_chains_leg_headings() {
        let cfg = RouteConfig::default();
        let wps = [Vector2::new(100.0, 0.0), Vector2::new(100.0, 100.0)];
        // After the first leg the vehicle faces east, so the second leg's
        // turn is 90 degrees, not the turn from the initial heading.
        let total = route_score(&cfg, Vector2::new(0.0, 0.0), 0.0, &wps, &[0, 1]);
        let expect = 100.0 / 550.0
            + (std::f64::consts::FRAC_PI_2 / 16.2 + 100.0 / 550.0);
        assert!((total - expect).abs() < 1e-9, "got {total}, want {expect}");
    }

    #[test]
    fn solution_is_consumed_front_to_back() {
        let mut sol = RouteSolution::new(vec![2, 0, 1], 1.0);
        assert_eq!(sol.next_index(), Some(2));
        assert_eq!(sol.next_index(), Some(0));
        assert_eq!(sol.next_index(), Some(1));
        assert_eq!(sol.next_index(), None);
    }
}
