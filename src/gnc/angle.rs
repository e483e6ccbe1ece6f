use nalgebra::Vector2;

// ---------------------------------------------------------------------------
// Wraparound heading arithmetic
// ---------------------------------------------------------------------------
//
// Everything that touches a heading goes through here so the 0/360 seam is
// handled exactly once. Degrees throughout; the vehicle convention is
// compass-style values in [0, 360).

/// Map an angle into [0, 360).
pub fn normalize_360(deg: f64) -> f64 {
    let a = deg % 360.0;
    if a < 0.0 {
        a + 360.0
    } else {
        a
    }
}

/// Map an angle into (-180, 180].
pub fn wrap_180(deg: f64) -> f64 {
    let a = normalize_360(deg);
    if a > 180.0 {
        a - 360.0
    } else {
        a
    }
}

/// Signed shortest-way error from `actual` to `target`, in (-180, 180].
///
/// Both operands are wrapped before subtracting and the difference is
/// re-wrapped, so the result always commands the short turn.
pub fn heading_error(target: f64, actual: f64) -> f64 {
    wrap_180(wrap_180(target) - wrap_180(actual))
}

/// Compass bearing of the 2D vector from `from` to `to`, in [0, 360).
pub fn bearing_deg(from: Vector2<f64>, to: Vector2<f64>) -> f64 {
    let d = to - from;
    normalize_360(d.y.atan2(d.x).to_degrees())
}

/// Cosine of the separation between two headings: 1 aligned, -1 opposed.
pub fn heading_dot(a_deg: f64, b_deg: f64) -> f64 {
    heading_error(a_deg, b_deg).to_radians().cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_always_in_half_open_range() {
        let mut t = 0.0;
        while t < 360.0 {
            let mut a = 0.0;
            while a < 360.0 {
                let e = heading_error(t, a);
                assert!(e > -180.0 && e <= 180.0, "error {e} out of range for {t}/{a}");
                a += 7.3;
            }
            t += 11.7;
        }
    }

    #[test]
    fn short_way_across_the_seam() {
        // 359 -> 1 is a 2 degree turn, not 358.
        assert!((heading_error(1.0, 359.0) - 2.0).abs() < 1e-12);
        assert!((heading_error(359.0, 1.0) + 2.0).abs() < 1e-12);
        assert!((heading_error(270.0, 90.0)).abs() - 180.0 < 1e-12);
    }

    #[test]
    fn normalize_handles_negatives() {
        assert!((normalize_360(-90.0) - 270.0).abs() < 1e-12);
        assert!((normalize_360(725.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn bearing_matches_compass_quadrants() {
        let o = Vector2::new(0.0, 0.0);
        assert!((bearing_deg(o, Vector2::new(1.0, 0.0)) - 0.0).abs() < 1e-12);
        assert!((bearing_deg(o, Vector2::new(0.0, 1.0)) - 90.0).abs() < 1e-12);
        assert!((bearing_deg(o, Vector2::new(-1.0, 0.0)) - 180.0).abs() < 1e-12);
        assert!((bearing_deg(o, Vector2::new(0.0, -1.0)) - 270.0).abs() < 1e-12);
    }

    #[test]
    fn dot_detects_opposed_motion() {
        assert!(heading_dot(0.0, 180.0) < -0.99);
        assert!(heading_dot(45.0, 45.0) > 0.99);
        assert!(heading_dot(0.0, 90.0).abs() < 1e-9);
    }
}
