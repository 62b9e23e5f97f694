//! Pixel <-> meter conversion.
//!
//! Everything public in this crate is expressed in pixels. rapier works in
//! meters; every value that crosses into or out of the physics world goes
//! through these two functions.

/// Pixels per physics meter.
pub const PIXELS_PER_METER: f64 = 8.0;

/// Degrees to radians factor.
pub const DEG: f64 = std::f64::consts::PI / 180.0;

pub fn pixels_to_meters(pixels: f64) -> f64 {
    pixels / PIXELS_PER_METER
}

pub fn meters_to_pixels(meters: f64) -> f64 {
    meters * PIXELS_PER_METER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_round_trips() {
        for p in [0.0, 1.0, -3.5, 25.0, 1080.0, 2050.25, 1e-6, -1e7] {
            let back = meters_to_pixels(pixels_to_meters(p));
            assert!((back - p).abs() <= 1e-9 * p.abs().max(1.0), "{p} -> {back}");
        }
    }

    #[test]
    fn ratio_is_eight_pixels_per_meter() {
        assert_eq!(pixels_to_meters(80.0), 10.0);
        assert_eq!(meters_to_pixels(2.0), 16.0);
    }
}
