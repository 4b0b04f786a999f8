//! Mapping functions used to turn calibrated raw axis positions into output values.
//!
//! "Low" and "high" below describe signal strength rather than numeric order: a
//! low of 0.0 and a high of -1.0 describes the negative half of a stick.

/// Minimum width of a range before it's treated as degenerate.
const RANGE_EPSILON: f64 = 1e-9;

/// Map `value` so that `low` gives 0.0 and `high` gives 1.0 (or -1.0 when `high` is
/// numerically below `low`), clamping anything outside the range.
pub fn map_into_range(low: f64, high: f64, value: f64) -> f64 {
    let range = high - low;
    if range.abs() < RANGE_EPSILON {
        return 0.0;
    }
    if low < high {
        if value < low {
            return 0.0;
        } else if value > high {
            return 1.0;
        }
    } else if value > low {
        return 0.0;
    } else if value < high {
        return -1.0;
    }
    (value - low) / range.abs()
}

/// Apply dead and hot zones, each a proportion of the distance from `low` to `high`,
/// then map into range. A dead zone and hot zone summing to 1.0 or more leaves
/// nothing to interpolate over.
pub fn map_single_axis(low: f64, high: f64, dead_zone: f64, hot_zone: f64, value: f64) -> f64 {
    let input_range = high - low;
    let corrected_low = low + input_range * dead_zone;
    let corrected_high = high - input_range * hot_zone;
    map_into_range(corrected_low, corrected_high, value)
}

/// Two-sided mapping for an axis which rests at `centre`. Values on either side are
/// mapped against that side's half-range so the output runs from -1.0 at `low`,
/// through 0.0 at `centre`, to 1.0 at `high`.
pub fn map_dual_axis(
    low: f64,
    high: f64,
    centre: f64,
    dead_zone: f64,
    hot_zone: f64,
    value: f64,
) -> f64 {
    if value <= centre {
        map_single_axis(centre, low, dead_zone, hot_zone, value)
    } else {
        map_single_axis(centre, high, dead_zone, hot_zone, value)
    }
}

/// Radial dead and hot zones for a pair of axes.
///
/// The angle of `(x, y)` is preserved. Magnitudes inside `dead_zone` collapse to the
/// origin, magnitudes at or beyond `1 - hot_zone` are pushed onto the unit circle and
/// anything between is interpolated linearly.
pub fn map_circular(x: f64, y: f64, dead_zone: f64, hot_zone: f64) -> (f64, f64) {
    let magnitude = x.hypot(y);
    if magnitude < RANGE_EPSILON {
        return (0.0, 0.0);
    }
    let outer = 1.0 - hot_zone;
    if magnitude >= outer {
        return (x / magnitude, y / magnitude);
    }
    if magnitude <= dead_zone {
        return (0.0, 0.0);
    }
    let scaled = ((magnitude - dead_zone) / (outer - dead_zone)).clamp(0.0, 1.0);
    (x / magnitude * scaled, y / magnitude * scaled)
}
