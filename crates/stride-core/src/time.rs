//! Horizon time policy shared by every time-indexed query.
//!
//! A query at `t` is valid on `[0, total]`. Overshoot up to
//! [`TIME_TOLERANCE`] past the end is evaluated at `total`, so that samples
//! produced by repeated `dt` steps still land on the last point. Anything
//! further outside fails with [`RangeError::TimeOutOfRange`]; nothing is
//! clamped silently.

use crate::error::RangeError;

/// Slack accepted past the end of a horizon, in seconds.
pub const TIME_TOLERANCE: f64 = 1e-5;

/// Validate `t` against a horizon of length `total`.
///
/// Returns the time to evaluate at (`t` itself, or `total` for tolerated
/// overshoot).
pub fn check_time(t: f64, total: f64) -> Result<f64, RangeError> {
    if !t.is_finite() || t < 0.0 || t > total + TIME_TOLERANCE {
        return Err(RangeError::TimeOutOfRange { t, total });
    }
    Ok(t.min(total))
}

/// Locate `t` within consecutive segments of the given `durations`.
///
/// Returns `(segment index, time since segment start)`. Boundary times belong
/// to the earlier segment, except `0.0` which belongs to the first.
pub fn locate(durations: &[f64], t: f64) -> Result<(usize, f64), RangeError> {
    let total: f64 = durations.iter().sum();
    let t = check_time(t, total)?;

    let last = durations.len().saturating_sub(1);
    let mut t_start = 0.0;
    for (i, &d) in durations.iter().enumerate() {
        if t <= t_start + d || i == last {
            return Ok((i, (t - t_start).clamp(0.0, d)));
        }
        t_start += d;
    }
    Err(RangeError::TimeOutOfRange { t, total })
}

/// Whether two horizon lengths agree within [`TIME_TOLERANCE`].
pub fn durations_agree(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_TOLERANCE
}
