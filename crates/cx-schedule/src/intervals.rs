//! Trial-interval generators.
//!
//! # Quantile construction
//!
//! Each generator evaluates a distribution's inverse CDF at `n` fixed
//! probabilities instead of sampling it, so a batch always has the intended
//! shape and (up to rounding) the intended mean:
//!
//! | Model         | Probability points       | Value at point                                  |
//! |---------------|--------------------------|-------------------------------------------------|
//! | uniform       | `(i + ½) / n`            | `mean − range + 2·range·q`                      |
//! | exponential   | bin `[(i−1)/n, i/n)`     | mean of the inverse CDF over the bin (Fleshler–Hoffman) |
//! | geometric     | `(i + ½) / n`            | `ceil(ln(1 − q) / ln(1 − p))`, `p = 1/mean`     |
//!
//! The exponential term for bin `i` (1-based) is
//!
//! ```text
//! scale · (1 + ln n + (n−i)·ln(n−i) − (n−i+1)·ln(n−i+1)) + min
//! scale = 1 / −ln(1 − 1/(mean − min))
//! ```
//!
//! with `0·ln 0 = 0`.  The sequence is non-decreasing and its terms sum to
//! exactly `n · (scale + min)`.
//!
//! Values come out in ascending order; pass `shuffle = true` to permute them
//! with the caller's RNG.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::ScheduleResult;
use crate::error::invalid;

/// A generated batch of inter-trial intervals.
pub type Intervals = Vec<f64>;

// ── Generators ────────────────────────────────────────────────────────────────

/// `n` evenly spaced intervals over `[mean − range, mean + range]`.
///
/// Requires `0 ≤ range < mean` and `n > 0`.
pub fn uniform_intervals<R: Rng + ?Sized>(
    mean: f64,
    range: f64,
    n: usize,
    shuffle: bool,
    rng: &mut R,
) -> ScheduleResult<Intervals> {
    check_count(n)?;
    if !mean.is_finite() || !(range >= 0.0 && range < mean) {
        return invalid(format!("uniform intervals need 0 <= range < mean (mean {mean}, range {range})"));
    }

    let low = mean - range;
    let width = 2.0 * range;
    let values = midpoints(n).map(|q| low + width * q).collect();
    Ok(finish(values, shuffle, rng))
}

/// `n` Fleshler–Hoffman intervals with floor `min` and mean `scale + min`.
///
/// Requires `n > 0`, `min ≥ 0` and `mean − min > 1`.
pub fn exponential_intervals<R: Rng + ?Sized>(
    mean: f64,
    n: usize,
    min: f64,
    shuffle: bool,
    rng: &mut R,
) -> ScheduleResult<Intervals> {
    check_count(n)?;
    if !(min >= 0.0) {
        return invalid(format!("exponential intervals need min >= 0 (min {min})"));
    }
    let span = mean - min;
    if !span.is_finite() || !(span > 1.0) {
        return invalid(format!("exponential intervals need mean - min > 1 (mean {mean}, min {min})"));
    }

    let scale = fleshler_hoffman_scale(span);
    let nf = n as f64;
    let values = (1..=n)
        .map(|i| {
            let rest = (n - i) as f64;
            scale * (1.0 + nf.ln() + xlnx(rest) - xlnx(rest + 1.0)) + min
        })
        .collect();
    Ok(finish(values, shuffle, rng))
}

/// `n` geometric (trial-count) intervals with mean `mean`.
///
/// Values are integers stored as `f64`, never below 1.  Requires `mean ≥ 1`
/// and `n > 0`.
pub fn geometric_intervals<R: Rng + ?Sized>(
    mean: f64,
    n: usize,
    shuffle: bool,
    rng: &mut R,
) -> ScheduleResult<Intervals> {
    check_count(n)?;
    if !mean.is_finite() || !(mean >= 1.0) {
        return invalid(format!("geometric intervals need mean >= 1 (mean {mean})"));
    }

    // p = 1 puts all mass on a single trial.
    if mean == 1.0 {
        return Ok(vec![1.0; n]);
    }

    let log_fail = (1.0 - 1.0 / mean).ln();
    let values = midpoints(n)
        .map(|q| ((1.0 - q).ln() / log_fail).ceil().max(1.0))
        .collect();
    Ok(finish(values, shuffle, rng))
}

/// Scale of the exponential whose discrete analogue has `p = 1/span`.
pub fn fleshler_hoffman_scale(span: f64) -> f64 {
    1.0 / -(1.0 - 1.0 / span).ln()
}

// ── IntervalModel ─────────────────────────────────────────────────────────────

/// A configured interval distribution.
///
/// Deserializes from the `Experimental` config section:
///
/// ```yaml
/// intervals: { model: exponential, mean: 30.0, min: 5.0 }
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum IntervalModel {
    Uniform { mean: f64, range: f64 },
    Exponential {
        mean: f64,
        #[serde(default)]
        min:  f64,
    },
    Geometric { mean: f64 },
}

impl IntervalModel {
    /// Generate `n` intervals from this model.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        n: usize,
        shuffle: bool,
        rng: &mut R,
    ) -> ScheduleResult<Intervals> {
        match *self {
            IntervalModel::Uniform { mean, range } => uniform_intervals(mean, range, n, shuffle, rng),
            IntervalModel::Exponential { mean, min } => exponential_intervals(mean, n, min, shuffle, rng),
            IntervalModel::Geometric { mean } => geometric_intervals(mean, n, shuffle, rng),
        }
    }

    /// The configured mean.
    pub fn mean(&self) -> f64 {
        match *self {
            IntervalModel::Uniform { mean, .. }
            | IntervalModel::Exponential { mean, .. }
            | IntervalModel::Geometric { mean } => mean,
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn check_count(n: usize) -> ScheduleResult<()> {
    if n == 0 {
        return invalid("interval count must be positive");
    }
    Ok(())
}

/// Midpoint probabilities `(i + ½) / n` for `i in 0..n`.
fn midpoints(n: usize) -> impl Iterator<Item = f64> {
    let nf = n as f64;
    (0..n).map(move |i| (i as f64 + 0.5) / nf)
}

#[inline]
fn xlnx(x: f64) -> f64 {
    if x == 0.0 { 0.0 } else { x * x.ln() }
}

fn finish<R: Rng + ?Sized>(mut values: Intervals, shuffle: bool, rng: &mut R) -> Intervals {
    if shuffle {
        values.shuffle(rng);
    }
    values
}
