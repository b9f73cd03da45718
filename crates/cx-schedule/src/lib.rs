//! `cx-schedule` — trial intervals, sequence shuffling, and trial iteration.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`intervals`] | `uniform_intervals`, `exponential_intervals`, `geometric_intervals`, `IntervalModel` |
//! | [`shuffle`]   | `elementwise_shuffle`, `blockwise_shuffle`, `repeat`        |
//! | [`trial`]     | `TrialIterator<K, V>`, `zip_values`                         |
//! | [`loader`]    | `load_trials_csv`, `load_trials_reader`                     |
//! | [`error`]     | `ScheduleError`, `ScheduleResult<T>`                        |
//!
//! # Determinism
//!
//! Interval *values* are closed-form quantile constructions and never depend
//! on the RNG.  Only their *order* is random, and every shuffle takes the RNG
//! explicitly, so a session replays exactly from its seed:
//!
//! ```text
//! values = model.quantiles(n)          // deterministic
//! order  = shuffle(values, &mut rng)   // seeded
//! ```

pub mod error;
pub mod intervals;
pub mod loader;
pub mod shuffle;
pub mod trial;


pub use error::{ScheduleError, ScheduleResult};
pub use intervals::{
    IntervalModel, Intervals, exponential_intervals, geometric_intervals, uniform_intervals,
};
pub use loader::{load_trials_csv, load_trials_reader};
pub use shuffle::{blockwise_shuffle, elementwise_shuffle, repeat};
pub use trial::{TrialIterator, zip_values};
