//! CSV trial-table loader.
//!
//! # CSV format
//!
//! One row per distinct trial.  `repeats` is optional and defaults to 1; the
//! traversal visits each trial `repeats` times, consecutively, in file order.
//!
//! ```csv
//! trial,value,repeats
//! tone_low,440,10
//! tone_high,880,10
//! probe,0,2
//! ```
//!
//! `value` is deserialized as the caller's `V`, so the same loader serves
//! numeric parameters and text labels.  Shuffle the result afterwards with
//! [`TrialIterator::shuffle`].

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::shuffle::repeat;
use crate::{ScheduleResult, TrialIterator};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TrialRecord<V> {
    trial:   String,
    value:   V,
    repeats: Option<usize>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a trial table from a CSV file.
pub fn load_trials_csv<V>(path: &Path) -> ScheduleResult<TrialIterator<String, V>>
where
    V: DeserializeOwned + Clone,
{
    let file = std::fs::File::open(path)?;
    load_trials_reader(file)
}

/// Like [`load_trials_csv`] but accepts any `Read` source.
pub fn load_trials_reader<V, R>(reader: R) -> ScheduleResult<TrialIterator<String, V>>
where
    V: DeserializeOwned + Clone,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut ids = Vec::new();
    let mut values = Vec::new();
    let mut counts = Vec::new();
    for result in csv_reader.deserialize::<TrialRecord<V>>() {
        let row = result?;
        ids.push(row.trial);
        values.push(row.value);
        counts.push(row.repeats.unwrap_or(1));
    }

    let traversal = repeat(&ids, &counts)?;
    let mut trials = TrialIterator::new(ids, values)?;
    trials.set_sequence(traversal)?;
    Ok(trials)
}
