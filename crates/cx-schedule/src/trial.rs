//! Restartable iteration over a trial table.
//!
//! A `TrialIterator` separates *what* a trial is (the id → value table) from
//! *when* it runs (the traversal sequence).  The sequence may repeat ids, so
//! a table of four stimuli can drive a forty-trial session:
//!
//! ```text
//! table    = { a: 1.0, b: 2.0 }
//! sequence = [a, b, a, a, b]
//! next()   → (a,1.0) (b,2.0) (a,1.0) (a,1.0) (b,2.0) None (a,1.0) ...
//! ```
//!
//! After yielding `None` once the cursor resets to the start.

use std::collections::HashMap;
use std::hash::Hash;

use crate::ScheduleResult;
use crate::error::invalid;

#[derive(Debug)]
pub struct TrialIterator<K, V> {
    table:    HashMap<K, V>,
    sequence: Vec<K>,
    cursor:   usize,
}

impl<K, V> TrialIterator<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Build a table from parallel `ids` and `values`.  The initial traversal
    /// visits each id once, in the given order.
    pub fn new(ids: Vec<K>, values: Vec<V>) -> ScheduleResult<Self> {
        if ids.len() != values.len() {
            return invalid(format!(
                "trial table needs one value per id ({} ids, {} values)",
                ids.len(),
                values.len()
            ));
        }

        let mut table = HashMap::with_capacity(ids.len());
        for (id, value) in ids.iter().cloned().zip(values) {
            if table.insert(id, value).is_some() {
                return invalid("trial ids must be unique");
            }
        }
        Ok(Self { table, sequence: ids, cursor: 0 })
    }

    /// Length of the traversal sequence (not the table).
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Number of distinct trials in the table.
    pub fn trial_count(&self) -> usize {
        self.table.len()
    }

    pub fn sequence(&self) -> &[K] {
        &self.sequence
    }

    /// Index of the next trial to be yielded.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn get(&self, id: &K) -> Option<&V> {
        self.table.get(id)
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Replace the traversal sequence.  Every element must be a table key.
    /// Resets the cursor.
    pub fn set_sequence(&mut self, sequence: Vec<K>) -> ScheduleResult<&mut Self> {
        if !sequence.iter().all(|id| self.table.contains_key(id)) {
            return invalid("trial sequence contains an id that is not in the table");
        }
        self.sequence = sequence;
        self.cursor = 0;
        Ok(self)
    }

    /// Replace the traversal with `method(current traversal)`.
    ///
    /// Any shuffler fits: `|s| Ok(elementwise_shuffle(s, &mut rng))`,
    /// `|s| blockwise_shuffle(s, 4, &mut rng)`, ...
    pub fn shuffle<F>(&mut self, method: F) -> ScheduleResult<&mut Self>
    where
        F: FnOnce(&[K]) -> ScheduleResult<Vec<K>>,
    {
        let next = method(&self.sequence)?;
        self.set_sequence(next)
    }
}

impl<K, V> Iterator for TrialIterator<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let Some(id) = self.sequence.get(self.cursor) else {
            self.cursor = 0;
            return None;
        };
        self.cursor += 1;
        // Membership is checked on every sequence change.
        let value = self.table.get(id)?.clone();
        Some((id.clone(), value))
    }
}

/// Zip two equal-length value columns into tuples for a multi-valued table.
pub fn zip_values<A, B>(a: Vec<A>, b: Vec<B>) -> ScheduleResult<Vec<(A, B)>> {
    if a.len() != b.len() {
        return invalid(format!("value columns differ in length ({} vs {})", a.len(), b.len()));
    }
    Ok(a.into_iter().zip(b).collect())
}
