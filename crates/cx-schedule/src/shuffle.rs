//! Sequence shufflers.
//!
//! Each function returns a new `Vec` and leaves its input untouched, so they
//! compose directly with [`TrialIterator::shuffle`](crate::TrialIterator::shuffle):
//!
//! ```ignore
//! trials.shuffle(|seq| blockwise_shuffle(seq, 4, &mut rng))?;
//! ```

use rand::Rng;
use rand::seq::SliceRandom;

use crate::ScheduleResult;
use crate::error::invalid;

/// A uniformly random permutation of `x`.
pub fn elementwise_shuffle<T: Clone, R: Rng + ?Sized>(x: &[T], rng: &mut R) -> Vec<T> {
    let mut out = x.to_vec();
    out.shuffle(rng);
    out
}

/// Permute each contiguous block of `blocksize` elements independently.
///
/// Elements never leave their block.  Fails if `blocksize` is zero or does
/// not divide `x.len()`.
pub fn blockwise_shuffle<T: Clone, R: Rng + ?Sized>(
    x: &[T],
    blocksize: usize,
    rng: &mut R,
) -> ScheduleResult<Vec<T>> {
    if blocksize == 0 {
        return invalid("blocksize must be positive");
    }
    if x.len() % blocksize != 0 {
        return invalid(format!(
            "sequence length {} is not a multiple of blocksize {blocksize}",
            x.len()
        ));
    }

    let mut out = Vec::with_capacity(x.len());
    for block in x.chunks(blocksize) {
        let start = out.len();
        out.extend_from_slice(block);
        out[start..].shuffle(rng);
    }
    Ok(out)
}

/// Repeat `values[i]` `repeats[i]` times, consecutively and in input order.
pub fn repeat<T: Clone>(values: &[T], repeats: &[usize]) -> ScheduleResult<Vec<T>> {
    if values.len() != repeats.len() {
        return invalid(format!(
            "repeat needs one count per value ({} values, {} counts)",
            values.len(),
            repeats.len()
        ));
    }

    let total = repeats.iter().sum();
    let mut out = Vec::with_capacity(total);
    for (v, &k) in values.iter().zip(repeats) {
        out.extend(std::iter::repeat_n(v.clone(), k));
    }
    Ok(out)
}
