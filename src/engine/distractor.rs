use rand::{Rng, seq::SliceRandom};

use crate::domain::track::{Track, TrackId};

/// Upper bound of wrong answers offered per question
pub const MAX_DISTRACTORS: usize = 3;

/// Picks `min(3, tracks.len() - 1)` wrong answers uniformly at random,
/// without replacement, from every track except `correct`.
///
/// The input list is left untouched; sampling happens on a copy of references.
pub fn select_distractors<'a, R: Rng + ?Sized>(
    tracks: &'a [Track],
    correct: &TrackId,
    rng: &mut R,
) -> Vec<&'a Track> {
    let mut pool: Vec<&Track> = tracks.iter().filter(|t| &t.id != correct).collect();
    let amount = pool.len().min(MAX_DISTRACTORS);

    let (picked, _) = pool.partial_shuffle(rng, amount);
    picked.to_vec()
}
