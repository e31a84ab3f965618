use std::fmt::Display;

use rand::{Rng, seq::SliceRandom};
use serde::Serialize;

use crate::domain::track::Track;

/// `"correct"` or `"wrong-N"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OptionId(String);

impl OptionId {
    pub fn correct() -> Self {
        Self("correct".to_string())
    }

    pub fn wrong(index: usize) -> Self {
        Self(format!("wrong-{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One graded choice of a question. Lives only as long as its question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOption {
    pub id: OptionId,
    /// the track title; the artist stays hidden
    pub text: String,
    pub is_correct: bool,
}

/// Shuffled choices of a question, exactly one of them correct
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OptionSet(Vec<AnswerOption>);

impl OptionSet {
    pub fn iter(&self) -> impl Iterator<Item = &AnswerOption> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: &OptionId) -> Option<&AnswerOption> {
        self.0.iter().find(|o| &o.id == id)
    }

    /// option at a 0-based display position
    pub fn at(&self, position: usize) -> Option<&AnswerOption> {
        self.0.get(position)
    }

    pub fn correct(&self) -> Option<&AnswerOption> {
        self.0.iter().find(|o| o.is_correct)
    }
}

/// Builds the choices of a question and shuffles them.
///
/// Wrong options are numbered in distractor order before the shuffle.
pub fn build_options<R: Rng + ?Sized>(
    correct: &Track,
    distractors: &[&Track],
    rng: &mut R,
) -> OptionSet {
    let mut options = Vec::with_capacity(distractors.len() + 1);
    options.push(AnswerOption {
        id: OptionId::correct(),
        text: correct.title.clone(),
        is_correct: true,
    });
    options.extend(
        distractors
            .iter()
            .enumerate()
            .map(|(index, track)| AnswerOption {
                id: OptionId::wrong(index),
                text: track.title.clone(),
                is_correct: false,
            }),
    );

    options.shuffle(rng);
    OptionSet(options)
}
