//! Play session of one quiz.
//!
//! The session walks the quiz's tracks in order. For every question it
//! issues a [`ResolveRequest`] tagged with a [`Ticket`]; the caller runs the
//! resolver (possibly elsewhere, possibly late) and hands the result back
//! through [`Session::complete_resolve`]. Results whose ticket no longer
//! matches the current question are dropped.

use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::{
    domain::{
        quiz::{Quiz, QuizId},
        track::Track,
    },
    engine::{
        distractor::select_distractors,
        options::{AnswerOption, OptionId, OptionSet, build_options},
        playback::{LoadPolicy, PlaybackController},
        resolver::{Resolution, ResolveStatus, TrackResolver},
    },
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("quiz {0} has no tracks and cannot be played")]
    NotPlayable(QuizId),

    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },

    #[error("no answer selected")]
    NoSelection,

    #[error("unknown option {0}")]
    UnknownOption(String),
}

/// What the player picked for the current question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Selection {
    Option(OptionId),
    Skip,
}

/// Per-question state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// waiting for the resolver of the current question
    Loading,
    Ready { selection: Option<Selection> },
    Answered { selection: Selection, correct: bool },
    GameOver,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Loading => "loading",
            Phase::Ready { .. } => "ready",
            Phase::Answered { .. } => "answered",
            Phase::GameOver => "game over",
        }
    }
}

/// Audio availability of the current question, orthogonal to [`Phase`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Media {
    Pending,
    Available { url: String },
    Unavailable,
}

/// Tags a resolver call with the question it was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    round: u64,
    index: usize,
}

impl Ticket {
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub ticket: Ticket,
    pub track: Track,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub index: usize,
    /// resolved track when the resolver succeeded, else the stored one
    pub track: Track,
    pub options: OptionSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub answer: AnswerOption,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Perfect,
    WellPlayed,
    KeepPracticing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub score: usize,
    pub total: usize,
    pub verdict: Verdict,
}

impl SessionSummary {
    fn new(score: usize, total: usize) -> Self {
        let verdict = if score == total {
            Verdict::Perfect
        } else if score * 2 > total {
            Verdict::WellPlayed
        } else {
            Verdict::KeepPracticing
        };
        Self {
            score,
            total,
            verdict,
        }
    }

    pub fn percent(&self) -> u32 {
        (self.score * 100 / self.total.max(1)) as u32
    }
}

pub struct SessionSettings {
    pub auto_play: bool,
    /// failed retries after which skipping is offered
    pub skip_after_failures: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            auto_play: true,
            skip_after_failures: 2,
        }
    }
}

pub struct Session<R> {
    quiz: Quiz,
    rng: R,
    playback: PlaybackController,
    settings: SessionSettings,
    index: usize,
    score: usize,
    /// bumped whenever a question is (re)initialized
    round: u64,
    phase: Phase,
    media: Media,
    media_retries: u32,
    question: Option<Question>,
}

impl<R: Rng> Session<R> {
    /// Starts at question 0 and returns the resolver request for it.
    pub fn start(
        quiz: Quiz,
        rng: R,
        playback: PlaybackController,
        settings: SessionSettings,
    ) -> Result<(Self, ResolveRequest), SessionError> {
        if !quiz.is_playable() {
            return Err(SessionError::NotPlayable(quiz.id));
        }
        info!("starting quiz {} ({} questions)", quiz.id, quiz.tracks.len());

        let mut session = Self {
            quiz,
            rng,
            playback,
            settings,
            index: 0,
            score: 0,
            round: 0,
            phase: Phase::Loading,
            media: Media::Pending,
            media_retries: 0,
            question: None,
        };
        let request = session.initialize_question(0);
        Ok((session, request))
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn track_count(&self) -> usize {
        self.quiz.tracks.len()
    }

    /// questions graded so far
    pub fn answered_count(&self) -> usize {
        match self.phase {
            Phase::Answered { .. } => self.index + 1,
            Phase::GameOver => self.track_count(),
            _ => self.index,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn media(&self) -> &Media {
        &self.media
    }

    pub fn media_retries(&self) -> u32 {
        self.media_retries
    }

    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut PlaybackController {
        &mut self.playback
    }

    pub fn can_select(&self) -> bool {
        matches!(self.phase, Phase::Ready { .. })
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.phase, Phase::Ready { selection: Some(_) })
    }

    pub fn can_advance(&self) -> bool {
        matches!(self.phase, Phase::Answered { .. })
    }

    pub fn can_retry_media(&self) -> bool {
        self.media == Media::Unavailable
            && matches!(self.phase, Phase::Ready { .. } | Phase::Answered { .. })
    }

    /// whether the UI should offer skipping the question
    pub fn should_offer_skip(&self) -> bool {
        self.media == Media::Unavailable
            && self.can_select()
            && self.media_retries >= self.settings.skip_after_failures
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        match self.phase {
            Phase::GameOver => Some(SessionSummary::new(self.score, self.track_count())),
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }

    fn initialize_question(&mut self, index: usize) -> ResolveRequest {
        self.playback.teardown();
        self.round += 1;
        self.index = index;
        self.phase = Phase::Loading;
        self.media = Media::Pending;
        self.media_retries = 0;
        self.question = None;

        debug!("initializing question {index}");
        self.current_request()
    }

    fn current_request(&self) -> ResolveRequest {
        ResolveRequest {
            ticket: Ticket {
                round: self.round,
                index: self.index,
            },
            track: self.quiz.tracks[self.index].clone(),
        }
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.round == self.round && ticket.index == self.index
    }

    /// Applies a resolver result. Returns false when the result was stale
    /// and has been discarded.
    pub fn complete_resolve(&mut self, ticket: Ticket, resolution: Resolution) -> bool {
        if !self.is_current(&ticket) || self.media != Media::Pending {
            debug!(
                "discarding stale resolution for question {} (current {})",
                ticket.index, self.index
            );
            return false;
        }

        let url = resolution.preview_url().map(str::to_string);

        if self.phase == Phase::Loading {
            let track = match resolution.status {
                ResolveStatus::Resolved => resolution.track,
                ResolveStatus::NoPreview => self.quiz.tracks[self.index].clone(),
            };
            let distractors = select_distractors(&self.quiz.tracks, &track.id, &mut self.rng);
            let options = build_options(&track, &distractors, &mut self.rng);

            self.question = Some(Question {
                index: self.index,
                track,
                options,
            });
            self.phase = Phase::Ready { selection: None };
        } else if let (Some(question), ResolveStatus::Resolved) =
            (self.question.as_mut(), resolution.status)
        {
            // a retry refreshes the media only, options and selection stay
            question.track.preview = resolution.track.preview;
            question.track.artwork = resolution.track.artwork;
            question.track.catalog_id = resolution.track.catalog_id;
        }

        match url {
            Some(url) => {
                let policy = if self.settings.auto_play && self.can_select() {
                    LoadPolicy::AutoPlay
                } else {
                    LoadPolicy::Manual
                };
                match self.playback.load(&url, policy) {
                    Ok(()) => self.media = Media::Available { url },
                    Err(e) => {
                        warn!("question {} plays without audio: {e}", self.index);
                        self.media = Media::Unavailable;
                    }
                }
            }
            None => {
                info!("question {} has no audio preview", self.index);
                self.media = Media::Unavailable;
            }
        }
        true
    }

    /// Runs `resolver` inline for `request` and applies its result.
    pub fn resolve_with(&mut self, resolver: &dyn TrackResolver, request: ResolveRequest) -> bool {
        let resolution = resolver.resolve(&request.track);
        self.complete_resolve(request.ticket, resolution)
    }

    pub fn select_option(&mut self, id: &OptionId) -> Result<(), SessionError> {
        if !self.can_select() {
            return Err(self.invalid("select an option"));
        }
        let known = self
            .question
            .as_ref()
            .is_some_and(|q| q.options.get(id).is_some());
        if !known {
            return Err(SessionError::UnknownOption(id.to_string()));
        }

        self.phase = Phase::Ready {
            selection: Some(Selection::Option(id.clone())),
        };
        Ok(())
    }

    /// marks the question as skipped; it still needs to be submitted
    pub fn skip(&mut self) -> Result<(), SessionError> {
        if !self.can_select() {
            return Err(self.invalid("skip"));
        }
        self.phase = Phase::Ready {
            selection: Some(Selection::Skip),
        };
        Ok(())
    }

    /// Grades the selection. A skip is always wrong.
    pub fn submit_answer(&mut self) -> Result<AnswerOutcome, SessionError> {
        let selection = match &self.phase {
            Phase::Ready {
                selection: Some(selection),
            } => selection.clone(),
            Phase::Ready { selection: None } => return Err(SessionError::NoSelection),
            _ => return Err(self.invalid("submit an answer")),
        };
        let answer = self
            .question
            .as_ref()
            .and_then(|q| q.options.correct())
            .cloned()
            .ok_or_else(|| self.invalid("submit an answer"))?;

        let correct = match &selection {
            Selection::Option(id) => *id == answer.id,
            Selection::Skip => false,
        };
        if correct {
            self.score += 1;
        }
        self.playback.pause();

        debug!(
            "question {} answered ({}), score {}",
            self.index,
            if correct { "correct" } else { "wrong" },
            self.score
        );
        self.phase = Phase::Answered { selection, correct };
        Ok(AnswerOutcome { correct, answer })
    }

    /// Moves to the next question, or ends the game after the last one.
    pub fn advance(&mut self) -> Result<Option<ResolveRequest>, SessionError> {
        if !self.can_advance() {
            return Err(self.invalid("advance"));
        }

        if self.index + 1 < self.track_count() {
            let next = self.index + 1;
            Ok(Some(self.initialize_question(next)))
        } else {
            self.playback.teardown();
            self.round += 1;
            self.question = None;
            self.media = Media::Pending;
            self.phase = Phase::GameOver;
            info!(
                "quiz {} finished with {}/{}",
                self.quiz.id,
                self.score,
                self.track_count()
            );
            Ok(None)
        }
    }

    pub fn restart(&mut self) -> Result<ResolveRequest, SessionError> {
        if !self.is_game_over() {
            return Err(self.invalid("restart"));
        }
        self.score = 0;
        Ok(self.initialize_question(0))
    }

    /// Asks the resolver again for the current track.
    pub fn retry_media(&mut self) -> Result<ResolveRequest, SessionError> {
        if !self.can_retry_media() {
            return Err(self.invalid("retry media"));
        }
        if self.question.is_none() {
            return Err(self.invalid("retry media"));
        }
        self.media_retries += 1;
        self.media = Media::Pending;

        debug!(
            "retrying media for question {} (attempt {})",
            self.index, self.media_retries
        );
        Ok(self.current_request())
    }

    /// Stops playback and releases the audio resource.
    pub fn close(&mut self) {
        self.playback.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashSet, rc::Rc};

    use chrono::Utc;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        catalog::fake::{FakeCatalog, Reply, catalog_track},
        domain::track::{CatalogId, TrackId},
        engine::{
            playback::{
                PlaybackState,
                recording::{Journal, RecordingBackend},
            },
            resolver::CatalogResolver,
        },
    };

    fn quiz(titles: &[(&str, &str)]) -> Quiz {
        Quiz {
            id: QuizId("q1".into()),
            title: "Test quiz".into(),
            description: None,
            tracks: titles
                .iter()
                .enumerate()
                .map(|(i, (title, artist))| {
                    let id = ["A", "B", "C", "D", "E", "F"][i];
                    Track::new(id, title, artist)
                })
                .collect(),
            created_at: Utc::now(),
            owner: "u1".into(),
        }
    }

    fn four_songs() -> Quiz {
        quiz(&[
            ("Song1", "Artist1"),
            ("Song2", "Artist2"),
            ("Song3", "Artist3"),
            ("Song4", "Artist4"),
        ])
    }

    fn start(quiz: Quiz, seed: u64) -> (Session<StdRng>, ResolveRequest, Rc<RefCell<Journal>>) {
        let (backend, journal) = RecordingBackend::new();
        let playback = PlaybackController::new(Box::new(backend), 0.5);
        let (session, request) = Session::start(
            quiz,
            StdRng::seed_from_u64(seed),
            playback,
            SessionSettings::default(),
        )
        .unwrap();
        (session, request, journal)
    }

    fn with_preview(track: &Track) -> Resolution {
        let mut track = track.clone();
        track.preview = Some(format!("https://cdn/{}.mp3", track.id));
        Resolution::resolved(track)
    }

    fn resolve_ok(session: &mut Session<StdRng>, request: ResolveRequest) {
        let resolution = with_preview(&request.track);
        assert!(session.complete_resolve(request.ticket, resolution));
    }

    fn resolve_missing(session: &mut Session<StdRng>, request: ResolveRequest) {
        let resolution = Resolution::no_preview(request.track.clone());
        assert!(session.complete_resolve(request.ticket, resolution));
    }

    fn option_texts(session: &Session<StdRng>) -> HashSet<String> {
        session
            .question()
            .unwrap()
            .options
            .iter()
            .map(|o| o.text.clone())
            .collect()
    }

    fn wrong_option(session: &Session<StdRng>) -> OptionId {
        session
            .question()
            .unwrap()
            .options
            .iter()
            .find(|o| !o.is_correct)
            .unwrap()
            .id
            .clone()
    }

    #[test]
    fn test_empty_quiz_is_not_playable() {
        let (backend, _) = RecordingBackend::new();
        let playback = PlaybackController::new(Box::new(backend), 0.5);

        let result = Session::start(
            quiz(&[]),
            StdRng::seed_from_u64(0),
            playback,
            SessionSettings::default(),
        );

        assert!(matches!(result, Err(SessionError::NotPlayable(_))));
    }

    #[test]
    fn test_first_question_of_four_song_quiz() {
        let (mut session, request, _) = start(four_songs(), 1);

        assert_eq!(session.phase(), &Phase::Loading);
        assert_eq!(request.ticket.index(), 0);
        assert_eq!(request.track.id, TrackId("A".into()));

        resolve_ok(&mut session, request);

        let question = session.question().unwrap();
        assert_eq!(question.options.len(), 4);
        assert_eq!(question.options.iter().filter(|o| o.is_correct).count(), 1);
        assert_eq!(question.options.correct().unwrap().text, "Song1");
        assert_eq!(
            option_texts(&session),
            HashSet::from(["Song1", "Song2", "Song3", "Song4"].map(String::from))
        );
        assert_eq!(
            session.media(),
            &Media::Available {
                url: "https://cdn/A.mp3".into()
            }
        );
        assert_eq!(session.playback().state(), PlaybackState::Playing);
    }

    #[test]
    fn test_correct_answer_scores_and_stops_playback() -> anyhow::Result<()> {
        let (mut session, request, _) = start(four_songs(), 2);
        resolve_ok(&mut session, request);

        session.select_option(&OptionId::correct())?;
        let outcome = session.submit_answer()?;

        assert!(outcome.correct);
        assert_eq!(outcome.answer.text, "Song1");
        assert_eq!(session.score(), 1);
        assert_eq!(session.answered_count(), 1);
        assert!(!session.playback().is_playing());

        Ok(())
    }

    #[test]
    fn test_wrong_answer_does_not_score() -> anyhow::Result<()> {
        let (mut session, request, _) = start(four_songs(), 3);
        resolve_ok(&mut session, request);

        let wrong = wrong_option(&session);
        session.select_option(&wrong)?;
        let outcome = session.submit_answer()?;

        assert!(!outcome.correct);
        assert_eq!(outcome.answer.id, OptionId::correct());
        assert_eq!(session.score(), 0);
        assert!(matches!(
            session.phase(),
            Phase::Answered { correct: false, .. }
        ));

        Ok(())
    }

    #[test]
    fn test_advance_builds_next_question_from_other_tracks() -> anyhow::Result<()> {
        let (mut session, request, _) = start(four_songs(), 4);
        resolve_ok(&mut session, request);
        session.select_option(&OptionId::correct())?;
        session.submit_answer()?;

        let request = session.advance()?.unwrap();
        assert_eq!(session.index(), 1);
        assert_eq!(request.track.id, TrackId("B".into()));
        resolve_ok(&mut session, request);

        let question = session.question().unwrap();
        assert_eq!(question.options.correct().unwrap().text, "Song2");
        let distractors: HashSet<_> = question
            .options
            .iter()
            .filter(|o| !o.is_correct)
            .map(|o| o.text.as_str())
            .collect();
        assert_eq!(distractors, HashSet::from(["Song1", "Song3", "Song4"]));

        Ok(())
    }

    #[test]
    fn test_full_play_through_visits_every_question_once() -> anyhow::Result<()> {
        let quiz = quiz(&[
            ("S1", "A1"),
            ("S2", "A2"),
            ("S3", "A3"),
            ("S4", "A4"),
            ("S5", "A5"),
        ]);
        let (mut session, mut request, journal) = start(quiz, 5);
        let mut asked = Vec::new();

        loop {
            resolve_ok(&mut session, request);
            asked.push(session.index());
            let question = session.question().unwrap();
            assert_eq!(
                question.options.correct().unwrap().text,
                question.track.title
            );

            // answer every other question correctly
            let choice = if session.index() % 2 == 0 {
                OptionId::correct()
            } else {
                wrong_option(&session)
            };
            session.select_option(&choice)?;
            session.submit_answer()?;

            match session.advance()? {
                Some(next) => {
                    assert_eq!(next.ticket.index(), asked.len());
                    request = next;
                }
                None => break,
            }
        }

        assert_eq!(asked, vec![0, 1, 2, 3, 4]);
        assert!(session.is_game_over());
        assert_eq!(session.score(), 3);
        assert_eq!(journal.borrow().open_resources(), 0);

        let summary = session.summary().unwrap();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.verdict, Verdict::WellPlayed);
        assert_eq!(summary.percent(), 60);

        Ok(())
    }

    #[test]
    fn test_game_over_accepts_only_restart() -> anyhow::Result<()> {
        let (mut session, request, _) = start(quiz(&[("Solo", "Artist")]), 6);
        resolve_ok(&mut session, request);

        assert_eq!(session.question().unwrap().options.len(), 1);
        session.select_option(&OptionId::correct())?;
        session.submit_answer()?;
        assert!(session.advance()?.is_none());

        assert!(matches!(
            session.advance(),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert!(session.select_option(&OptionId::correct()).is_err());
        assert!(session.skip().is_err());
        assert!(session.submit_answer().is_err());
        assert!(session.retry_media().is_err());
        assert_eq!(session.summary().unwrap().verdict, Verdict::Perfect);

        Ok(())
    }

    #[test]
    fn test_restart_resets_score_and_index() -> anyhow::Result<()> {
        let (mut session, request, _) = start(quiz(&[("S1", "A1"), ("S2", "A2")]), 7);
        resolve_ok(&mut session, request);

        assert!(session.restart().is_err());

        session.select_option(&OptionId::correct())?;
        session.submit_answer()?;
        let request = session.advance()?.unwrap();
        resolve_ok(&mut session, request);
        session.select_option(&OptionId::correct())?;
        session.submit_answer()?;
        session.advance()?;
        assert_eq!(session.score(), 2);

        let request = session.restart()?;

        assert_eq!(session.index(), 0);
        assert_eq!(session.score(), 0);
        assert!(!session.is_game_over());
        assert_eq!(request.ticket.index(), 0);

        resolve_ok(&mut session, request);
        let question = session.question().unwrap();
        assert_eq!(question.options.len(), 2);
        assert_eq!(question.options.correct().unwrap().text, "S1");

        Ok(())
    }

    #[test]
    fn test_submit_requires_a_selection() {
        let (mut session, request, _) = start(four_songs(), 8);

        // still loading
        assert!(matches!(
            session.select_option(&OptionId::correct()),
            Err(SessionError::InvalidTransition { .. })
        ));

        resolve_ok(&mut session, request);
        assert!(!session.can_submit());
        assert_eq!(session.submit_answer(), Err(SessionError::NoSelection));
        assert!(matches!(
            session.advance(),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let (mut session, request, _) = start(quiz(&[("S1", "A1"), ("S2", "A2")]), 9);
        resolve_ok(&mut session, request);

        let result = session.select_option(&OptionId::wrong(5));

        assert_eq!(result, Err(SessionError::UnknownOption("wrong-5".into())));
    }

    #[test]
    fn test_skip_always_grades_wrong() -> anyhow::Result<()> {
        let (mut session, request, _) = start(four_songs(), 10);
        resolve_ok(&mut session, request);

        session.select_option(&OptionId::correct())?;
        session.skip()?;
        let outcome = session.submit_answer()?;

        assert!(!outcome.correct);
        assert_eq!(session.score(), 0);
        assert!(matches!(
            session.phase(),
            Phase::Answered {
                selection: Selection::Skip,
                ..
            }
        ));

        Ok(())
    }

    #[test]
    fn test_stale_resolution_is_discarded() -> anyhow::Result<()> {
        let (mut session, first, _) = start(four_songs(), 11);
        let stale_ticket = first.ticket;
        let stale_track = first.track.clone();
        resolve_ok(&mut session, first);
        session.skip()?;
        session.submit_answer()?;

        let second = session.advance()?.unwrap();
        resolve_ok(&mut session, second);
        let before = session.question().unwrap().clone();
        let media_before = session.media().clone();

        // the first question's resolver answers late
        let mut late = stale_track.clone();
        late.title = "Late title".into();
        late.preview = Some("https://cdn/late.mp3".into());
        assert!(!session.complete_resolve(stale_ticket, Resolution::resolved(late)));

        assert_eq!(session.question().unwrap(), &before);
        assert_eq!(session.media(), &media_before);
        assert_ne!(
            session.playback().current_url(),
            Some("https://cdn/late.mp3")
        );

        Ok(())
    }

    #[test]
    fn test_resolution_from_before_restart_is_discarded() -> anyhow::Result<()> {
        let (mut session, first, _) = start(quiz(&[("S1", "A1")]), 12);
        let old_ticket = first.ticket;
        resolve_ok(&mut session, first);
        session.skip()?;
        session.submit_answer()?;
        session.advance()?;

        let _fresh = session.restart()?;

        // same index, previous round
        assert!(!session.complete_resolve(old_ticket, Resolution::no_preview(Track::new("A", "S1", "A1"))));
        assert_eq!(session.phase(), &Phase::Loading);

        Ok(())
    }

    #[test]
    fn test_missing_preview_keeps_question_answerable() -> anyhow::Result<()> {
        let (mut session, request, journal) = start(four_songs(), 13);
        resolve_ok(&mut session, request);
        session.select_option(&OptionId::correct())?;
        session.submit_answer()?;
        let request = session.advance()?.unwrap();

        resolve_missing(&mut session, request);

        assert_eq!(session.media(), &Media::Unavailable);
        assert!(!session.playback().is_loaded());
        assert_eq!(journal.borrow().open_resources(), 0);
        let question = session.question().unwrap();
        assert_eq!(question.options.len(), 4);
        assert_eq!(question.options.correct().unwrap().text, "Song2");

        session.select_option(&OptionId::correct())?;
        assert!(session.submit_answer()?.correct);
        assert_eq!(session.score(), 2);

        Ok(())
    }

    #[test]
    fn test_retry_media_keeps_options_and_selection() -> anyhow::Result<()> {
        let (mut session, request, _) = start(four_songs(), 14);
        resolve_missing(&mut session, request);

        let wrong = wrong_option(&session);
        session.select_option(&wrong)?;
        let options_before = session.question().unwrap().options.clone();

        let retry = session.retry_media()?;
        assert_eq!(session.media_retries(), 1);
        assert_eq!(session.media(), &Media::Pending);
        // only one retry in flight
        assert!(session.retry_media().is_err());

        let mut renamed = retry.track.clone();
        renamed.title = "Song1 (Remastered)".into();
        renamed.preview = Some("https://cdn/A-fresh.mp3".into());
        assert!(session.complete_resolve(retry.ticket, Resolution::resolved(renamed)));

        let question = session.question().unwrap();
        assert_eq!(question.options, options_before);
        assert_eq!(question.track.title, "Song1");
        assert_eq!(question.track.preview_url(), Some("https://cdn/A-fresh.mp3"));
        assert_eq!(
            session.phase(),
            &Phase::Ready {
                selection: Some(Selection::Option(wrong))
            }
        );
        assert_eq!(session.playback().current_url(), Some("https://cdn/A-fresh.mp3"));

        Ok(())
    }

    #[test]
    fn test_skip_is_offered_after_two_failed_retries() -> anyhow::Result<()> {
        let (mut session, request, _) = start(four_songs(), 15);
        resolve_missing(&mut session, request);
        assert!(!session.should_offer_skip());

        let retry = session.retry_media()?;
        resolve_missing(&mut session, retry);
        assert!(!session.should_offer_skip());

        let retry = session.retry_media()?;
        resolve_missing(&mut session, retry);
        assert!(session.should_offer_skip());

        // offering is advice only, retrying stays possible
        assert!(session.can_retry_media());

        Ok(())
    }

    #[test]
    fn test_unplayable_preview_can_be_retried() -> anyhow::Result<()> {
        let (mut session, request, journal) = start(four_songs(), 17);
        journal.borrow_mut().fail_open = true;

        let mut track = request.track.clone();
        track.preview = Some("https://cdn/broken.mp3".into());
        assert!(session.complete_resolve(request.ticket, Resolution::resolved(track)));

        assert_eq!(session.media(), &Media::Unavailable);
        assert!(!session.playback().is_loaded());
        assert!(session.can_select());
        assert!(session.can_retry_media());

        journal.borrow_mut().fail_open = false;
        let retry = session.retry_media()?;
        resolve_ok(&mut session, retry);
        assert_eq!(
            session.media(),
            &Media::Available {
                url: "https://cdn/A.mp3".into()
            }
        );
        assert!(session.playback().is_loaded());

        Ok(())
    }

    #[test]
    fn test_retry_requires_unavailable_media() {
        let (mut session, request, _) = start(four_songs(), 16);
        resolve_ok(&mut session, request);

        assert!(matches!(
            session.retry_media(),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_resolve_with_catalog_resolver() -> anyhow::Result<()> {
        let mut quiz = four_songs();
        quiz.tracks[0].catalog_id = Some(CatalogId("100".into()));
        let catalog = FakeCatalog::default()
            .with_id(
                "100",
                Reply::Found(catalog_track("100", "Song1", Some("https://cdn/100.mp3"))),
            )
            .with_title("Song2", Reply::Down);
        let resolver = CatalogResolver::new(catalog);

        let (mut session, request, _) = start(quiz, 17);
        assert!(session.resolve_with(&resolver, request));
        assert_eq!(
            session.media(),
            &Media::Available {
                url: "https://cdn/100.mp3".into()
            }
        );

        session.skip()?;
        session.submit_answer()?;
        let request = session.advance()?.unwrap();
        assert!(session.resolve_with(&resolver, request));
        assert_eq!(session.media(), &Media::Unavailable);
        assert_eq!(session.question().unwrap().options.len(), 4);

        Ok(())
    }

    #[test]
    fn test_same_seed_same_questions() {
        let (mut a, request_a, _) = start(four_songs(), 99);
        let (mut b, request_b, _) = start(four_songs(), 99);

        resolve_ok(&mut a, request_a);
        resolve_ok(&mut b, request_b);

        assert_eq!(a.question().unwrap().options, b.question().unwrap().options);
    }

    #[test]
    fn test_advance_releases_audio_before_next_question() -> anyhow::Result<()> {
        let (mut session, request, journal) = start(four_songs(), 18);
        resolve_ok(&mut session, request);
        session.skip()?;
        session.submit_answer()?;

        session.advance()?;

        assert_eq!(journal.borrow().open_resources(), 0);
        assert_eq!(session.playback().state(), PlaybackState::Idle);

        Ok(())
    }
}
