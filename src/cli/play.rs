//! Interactive terminal play session

use std::io::{BufRead, Write};

use log::{debug, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    config::{AudioOutput, PlayConfig},
    domain::quiz::Quiz,
    engine::{
        audio::SilentBackend,
        playback::{AudioBackend, PlaybackController, PlaybackState},
        resolver::TrackResolver,
        session::{Media, Phase, Session, SessionSettings, Verdict},
    },
};

#[derive(Debug, PartialEq)]
enum Command {
    Choose(usize),
    Skip,
    Next,
    Retry,
    Toggle,
    Replay,
    Volume(f32),
    Again,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if let Ok(n) = line.parse::<usize>() {
        return Command::Choose(n);
    }
    let mut words = line.split_whitespace();
    match (words.next(), words.next()) {
        (None, _) | (Some("n"), None) => Command::Next,
        (Some("s"), None) => Command::Skip,
        (Some("r"), None) => Command::Retry,
        (Some("p"), None) => Command::Toggle,
        (Some("replay"), None) => Command::Replay,
        (Some("again"), None) => Command::Again,
        (Some("q"), None) => Command::Quit,
        (Some("v"), Some(volume)) => match volume.parse() {
            Ok(volume) => Command::Volume(volume),
            Err(_) => Command::Unknown(line.to_string()),
        },
        _ => Command::Unknown(line.to_string()),
    }
}

fn audio_backend(config: &PlayConfig) -> Box<dyn AudioBackend> {
    match config.output {
        AudioOutput::Silent => Box::new(SilentBackend),
        AudioOutput::Speaker => speaker_backend(),
    }
}

#[cfg(feature = "speaker")]
fn speaker_backend() -> Box<dyn AudioBackend> {
    match crate::engine::speaker::RodioBackend::open_default() {
        Ok(backend) => Box::new(backend),
        Err(e) => {
            warn!("{e}, playing without sound");
            Box::new(SilentBackend)
        }
    }
}

#[cfg(not(feature = "speaker"))]
fn speaker_backend() -> Box<dyn AudioBackend> {
    warn!("built without the speaker feature, playing without sound");
    Box::new(SilentBackend)
}

/// Plays `quiz` on the terminal until the player quits.
pub fn play_quiz(
    quiz: Quiz,
    resolver: &dyn TrackResolver,
    config: &PlayConfig,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut playback = PlaybackController::new(audio_backend(config), config.volume);
    playback.subscribe(|state| debug!("playback is now {state:?}"));

    let settings = SessionSettings {
        auto_play: config.auto_play,
        skip_after_failures: config.skip_after_failures,
    };
    let (mut session, first) = Session::start(quiz, rng, playback, settings)?;

    writeln!(out, "{}", session.quiz().title)?;
    if let Some(description) = &session.quiz().description {
        writeln!(out, "{description}")?;
    }
    session.resolve_with(resolver, first);

    let result = run_loop(&mut session, resolver, input, out);
    session.close();
    result
}

fn run_loop<R: Rng>(
    session: &mut Session<R>,
    resolver: &dyn TrackResolver,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut line = String::new();
    loop {
        session.playback_mut().poll();
        render(session, out)?;
        write!(out, "> ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }

        match parse_command(&line) {
            Command::Quit => return Ok(()),
            Command::Choose(n) => {
                let id = session
                    .question()
                    .and_then(|q| q.options.at(n.wrapping_sub(1)))
                    .map(|o| o.id.clone());
                match id {
                    Some(id) => match session.select_option(&id) {
                        Ok(()) => submit(session, out)?,
                        Err(e) => writeln!(out, "{e}")?,
                    },
                    None if session.can_select() => writeln!(out, "No option {n}")?,
                    None => writeln!(out, "Cannot answer now")?,
                }
            }
            Command::Skip => match session.skip() {
                Ok(()) => submit(session, out)?,
                Err(e) => writeln!(out, "{e}")?,
            },
            Command::Next => match session.phase() {
                Phase::Answered { .. } => {
                    if let Some(request) = session.advance()? {
                        session.resolve_with(resolver, request);
                    }
                }
                Phase::Ready { .. } => writeln!(out, "Pick an answer first")?,
                _ => {}
            },
            Command::Retry => match session.retry_media() {
                Ok(request) => {
                    session.resolve_with(resolver, request);
                }
                Err(e) => writeln!(out, "{e}")?,
            },
            Command::Again => match session.restart() {
                Ok(request) => {
                    session.resolve_with(resolver, request);
                }
                Err(e) => writeln!(out, "{e}")?,
            },
            Command::Toggle => session.playback_mut().toggle(),
            Command::Replay => session.playback_mut().replay(),
            Command::Volume(volume) => {
                session.playback_mut().set_volume(volume);
                writeln!(out, "Volume {:.0}%", session.playback().volume() * 100.0)?;
            }
            Command::Unknown(cmd) => writeln!(out, "Unknown command: {cmd}")?,
        }
    }
}

fn submit<R: Rng>(session: &mut Session<R>, out: &mut impl Write) -> anyhow::Result<()> {
    let outcome = session.submit_answer()?;
    if outcome.correct {
        writeln!(out, "Correct!")?;
    } else {
        let artist = session
            .question()
            .map(|q| q.track.artist.as_str())
            .unwrap_or_default();
        writeln!(out, "Wrong, it was \"{}\" by {artist}", outcome.answer.text)?;
    }
    Ok(())
}

fn audio_status<R: Rng>(session: &Session<R>) -> String {
    match session.media() {
        Media::Pending => "loading".to_string(),
        Media::Unavailable if session.should_offer_skip() => {
            "no preview available (r to retry, s to skip this question)".to_string()
        }
        Media::Unavailable => "no preview available (r to retry)".to_string(),
        Media::Available { .. } => match session.playback().state() {
            PlaybackState::Playing => "playing (p to pause)".to_string(),
            PlaybackState::Paused | PlaybackState::Idle => "paused (p to play)".to_string(),
            PlaybackState::Ended => "ended (replay to listen again)".to_string(),
        },
    }
}

fn render<R: Rng>(session: &Session<R>, out: &mut impl Write) -> anyhow::Result<()> {
    if let Some(summary) = session.summary() {
        writeln!(out)?;
        writeln!(
            out,
            "Quiz finished! {} / {} ({}%)",
            summary.score,
            summary.total,
            summary.percent()
        )?;
        let verdict = match summary.verdict {
            Verdict::Perfect => "Perfect, you got everything right!",
            Verdict::WellPlayed => "Well played!",
            Verdict::KeepPracticing => "You can do better!",
        };
        writeln!(out, "{verdict}")?;
        writeln!(out, "Type 'again' to play again or 'q' to quit")?;
        return Ok(());
    }

    let Some(question) = session.question() else {
        return Ok(());
    };

    match session.phase() {
        Phase::Ready { .. } => {
            writeln!(out)?;
            writeln!(
                out,
                "Question {} of {}    Score: {} / {}",
                session.index() + 1,
                session.track_count(),
                session.score(),
                session.answered_count()
            )?;
            writeln!(out, "Which song is this? Audio: {}", audio_status(session))?;
            for (i, option) in question.options.iter().enumerate() {
                writeln!(out, "  {}) {}", i + 1, option.text)?;
            }
        }
        Phase::Answered { .. } => {
            if session.index() + 1 < session.track_count() {
                writeln!(out, "Press Enter for the next question")?;
            } else {
                writeln!(out, "Press Enter to see the results")?;
            }
        }
        Phase::Loading | Phase::GameOver => {}
    }
    Ok(())
}
