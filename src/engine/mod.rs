//! Quiz play engine: question sequencing, answer options, preview
//! resolution and audio playback for one local play session.

pub mod audio;
pub mod distractor;
pub mod options;
pub mod playback;
pub mod resolver;
pub mod session;
#[cfg(feature = "speaker")]
pub mod speaker;
