//! # jogwheel
//!
//! Gapless playback of a pre-decoded audio track with a scrubbable transport.
//!
//! **Purpose:** Decode a file once into per-channel sample memory, then keep
//! a two-frame lookahead window scheduled against the audio device clock so
//! playback stays gapless while the user plays, pauses, and scrubs.
//!
//! **Architecture:** Single-stream pipeline using symphonia (decode) + cpal
//! (output). The core is [`playback::Transport`], a synchronous lookahead
//! scheduler driven by block-completion events; [`playback::PlaybackEngine`]
//! supplies the event plumbing and serialization it assumes.

pub mod audio;
pub mod config;
pub mod error;
pub mod playback;

pub use audio::{AudioOutput, AudioSink, BlockId, SinkEvent, TrackBuffer};
pub use config::PlayerConfig;
pub use error::{Error, Result};
pub use playback::{PlaybackEngine, Transport};
