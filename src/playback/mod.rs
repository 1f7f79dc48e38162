//! Transport scheduling and playback orchestration

pub mod engine;
pub mod frame_source;
pub mod lag_monitor;
pub mod transport;

pub use engine::PlaybackEngine;
pub use frame_source::{FrameSource, TrackFrameSource};
pub use lag_monitor::{LagMonitor, LagStats};
pub use transport::Transport;
