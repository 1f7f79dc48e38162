//! Audio loading, data types, and device output

pub mod decode;
pub mod output;
pub mod sink;
pub mod types;

pub use decode::load_track;
pub use output::{AudioOutput, OutputHandle};
pub use sink::{AudioSink, BlockId, SinkEvent};
pub use types::TrackBuffer;
