//! Device clock and sink abstraction
//!
//! The transport scheduler talks to the audio device through this trait only:
//! a monotonic sample clock, timed block scheduling, and cancellation. Block
//! completion is reported out-of-band as [`SinkEvent`]s over a channel, which
//! the playback engine drains back into the transport.

use crate::error::Result;

/// Opaque handle for a scheduled block.
///
/// A plain sequence token rather than a live device object, so the
/// transport's bookkeeping is decoupled from the sink's resource lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u64);

/// Events emitted by an audio sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    /// A scheduled block finished playing naturally.
    ///
    /// Emitted exactly once per non-cancelled block, at or after the block's
    /// natural end on the device clock. Never emitted for cancelled blocks.
    BlockCompleted { handle: BlockId },
}

/// Audio device clock and scheduling sink.
///
/// Time is an integer count of sample frames on the device clock, starting
/// at zero when the sink starts. Using sample ticks instead of seconds keeps
/// every frame start time exact integer arithmetic with no accumulated
/// floating-point drift.
pub trait AudioSink {
    /// Current device clock reading, in sample frames.
    fn now(&self) -> u64;

    /// Schedule an interleaved stereo f32 block to begin playing at
    /// `start_time` on the device clock. Returns the block's opaque handle.
    ///
    /// A start time already in the past is not an error: the device plays the
    /// remaining portion and completes the block normally.
    fn schedule_block(&mut self, samples: Vec<f32>, start_time: u64) -> Result<BlockId>;

    /// Cancel a scheduled block, releasing it immediately even if its start
    /// time is still in the future. No completion event follows.
    fn cancel(&mut self, handle: BlockId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_equality() {
        assert_eq!(BlockId(7), BlockId(7));
        assert_ne!(BlockId(7), BlockId(8));
    }

    #[test]
    fn test_sink_event_carries_handle() {
        let event = SinkEvent::BlockCompleted { handle: BlockId(3) };
        match event {
            SinkEvent::BlockCompleted { handle } => assert_eq!(handle, BlockId(3)),
        }
    }
}
