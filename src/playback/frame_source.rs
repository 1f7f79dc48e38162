//! Frame source provider
//!
//! The transport scheduler decides *when* a frame plays and *which* content
//! offset it carries; a frame source produces the audible samples and places
//! them on the sink. [`TrackFrameSource`] is the production implementation,
//! slicing a pre-decoded [`TrackBuffer`].

use crate::audio::sink::{AudioSink, BlockId};
use crate::audio::types::TrackBuffer;
use crate::error::Result;
use std::sync::Arc;

/// Produces and schedules the audible block for one transport frame.
///
/// Given a device-clock start time, a content sample offset, and a frame
/// length, an implementation must synchronously construct the block and
/// schedule it on the sink, returning the sink's handle so the transport can
/// cancel the block and key its completion event.
pub trait FrameSource<S: AudioSink> {
    fn produce_and_schedule(
        &mut self,
        sink: &mut S,
        start_time: u64,
        offset_samples: u64,
        len_samples: u32,
    ) -> Result<BlockId>;
}

/// Frame source backed by a decoded track.
///
/// Slices the shared channel buffers without copying the track itself and
/// interleaves to stereo for the sink: channel 0 left, channel 1 right, a
/// mono track duplicated to both sides, extra channels ignored. A slice
/// reaching past the end of the track is zero-padded.
pub struct TrackFrameSource {
    track: Arc<TrackBuffer>,
}

impl TrackFrameSource {
    pub fn new(track: Arc<TrackBuffer>) -> Self {
        Self { track }
    }

    pub fn track(&self) -> &Arc<TrackBuffer> {
        &self.track
    }
}

impl<S: AudioSink> FrameSource<S> for TrackFrameSource {
    fn produce_and_schedule(
        &mut self,
        sink: &mut S,
        start_time: u64,
        offset_samples: u64,
        len_samples: u32,
    ) -> Result<BlockId> {
        let len = len_samples as usize;
        let offset = offset_samples as usize;
        let mut samples = vec![0.0f32; len * 2];

        if let Some(left) = self.track.channels.first() {
            let right = self.track.channels.get(1).unwrap_or(left);
            for i in 0..len {
                let src = offset + i;
                if src >= left.len() {
                    break; // tail stays zero-padded
                }
                samples[i * 2] = left[src];
                samples[i * 2 + 1] = if src < right.len() { right[src] } else { 0.0 };
            }
        }

        sink.schedule_block(samples, start_time)
    }
}
