//! Core audio data types
//!
//! Defines the decoded-track buffer shared between the loader, the frame
//! source, and position reporting.

use uuid::Uuid;

/// TrackBuffer holds a fully decoded track as per-channel sample memory.
///
/// Decoding happens once, up front; the transport then slices this immutable
/// data many times per second while scheduling frames, so the samples are
/// kept planar (one `Vec<f32>` per channel) exactly as the decoder produced
/// them.
///
/// **Format:**
/// - Samples are f32 (floating point -1.0 to 1.0)
/// - One inner vector per channel, all the same length
#[derive(Debug, Clone)]
pub struct TrackBuffer {
    /// Track identity, assigned at load time
    pub track_id: Uuid,

    /// PCM samples, one vector per channel
    pub channels: Vec<Vec<f32>>,

    /// Native sample rate of the decoded audio
    pub sample_rate: u32,
}

impl TrackBuffer {
    /// Create a new TrackBuffer from decoded per-channel sample data
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            track_id: Uuid::new_v4(),
            channels,
            sample_rate,
        }
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn sample_count(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Total number of whole frames in the track for a given frame length.
    ///
    /// A trailing partial frame is not counted; playback stops at the last
    /// whole frame.
    pub fn frame_count(&self, frame_len: u32) -> u64 {
        if frame_len == 0 {
            return 0;
        }
        self.sample_count() as u64 / frame_len as u64
    }

    /// Get duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count() as f64 / self.sample_rate as f64
    }

    /// Content time in seconds at a given frame index
    pub fn frame_to_seconds(&self, frame: u64, frame_len: u32) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        (frame * frame_len as u64) as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_track(samples_per_channel: usize) -> TrackBuffer {
        TrackBuffer::new(
            vec![vec![0.1; samples_per_channel], vec![-0.1; samples_per_channel]],
            44100,
        )
    }

    #[test]
    fn test_track_buffer_creation() {
        let track = stereo_track(1000);
        assert_eq!(track.channel_count(), 2);
        assert_eq!(track.sample_count(), 1000);
        assert_eq!(track.sample_rate, 44100);
    }

    #[test]
    fn test_frame_count_floors_partial_frames() {
        // 10000 samples / 4096 per frame = 2 whole frames, remainder dropped
        let track = stereo_track(10000);
        assert_eq!(track.frame_count(4096), 2);

        // Exact multiple
        let track = stereo_track(8192);
        assert_eq!(track.frame_count(4096), 2);

        // Shorter than one frame
        let track = stereo_track(100);
        assert_eq!(track.frame_count(4096), 0);
    }

    #[test]
    fn test_duration_seconds() {
        let track = stereo_track(44100);
        assert!((track.duration_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_to_seconds() {
        let track = stereo_track(44100);
        // Frame 10 at 4410 samples per frame = 1.0 second in
        assert!((track.frame_to_seconds(10, 4410) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_track() {
        let track = TrackBuffer::new(Vec::new(), 44100);
        assert_eq!(track.sample_count(), 0);
        assert_eq!(track.frame_count(4096), 0);
        assert_eq!(track.duration_seconds(), 0.0);
    }
}
