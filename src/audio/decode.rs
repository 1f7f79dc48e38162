//! Audio file loading using symphonia
//!
//! One-shot decode of a complete file into per-channel sample memory.
//! The transport slices the result many times per second during playback,
//! so everything is decoded up front rather than streamed.
//!
//! # Supported Formats
//!
//! Per Cargo.toml symphonia features:
//! - MP3 (mp3)
//! - FLAC (flac)
//! - Vorbis (vorbis)
//! - WAV/PCM (symphonia defaults)

use crate::audio::types::TrackBuffer;
use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

/// Decode an entire audio file into a [`TrackBuffer`].
///
/// # Errors
/// - File not found or unreadable
/// - Unrecognized container or unsupported codec
/// - File contains no decodable audio samples
pub fn load_track<P: AsRef<Path>>(path: P) -> Result<TrackBuffer> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Hint the probe with the file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Decode(format!("unrecognized format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| Error::Decode("no audio track found".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode("missing sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("unsupported codec: {}", e)))?;

    let mut channels: Vec<Vec<f32>> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break; // EOF
            }
            Err(SymphoniaError::ResetRequired) => {
                warn!("decoder reset requested mid-stream, stopping decode");
                break;
            }
            Err(e) => return Err(Error::Decode(format!("packet read failed: {}", e))),
        };

        // Skip packets from other tracks
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // Recoverable corruption: skip the packet
                debug!("skipping corrupt packet: {}", e);
                continue;
            }
            Err(e) => return Err(Error::Decode(format!("decode failed: {}", e))),
        };

        let spec = *decoded.spec();
        let channel_count = spec.channels.count();
        if channels.is_empty() {
            channels = vec![Vec::new(); channel_count];
        } else if channel_count != channels.len() {
            debug!(
                "skipping packet with unexpected channel count {}",
                channel_count
            );
            continue;
        }

        if sample_buf.is_none() {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }

        // Interleave into the reusable buffer, then split out per channel
        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            for frame in buf.samples().chunks_exact(channel_count) {
                for (ch, &sample) in frame.iter().enumerate() {
                    channels[ch].push(sample);
                }
            }
        }
    }

    if channels.is_empty() || channels[0].is_empty() {
        return Err(Error::Decode(format!(
            "no audio samples decoded from {}",
            path.display()
        )));
    }

    let track = TrackBuffer::new(channels, sample_rate);
    info!(
        track_id = %track.track_id,
        channels = track.channel_count(),
        sample_rate = track.sample_rate,
        samples = track.sample_count(),
        duration_s = format!("{:.1}", track.duration_seconds()),
        "track loaded"
    );

    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_track("/nonexistent/file.mp3");
        assert!(result.is_err());
    }

    // Decoding real audio is covered by tests/decode_tests.rs with generated
    // WAV fixtures.
}
