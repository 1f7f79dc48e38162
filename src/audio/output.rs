//! Audio output using cpal
//!
//! Implements the device clock and sink contract on top of a cpal output
//! stream. The render callback advances a monotonic sample clock, mixes any
//! scheduled blocks whose time window overlaps the callback, and emits a
//! completion event when a block's final sample has been rendered.
//!
//! The callback never blocks: scheduled blocks live behind a `try_lock`; if
//! the lock is contended the callback outputs silence for that period and
//! counts an underrun.

use crate::audio::sink::{AudioSink, BlockId, SinkEvent};
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// A block waiting to play (or currently playing) on the device clock.
struct ScheduledBlock {
    handle: BlockId,
    /// Device-clock sample tick at which the first sample sounds
    start_time: u64,
    /// Interleaved stereo samples [L, R, L, R, ...]
    samples: Vec<f32>,
}

impl ScheduledBlock {
    /// Length in sample frames (stereo pairs)
    fn frame_len(&self) -> u64 {
        (self.samples.len() / 2) as u64
    }

    fn end_time(&self) -> u64 {
        self.start_time + self.frame_len()
    }
}

/// State shared between the control side and the real-time render callback.
struct SharedSchedule {
    /// Device clock: sample frames rendered since the stream started
    clock_samples: AtomicU64,

    /// Next block handle to hand out
    next_block_id: AtomicU64,

    /// Callbacks that could not take the schedule lock and emitted silence
    underruns: AtomicU64,

    /// Blocks scheduled but not yet fully rendered. Held briefly by the
    /// render callback via try_lock; at most a couple of entries in steady
    /// state, so a Vec is fine.
    blocks: Mutex<Vec<ScheduledBlock>>,

    /// Completion events toward the playback engine
    events: mpsc::UnboundedSender<SinkEvent>,
}

/// Audio output manager using cpal.
///
/// Owns the device and stream. The [`AudioSink`] seam is exposed through
/// [`OutputHandle`] (via [`AudioOutput::handle`]) so the transport can live
/// on another thread while the stream object stays put.
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    shared: Arc<SharedSchedule>,
}

impl AudioOutput {
    /// List available audio output devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Open an audio device for output.
    ///
    /// # Arguments
    /// - `device_name`: Optional device name (None = default device)
    /// - `buffer_size`: Optional device period size in frames (None = device default)
    ///
    /// # Returns
    /// The output plus the receiving end of its completion-event channel.
    ///
    /// # Fallback Behavior
    /// If the requested device is not found, falls back to the default device.
    pub fn new(
        device_name: Option<String>,
        buffer_size: Option<u32>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SinkEvent>)> {
        let host = cpal::default_host();

        let device = if let Some(name) = device_name.as_ref() {
            let mut devices = host
                .output_devices()
                .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;

            match devices.find(|d| d.name().ok().as_ref() == Some(name)) {
                Some(dev) => {
                    info!("Found requested audio device: {}", name);
                    dev
                }
                None => {
                    warn!(
                        "Requested device '{}' not found, falling back to default device",
                        name
                    );
                    host.default_output_device().ok_or_else(|| {
                        Error::AudioOutput(format!(
                            "Device '{}' not found and no default device available",
                            name
                        ))
                    })?
                }
            }
        } else {
            host.default_output_device()
                .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?
        };

        let (mut config, sample_format) = Self::get_best_config(&device)?;

        if let Some(size) = buffer_size {
            config.buffer_size = cpal::BufferSize::Fixed(size);
            debug!("Using requested device buffer size: {} frames", size);
        }

        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}, buffer_size={:?}",
            config.sample_rate.0, config.channels, sample_format, config.buffer_size
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(SharedSchedule {
            clock_samples: AtomicU64::new(0),
            next_block_id: AtomicU64::new(0),
            underruns: AtomicU64::new(0),
            blocks: Mutex::new(Vec::new()),
            events: tx,
        });

        Ok((
            Self {
                device,
                config,
                sample_format,
                stream: None,
                shared,
            },
            rx,
        ))
    }

    /// Get the best supported configuration for playback.
    ///
    /// Prefers 44.1kHz, stereo, f32 samples (matching our internal format).
    fn get_best_config(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
        let mut supported_configs = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?;

        let preferred = supported_configs.find(|config| {
            config.channels() == 2
                && config.min_sample_rate().0 <= 44100
                && config.max_sample_rate().0 >= 44100
                && config.sample_format() == SampleFormat::F32
        });

        if let Some(supported_config) = preferred {
            let sample_format = supported_config.sample_format();
            let config = supported_config
                .with_sample_rate(cpal::SampleRate(44100))
                .config();
            return Ok((config, sample_format));
        }

        // Fallback: use default config
        let supported_config = device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;

        let sample_format = supported_config.sample_format();
        let config = supported_config.config();
        Ok((config, sample_format))
    }

    /// Begin rendering. The device clock starts counting from zero here.
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Err(Error::InvalidState("audio output already started".to_string()));
        }
        if self.sample_format != SampleFormat::F32 {
            return Err(Error::AudioOutput(format!(
                "unsupported device sample format: {:?}",
                self.sample_format
            )));
        }

        let shared = Arc::clone(&self.shared);
        let channels = self.config.channels as usize;

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _| Self::render(&shared, channels, data),
                move |err| error!("audio stream error: {}", err),
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        info!(
            "Audio output started: {} Hz, {} channels",
            self.config.sample_rate.0, self.config.channels
        );
        Ok(())
    }

    /// Render one device period.
    ///
    /// Real-time path: atomics and one try_lock, no allocation, no logging.
    fn render(shared: &SharedSchedule, channels: usize, data: &mut [f32]) {
        data.fill(0.0);
        let frames = (data.len() / channels) as u64;
        let clock = shared.clock_samples.load(Ordering::Relaxed);

        match shared.blocks.try_lock() {
            Ok(mut blocks) => {
                for block in blocks.iter() {
                    let begin = block.start_time.max(clock);
                    let end = block.end_time().min(clock + frames);
                    let mut t = begin;
                    while t < end {
                        let out = ((t - clock) as usize) * channels;
                        let src = ((t - block.start_time) as usize) * 2;
                        data[out] += block.samples[src];
                        if channels >= 2 {
                            data[out + 1] += block.samples[src + 1];
                        }
                        t += 1;
                    }
                }

                // Retire blocks whose last sample fell inside this period
                blocks.retain(|block| {
                    let finished = block.end_time() <= clock + frames;
                    if finished {
                        let _ = shared
                            .events
                            .send(SinkEvent::BlockCompleted { handle: block.handle });
                    }
                    !finished
                });
            }
            Err(_) => {
                shared.underruns.fetch_add(1, Ordering::Relaxed);
            }
        }

        shared.clock_samples.fetch_add(frames, Ordering::Relaxed);
    }

    /// A cheap, cloneable [`AudioSink`] handle onto this output.
    pub fn handle(&self) -> OutputHandle {
        OutputHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Negotiated output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Render callbacks that emitted silence because the schedule was locked
    pub fn underruns(&self) -> u64 {
        self.shared.underruns.load(Ordering::Relaxed)
    }
}

/// Send + Sync sink handle backed by a running [`AudioOutput`].
#[derive(Clone)]
pub struct OutputHandle {
    shared: Arc<SharedSchedule>,
}

impl AudioSink for OutputHandle {
    fn now(&self) -> u64 {
        self.shared.clock_samples.load(Ordering::Relaxed)
    }

    fn schedule_block(&mut self, samples: Vec<f32>, start_time: u64) -> Result<BlockId> {
        if samples.is_empty() || samples.len() % 2 != 0 {
            return Err(Error::AudioOutput(
                "scheduled block must be non-empty interleaved stereo".to_string(),
            ));
        }

        let handle = BlockId(self.shared.next_block_id.fetch_add(1, Ordering::Relaxed));
        self.shared.blocks.lock().unwrap().push(ScheduledBlock {
            handle,
            start_time,
            samples,
        });
        Ok(handle)
    }

    fn cancel(&mut self, handle: BlockId) {
        self.shared
            .blocks
            .lock()
            .unwrap()
            .retain(|block| block.handle != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_shared() -> (Arc<SharedSchedule>, mpsc::UnboundedReceiver<SinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(SharedSchedule {
                clock_samples: AtomicU64::new(0),
                next_block_id: AtomicU64::new(0),
                underruns: AtomicU64::new(0),
                blocks: Mutex::new(Vec::new()),
                events: tx,
            }),
            rx,
        )
    }

    fn handle_for(shared: &Arc<SharedSchedule>) -> OutputHandle {
        OutputHandle {
            shared: Arc::clone(shared),
        }
    }

    #[test]
    fn test_render_advances_clock() {
        let (shared, _rx) = test_shared();
        let mut data = vec![0.0f32; 256 * 2];

        AudioOutput::render(&shared, 2, &mut data);
        assert_eq!(shared.clock_samples.load(Ordering::Relaxed), 256);

        AudioOutput::render(&shared, 2, &mut data);
        assert_eq!(shared.clock_samples.load(Ordering::Relaxed), 512);
    }

    #[test]
    fn test_render_mixes_block_at_scheduled_time() {
        let (shared, _rx) = test_shared();
        let mut sink = handle_for(&shared);

        // 4-frame block starting at tick 2
        sink.schedule_block(vec![0.5; 8], 2).unwrap();

        let mut data = vec![0.0f32; 8 * 2]; // 8 device frames
        AudioOutput::render(&shared, 2, &mut data);

        // Frames 0..2 silent, frames 2..6 carry the block, 6..8 silent
        assert_eq!(data[0], 0.0);
        assert_eq!(data[3], 0.0);
        assert_eq!(data[4], 0.5); // frame 2 left
        assert_eq!(data[5], 0.5); // frame 2 right
        assert_eq!(data[11], 0.5); // frame 5 right
        assert_eq!(data[12], 0.0); // frame 6 left
    }

    #[test]
    fn test_render_completes_finished_block() {
        let (shared, mut rx) = test_shared();
        let mut sink = handle_for(&shared);

        let handle = sink.schedule_block(vec![0.1; 8], 0).unwrap();

        let mut data = vec![0.0f32; 16 * 2];
        AudioOutput::render(&shared, 2, &mut data);

        assert_eq!(
            rx.try_recv().unwrap(),
            SinkEvent::BlockCompleted { handle }
        );
        assert!(shared.blocks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_block_spanning_periods_completes_once() {
        let (shared, mut rx) = test_shared();
        let mut sink = handle_for(&shared);

        // 12-frame block over 8-frame periods
        let handle = sink.schedule_block(vec![0.1; 24], 0).unwrap();

        let mut data = vec![0.0f32; 8 * 2];
        AudioOutput::render(&shared, 2, &mut data);
        assert!(rx.try_recv().is_err()); // still 4 frames left

        AudioOutput::render(&shared, 2, &mut data);
        assert_eq!(
            rx.try_recv().unwrap(),
            SinkEvent::BlockCompleted { handle }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_cancelled_block_never_completes() {
        let (shared, mut rx) = test_shared();
        let mut sink = handle_for(&shared);

        let handle = sink.schedule_block(vec![0.5; 8], 4).unwrap();
        sink.cancel(handle);

        let mut data = vec![0.0f32; 16 * 2];
        AudioOutput::render(&shared, 2, &mut data);

        assert!(data.iter().all(|&s| s == 0.0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_contended_lock_counts_underrun() {
        let (shared, _rx) = test_shared();
        let _guard = shared.blocks.lock().unwrap();

        let mut data = vec![0.1f32; 8 * 2];
        AudioOutput::render(&shared, 2, &mut data);

        // Silence out, underrun counted, clock still advances
        assert!(data.iter().all(|&s| s == 0.0));
        assert_eq!(shared.underruns.load(Ordering::Relaxed), 1);
        assert_eq!(shared.clock_samples.load(Ordering::Relaxed), 8);
    }

    #[test]
    fn test_schedule_block_rejects_odd_length() {
        let (shared, _rx) = test_shared();
        let mut sink = handle_for(&shared);

        assert!(sink.schedule_block(vec![0.0; 3], 0).is_err());
        assert!(sink.schedule_block(Vec::new(), 0).is_err());
    }

    #[test]
    fn test_handles_are_unique() {
        let (shared, _rx) = test_shared();
        let mut sink = handle_for(&shared);

        let a = sink.schedule_block(vec![0.0; 2], 0).unwrap();
        let b = sink.schedule_block(vec![0.0; 2], 0).unwrap();
        assert_ne!(a, b);
    }
}
