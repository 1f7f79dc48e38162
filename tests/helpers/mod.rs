//! Shared test utilities
//!
//! A manually-clocked mock sink plus synthetic track builders, so transport
//! behavior can be driven deterministically without an audio device.

#![allow(dead_code)]

use jogwheel::audio::{AudioSink, BlockId, TrackBuffer};
use jogwheel::{Error, Result};
use std::sync::{Arc, Mutex};

/// One schedule_block call as the sink saw it.
#[derive(Clone)]
pub struct ScheduledCall {
    pub handle: BlockId,
    pub start_time: u64,
    pub samples: Vec<f32>,
}

#[derive(Default)]
struct MockSinkInner {
    now: u64,
    next_id: u64,
    scheduled: Vec<ScheduledCall>,
    cancelled: Vec<BlockId>,
    fail_next_schedule: bool,
}

/// Manually-clocked sink with shared state.
///
/// Clones share one underlying record, so a test can keep a handle while the
/// transport owns another.
#[derive(Clone, Default)]
pub struct MockSink {
    inner: Arc<Mutex<MockSinkInner>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the device clock to an absolute tick
    pub fn set_now(&self, now: u64) {
        self.inner.lock().unwrap().now = now;
    }

    /// Advance the device clock
    pub fn advance(&self, ticks: u64) {
        self.inner.lock().unwrap().now += ticks;
    }

    /// Make the next schedule_block call fail
    pub fn fail_next_schedule(&self) {
        self.inner.lock().unwrap().fail_next_schedule = true;
    }

    /// Every schedule_block call so far, in order
    pub fn scheduled(&self) -> Vec<ScheduledCall> {
        self.inner.lock().unwrap().scheduled.clone()
    }

    /// Handles of every scheduled block, in order
    pub fn handles(&self) -> Vec<BlockId> {
        self.inner
            .lock()
            .unwrap()
            .scheduled
            .iter()
            .map(|call| call.handle)
            .collect()
    }

    /// Every cancel call so far, in order
    pub fn cancelled(&self) -> Vec<BlockId> {
        self.inner.lock().unwrap().cancelled.clone()
    }
}

impl AudioSink for MockSink {
    fn now(&self) -> u64 {
        self.inner.lock().unwrap().now
    }

    fn schedule_block(&mut self, samples: Vec<f32>, start_time: u64) -> Result<BlockId> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_next_schedule {
            inner.fail_next_schedule = false;
            return Err(Error::AudioOutput("mock schedule failure".to_string()));
        }
        let handle = BlockId(inner.next_id);
        inner.next_id += 1;
        inner.scheduled.push(ScheduledCall {
            handle,
            start_time,
            samples,
        });
        Ok(handle)
    }

    fn cancel(&mut self, handle: BlockId) {
        self.inner.lock().unwrap().cancelled.push(handle);
    }
}

/// Stereo track whose left channel is a sample-index ramp (0.0, 1.0, 2.0 ...)
/// so the content offset of a scheduled block can be read off its first
/// sample; right channel mirrors it negated.
pub fn ramp_track(frames: u64, frame_len: u32) -> Arc<TrackBuffer> {
    let samples = (frames * frame_len as u64) as usize;
    let left: Vec<f32> = (0..samples).map(|i| i as f32).collect();
    let right: Vec<f32> = (0..samples).map(|i| -(i as f32)).collect();
    Arc::new(TrackBuffer::new(vec![left, right], 44100))
}
