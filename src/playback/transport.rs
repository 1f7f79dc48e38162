//! Lookahead transport scheduler
//!
//! The heart of the player. Keeps two fixed-size frames scheduled against the
//! device clock at all times during playback: one audible, one pre-scheduled
//! behind it. Each frame's completion event retires it from the in-flight
//! queue and schedules the next, so the only window for an audible gap is a
//! completion handler arriving more than a full frame late.
//!
//! Playback is oblivious to the content head position, which the user can
//! move at any moment by scrubbing: frame start times are derived from the
//! play epoch and a queued-frame counter, while the head frame only selects
//! *which* content goes into the next scheduled frame.
//!
//! Note that the first frame is scheduled to start one frame duration after
//! the play epoch, so audio is first heard one frame after `play()`.

use crate::audio::sink::{AudioSink, BlockId};
use crate::error::{Error, Result};
use crate::playback::frame_source::FrameSource;
use crate::playback::lag_monitor::{LagMonitor, LagStats};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Wall-clock side of playback.
///
/// Starts when the user presses play and runs until pause. Owned exclusively
/// by the transport; mutated only by the play/pause transitions.
#[derive(Debug)]
struct PlaybackState {
    /// Pressing play makes this true, pause makes it false
    on: bool,

    /// Device-clock tick at which play was pressed. The epoch against which
    /// every frame start time is computed.
    start_time: Option<u64>,

    /// Frames queued since playback began. Frame start times are
    /// `start_time + queued_frames * frame_len`, pure integer arithmetic, so
    /// thousands of scheduled frames accumulate zero drift.
    queued_frames: u64,
}

/// One scheduled, not-yet-completed frame.
#[derive(Debug, Clone, Copy)]
struct QueuedFrame {
    /// Sink handle, used to cancel the block and match its completion event
    handle: BlockId,

    /// Head frame captured at scheduling time. Immutable even if a later
    /// scrub moves the live head: it anchors "what is audible right now".
    head_frame: u64,

    /// Device-clock tick at which this frame starts
    start_time: u64,
}

/// Gapless transport over a device sink and a frame source.
///
/// All operations are synchronous and non-blocking; completion events are
/// fed in by the owner (see `PlaybackEngine`), which also serializes access.
pub struct Transport<S: AudioSink, F: FrameSource<S>> {
    sink: S,
    source: F,

    /// Samples per frame per channel
    frame_len: u32,

    /// Total whole frames in the content; scheduling at or past this index
    /// performs the pause transition instead
    frame_count: u64,

    playback: PlaybackState,

    /// Next content frame index to schedule. User controlled: rewind, scrub
    /// or resume all move it.
    head_frame: u64,

    /// Currently queued frames, oldest first. Two entries in steady state,
    /// barring the moment between a completion and the refill it triggers.
    queued: VecDeque<QueuedFrame>,

    lag: LagMonitor,
}

impl<S: AudioSink, F: FrameSource<S>> Transport<S, F> {
    pub fn new(sink: S, source: F, frame_len: u32, frame_count: u64) -> Result<Self> {
        if frame_len == 0 {
            return Err(Error::Config("frame_len must be non-zero".to_string()));
        }

        Ok(Self {
            sink,
            source,
            frame_len,
            frame_count,
            playback: PlaybackState {
                on: false,
                start_time: None,
                queued_frames: 0,
            },
            head_frame: 0,
            queued: VecDeque::with_capacity(2),
            lag: LagMonitor::new(frame_len),
        })
    }

    /// Begin playback from the current head frame.
    ///
    /// Sets the play epoch to the current device clock reading and primes the
    /// lookahead window with exactly two frames. A no-op while already
    /// playing.
    pub fn play(&mut self) -> Result<()> {
        if self.playback.on {
            debug!("play requested while already playing, ignoring");
            return Ok(());
        }

        self.playback.on = true;
        self.playback.start_time = Some(self.sink.now());
        self.playback.queued_frames = 0;
        info!(head_frame = self.head_frame, "playback started");

        self.queue_frame()?;
        self.queue_frame()?;
        Ok(())
    }

    /// Stop playback.
    ///
    /// Cancels every in-flight block at the sink, including ones whose start
    /// time is still in the future, and clears the queue. The head frame is
    /// left where it is, so the next `play()` resumes from there. A no-op
    /// while already stopped.
    pub fn pause(&mut self) {
        if !self.playback.on && self.queued.is_empty() {
            return;
        }

        self.playback.on = false;
        for frame in self.queued.drain(..) {
            self.sink.cancel(frame.handle);
        }
        info!(head_frame = self.head_frame, "playback stopped");
    }

    /// Move the head to an arbitrary content frame.
    ///
    /// Valid in any state. Already-queued frames are unaffected; the new
    /// position takes effect on the next scheduling decision. While paused
    /// this simply repositions where the next `play()` resumes.
    pub fn set_head_frame(&mut self, frame: u64) {
        self.head_frame = frame;
    }

    /// Head frame of the oldest in-flight frame: the content currently (or
    /// about to be) audible. `None` when nothing is queued, which callers
    /// use to detect natural end-of-playback.
    pub fn current_head_frame(&self) -> Option<u64> {
        self.queued.front().map(|frame| frame.head_frame)
    }

    /// Handle a block completion event from the sink.
    ///
    /// Completions are expected oldest-first; the handle is matched against
    /// the front of the queue and anything else (stale events for cancelled
    /// blocks, duplicates, reorderings) is ignored with a warning rather than
    /// allowed to desynchronize the head tracker. While playing, the retired
    /// frame is immediately replaced to restore the two-frame window.
    pub fn on_block_completed(&mut self, handle: BlockId) -> Result<()> {
        let matches_front = self
            .queued
            .front()
            .is_some_and(|frame| frame.handle == handle);
        if !matches_front {
            warn!(
                ?handle,
                "ignoring completion that does not match the oldest in-flight frame"
            );
            return Ok(());
        }

        if let Some(frame) = self.queued.pop_front() {
            let expected_end = frame.start_time + self.frame_len as u64;
            self.lag.record(expected_end, self.sink.now());

            if self.playback.on {
                self.queue_frame()?;
            }
        }
        Ok(())
    }

    /// Schedule one frame.
    ///
    /// Reaching the end of content performs the pause transition instead of
    /// scheduling. A sink failure is fatal: playback halts (queued blocks
    /// cancelled) and the error is surfaced — a failed frame retried later
    /// would already be late.
    fn queue_frame(&mut self) -> Result<()> {
        if self.head_frame >= self.frame_count {
            self.pause();
            return Ok(());
        }

        let start_time = self.next_frame_start_time()?;
        let offset_samples = self.head_frame * self.frame_len as u64;

        let handle = match self.source.produce_and_schedule(
            &mut self.sink,
            start_time,
            offset_samples,
            self.frame_len,
        ) {
            Ok(handle) => handle,
            Err(e) => {
                self.pause();
                return Err(Error::Scheduling(format!(
                    "frame {} at tick {}: {}",
                    self.head_frame, start_time, e
                )));
            }
        };

        self.queued.push_back(QueuedFrame {
            handle,
            head_frame: self.head_frame,
            start_time,
        });
        self.head_frame += 1;
        Ok(())
    }

    /// Device-clock start time of the next frame.
    ///
    /// The counter is incremented first, so the first frame after `play()`
    /// starts one frame duration after the epoch.
    fn next_frame_start_time(&mut self) -> Result<u64> {
        let epoch = self.playback.start_time.ok_or_else(|| {
            Error::InvalidState("scheduling a frame without an active play epoch".to_string())
        })?;
        self.playback.queued_frames += 1;
        Ok(epoch + self.playback.queued_frames * self.frame_len as u64)
    }

    pub fn is_playing(&self) -> bool {
        self.playback.on
    }

    /// Live head position (the next frame to schedule, not the audible one)
    pub fn head_frame(&self) -> u64 {
        self.head_frame
    }

    /// Number of in-flight frames
    pub fn in_flight(&self) -> usize {
        self.queued.len()
    }

    pub fn frame_len(&self) -> u32 {
        self.frame_len
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn lag_stats(&self) -> LagStats {
        self.lag.stats()
    }
}
