//! Playback engine orchestration
//!
//! Owns the transport and wires the sink's completion events back into it.
//! The transport itself is synchronous and single-threaded by design; the
//! engine provides the serialization it assumes (a mutex) and the event
//! plumbing (a tokio task draining the sink channel), and exposes the
//! transport surface upward: play, pause, seek, position.

use crate::audio::sink::{AudioSink, SinkEvent};
use crate::error::{Error, Result};
use crate::playback::frame_source::FrameSource;
use crate::playback::lag_monitor::LagStats;
use crate::playback::transport::Transport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Playback engine - drives a [`Transport`] from sink completion events.
pub struct PlaybackEngine<S, F>
where
    S: AudioSink + Send + 'static,
    F: FrameSource<S> + Send + 'static,
{
    transport: Arc<Mutex<Transport<S, F>>>,

    /// Completion-event receiver, consumed by `start()`
    events: Mutex<Option<mpsc::UnboundedReceiver<SinkEvent>>>,

    /// Event loop running flag
    running: Arc<AtomicBool>,
}

impl<S, F> PlaybackEngine<S, F>
where
    S: AudioSink + Send + 'static,
    F: FrameSource<S> + Send + 'static,
{
    /// Create a new engine around a transport and its sink's event channel.
    pub fn new(transport: Transport<S, F>, events: mpsc::UnboundedReceiver<SinkEvent>) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            events: Mutex::new(Some(events)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the completion-event loop on the current tokio runtime.
    pub fn start(&self) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| Error::InvalidState("playback engine already started".to_string()))?;

        self.running.store(true, Ordering::Relaxed);
        let transport = Arc::clone(&self.transport);
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                match event {
                    SinkEvent::BlockCompleted { handle } => {
                        let result = transport.lock().unwrap().on_block_completed(handle);
                        if let Err(e) = result {
                            error!("playback halted: {}", e);
                        }
                    }
                }
            }
            debug!("sink event loop ended");
        });

        info!("Playback engine started");
        Ok(())
    }

    /// Stop the event loop. In-flight audio is not touched; call `pause()`
    /// first for a silent shutdown.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
        info!("Playback engine stopped");
    }

    /// Begin playback from the current head position.
    pub fn play(&self) -> Result<()> {
        self.transport.lock().unwrap().play()
    }

    /// Stop playback and cancel in-flight frames.
    pub fn pause(&self) {
        self.transport.lock().unwrap().pause();
    }

    /// Scrub to a content frame; takes effect on the next scheduling decision.
    pub fn seek_to_frame(&self, frame: u64) {
        self.transport.lock().unwrap().set_head_frame(frame);
    }

    /// Content frame currently audible, or `None` when nothing is in flight
    /// (before first play, after pause, or at natural end of content).
    pub fn current_head_frame(&self) -> Option<u64> {
        self.transport.lock().unwrap().current_head_frame()
    }

    pub fn is_playing(&self) -> bool {
        self.transport.lock().unwrap().is_playing()
    }

    /// Completion-lag diagnostics for this session
    pub fn lag_stats(&self) -> LagStats {
        self.transport.lock().unwrap().lag_stats()
    }
}
