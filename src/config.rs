//! jogwheel player configuration

use crate::error::{Error, Result};

/// Default frame length in samples per channel.
///
/// Total scheduling latency is two frames (one playing, one pre-scheduled),
/// so 4096 samples at 44.1 kHz gives roughly 186 ms of lookahead.
pub const DEFAULT_BUFFER_SIZE: u32 = 4096;

/// Player configuration
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Frame length in samples per channel. Every scheduled frame has exactly
    /// this many samples, which keeps frame start times pure integer math.
    pub buffer_size: u32,

    /// Output device name (None = system default device)
    pub device: Option<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            device: None,
        }
    }
}

impl PlayerConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(Error::Config("buffer_size must be non-zero".to_string()));
        }
        Ok(())
    }
}
