//! Value types returned by the AMCP client.

use std::fmt;

use hyperdeck_protocol::{seconds_to_timecode, Timecode};

/// A `channel-layer` address on the playout server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layer {
    pub channel: u32,
    pub layer: u32,
}

impl Layer {
    pub fn new(channel: u32, layer: u32) -> Self {
        Self { channel, layer }
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.channel, self.layer)
    }
}

/// Clip metadata from `CINF`. Fields the server did not report are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipInfo {
    pub fps: Option<f64>,
    pub frames: Option<u64>,
    pub duration: Option<Timecode>,
    pub video_format: Option<String>,
}

/// Live playback state of one layer, from `INFO`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerStatus {
    pub clip_name: Option<String>,
    /// Current position in seconds.
    pub current_time: Option<f64>,
    /// Clip length in seconds.
    pub total_time: Option<f64>,
    pub fps: Option<f64>,
    pub looping: Option<bool>,
    pub paused: Option<bool>,
}

impl LayerStatus {
    /// Current position as a timecode, when both position and rate are known.
    pub fn timecode(&self) -> Option<Timecode> {
        seconds_to_timecode(self.current_time?, self.fps?)
    }
}
