//! Timecode arithmetic.
//!
//! Timecodes are `HH:MM:SS:FF`, where `FF` counts frames within the current
//! second at the nominal (rounded) frame rate.

use std::fmt;

/// A `HH:MM:SS:FF` position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timecode {
    pub hours: u64,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u64,
}

impl Timecode {
    /// `00:00:00:00`
    pub const ZERO: Timecode = Timecode {
        hours: 0,
        minutes: 0,
        seconds: 0,
        frames: 0,
    };

    /// Split a frame count at a whole-number frame rate.
    ///
    /// `rate` must be non-zero.
    pub fn from_total_frames(total_frames: u64, rate: u64) -> Self {
        let total_seconds = total_frames / rate;
        Self {
            hours: total_seconds / 3600,
            minutes: ((total_seconds % 3600) / 60) as u8,
            seconds: (total_seconds % 60) as u8,
            frames: total_frames % rate,
        }
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

/// Nominal whole-number rate, or `None` when it rounds to zero or below.
fn nominal_rate(fps: f64) -> Option<u64> {
    if !fps.is_finite() {
        return None;
    }
    let rounded = fps.round();
    if rounded < 1.0 {
        return None;
    }
    Some(rounded as u64)
}

/// Convert a position in seconds to a timecode.
///
/// The frame count is `floor(seconds * fps)`; it is then split at the
/// rounded frame rate.
pub fn seconds_to_timecode(seconds: f64, fps: f64) -> Option<Timecode> {
    let rate = nominal_rate(fps)?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let total_frames = (seconds * fps).floor() as u64;
    Some(Timecode::from_total_frames(total_frames, rate))
}

/// Convert a frame count to a timecode at the rounded frame rate.
pub fn frames_to_timecode(frames: u64, fps: f64) -> Option<Timecode> {
    let rate = nominal_rate(fps)?;
    Some(Timecode::from_total_frames(frames, rate))
}

/// Best-effort 1080p format label for a frame rate.
pub fn guess_video_format(fps: f64) -> Option<String> {
    let rate = nominal_rate(fps)?;
    Some(match rate {
        25 => "1080p25".to_string(),
        24 => "1080p24".to_string(),
        30 => "1080p30".to_string(),
        50 => "1080p50".to_string(),
        60 => "1080p60".to_string(),
        other => format!("1080p{}", other),
    })
}
