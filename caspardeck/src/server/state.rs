//! Per-connection transport state.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use hyperdeck_protocol::Timecode;

/// Transport state reported by `transport info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    Stopped,
    Play,
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportStatus::Stopped => f.write_str("stopped"),
            TransportStatus::Play => f.write_str("play"),
        }
    }
}

/// Notification subscriptions. Stored and reported only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyFlags {
    pub transport: bool,
    pub slot: bool,
    pub remote: bool,
    pub configuration: bool,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub remote_enabled: bool,
    pub remote_override: bool,
    pub transport: TransportStatus,
    /// Percent; 0 while stopped.
    pub speed: i32,
    pub current_clip: Option<u32>,
    pub single_clip: bool,
    pub looping: bool,
    pub display_timecode: Timecode,
    pub timeline_timecode: Timecode,
    pub last_timecode_refresh: Option<Instant>,
    pub notify: NotifyFlags,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            remote_enabled: true,
            remote_override: true,
            transport: TransportStatus::Stopped,
            speed: 0,
            current_clip: None,
            single_clip: true,
            looping: false,
            display_timecode: Timecode::ZERO,
            timeline_timecode: Timecode::ZERO,
            last_timecode_refresh: None,
            notify: NotifyFlags::default(),
        }
    }
}

impl SessionState {
    /// Transport commands are accepted when either remote flag is set.
    pub fn remote_allowed(&self) -> bool {
        self.remote_enabled || self.remote_override
    }

    /// Stop and rewind the displayed position.
    pub fn reset_transport(&mut self) {
        self.transport = TransportStatus::Stopped;
        self.speed = 0;
        self.display_timecode = Timecode::ZERO;
        self.timeline_timecode = Timecode::ZERO;
    }
}

/// A session's id together with its state, shared with the background
/// tasks the session spawns.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: u64,
    pub state: Arc<Mutex<SessionState>>,
}

impl SessionHandle {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = SessionState::default();
        assert!(state.remote_allowed());
        assert_eq!(state.transport.to_string(), "stopped");
        assert_eq!(state.current_clip, None);
        assert!(state.single_clip);
        assert!(!state.looping);
        assert_eq!(state.notify, NotifyFlags::default());
    }

    #[test]
    fn test_remote_gate() {
        let mut state = SessionState::default();
        state.remote_enabled = false;
        assert!(state.remote_allowed());
        state.remote_override = false;
        assert!(!state.remote_allowed());
        state.remote_enabled = true;
        assert!(state.remote_allowed());
    }
}
