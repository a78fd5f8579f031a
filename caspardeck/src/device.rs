//! Static identity of the emulated deck.

use hyperdeck_protocol::{Reply, PROTOCOL_VERSION};

/// Fixed device identity reported by `device info`.
#[derive(Debug, Clone, Copy)]
pub struct DeviceInfo {
    pub protocol_version: &'static str,
    pub model: &'static str,
    pub unique_id: &'static str,
    pub slot_count: u32,
    pub software_version: &'static str,
    pub name: &'static str,
}

/// The single, always mounted media slot.
#[derive(Debug, Clone, Copy)]
pub struct SlotInfo {
    pub slot_id: u32,
    pub slot_name: &'static str,
    pub device_name: &'static str,
    pub status: &'static str,
    pub volume_name: &'static str,
    /// Seconds.
    pub recording_time: u64,
    pub video_format: &'static str,
    pub blocked: bool,
    pub remaining_size: u64,
    pub total_size: u64,
}

pub const DEVICE: DeviceInfo = DeviceInfo {
    protocol_version: PROTOCOL_VERSION,
    model: "HyperDeck Studio Mini",
    unique_id: "CASPARDECK-0001",
    slot_count: 1,
    software_version: "8.0",
    name: "CasparDeck",
};

pub const SLOT: SlotInfo = SlotInfo {
    slot_id: 1,
    slot_name: "slot1",
    device_name: "internal",
    status: "mounted",
    volume_name: "CASPAR",
    recording_time: 3600,
    video_format: "1080p25",
    blocked: false,
    remaining_size: 500_000_000_000,
    total_size: 1_000_000_000_000,
};

/// File format reported for every clip.
pub const CLIP_FILE_FORMAT: &str = "QuickTimeProRes";

impl DeviceInfo {
    pub fn reply(&self) -> Reply {
        Reply::block(
            204,
            "device info",
            vec![
                format!("protocol version: {}", self.protocol_version),
                format!("model: {}", self.model),
                format!("unique id: {}", self.unique_id),
                format!("slot count: {}", self.slot_count),
                format!("software version: {}", self.software_version),
                format!("name: {}", self.name),
            ],
        )
    }

    /// Unsolicited banner sent when a controller connects.
    pub fn connection_info(&self) -> Reply {
        Reply::block(
            500,
            "connection info",
            vec![
                format!("protocol version: {}", self.protocol_version),
                format!("model: {}", self.model),
            ],
        )
    }
}

impl SlotInfo {
    pub fn reply(&self) -> Reply {
        Reply::block(
            202,
            "slot info",
            vec![
                format!("slot id: {}", self.slot_id),
                format!("slot name: {}", self.slot_name),
                format!("device name: {}", self.device_name),
                format!("status: {}", self.status),
                format!("volume name: {}", self.volume_name),
                format!("recording time: {}", self.recording_time),
                format!("video format: {}", self.video_format),
                format!("blocked: {}", self.blocked),
                format!("remaining size: {}", self.remaining_size),
                format!("total size: {}", self.total_size),
            ],
        )
    }
}
