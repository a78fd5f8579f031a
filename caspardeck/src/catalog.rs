//! Cached clip catalog, rebuilt from the playout server's clip listing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use caspar_client::{CasparClient, ClipInfo};
use hyperdeck_protocol::Timecode;

use crate::device::CLIP_FILE_FORMAT;

/// Default minimum time between two refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

/// Duration reported for a clip without metadata (10 s).
const FALLBACK_DURATION: Timecode = Timecode {
    hours: 0,
    minutes: 0,
    seconds: 10,
    frames: 0,
};

const FALLBACK_VIDEO_FORMAT: &str = "1080p30";

/// One entry of a catalog snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    /// 1-based position in the snapshot.
    pub index: u32,
    pub name: String,
    pub file_format: &'static str,
    pub video_format: String,
    pub duration: Timecode,
    pub start: Timecode,
    pub fps: Option<f64>,
    pub frames: Option<u64>,
}

impl Clip {
    fn new(index: u32, name: String, info: ClipInfo) -> Self {
        Self {
            index,
            name,
            file_format: CLIP_FILE_FORMAT,
            video_format: info
                .video_format
                .unwrap_or_else(|| FALLBACK_VIDEO_FORMAT.to_string()),
            duration: info.duration.unwrap_or(FALLBACK_DURATION),
            start: Timecode::ZERO,
            fps: info.fps,
            frames: info.frames,
        }
    }

    /// Name to address the clip by on the playout server: surrounding
    /// quotes and the file extension removed.
    pub fn playout_name(&self) -> &str {
        let name = self.name.trim_matches('"');
        match name.rsplit_once('.') {
            Some((stem, ext)) if !ext.is_empty() => stem,
            _ => name,
        }
    }
}

/// Process-wide clip catalog shared by every session.
///
/// Readers get an immutable snapshot; a refresh swaps in a whole new one.
pub struct ClipCatalog {
    client: Arc<CasparClient>,
    clips: RwLock<Arc<Vec<Clip>>>,
    last_refresh: Mutex<Option<Instant>>,
    refresh_interval: Duration,
}

impl ClipCatalog {
    pub fn new(client: Arc<CasparClient>, refresh_interval: Duration) -> Self {
        Self {
            client,
            clips: RwLock::new(Arc::new(Vec::new())),
            last_refresh: Mutex::new(None),
            refresh_interval,
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Vec<Clip>> {
        Arc::clone(&self.clips.read())
    }

    pub fn len(&self) -> usize {
        self.clips.read().len()
    }

    /// Clip at a 1-based index in the current snapshot.
    pub fn get(&self, index: u32) -> Option<Clip> {
        let clips = self.clips.read();
        let pos = usize::try_from(index).ok()?.checked_sub(1)?;
        clips.get(pos).cloned()
    }

    /// Replace the catalog with `entries`, numbered from 1 in order.
    pub fn replace(&self, entries: Vec<(String, ClipInfo)>) {
        let clips: Vec<Clip> = entries
            .into_iter()
            .zip(1u32..)
            .map(|((name, info), index)| Clip::new(index, name, info))
            .collect();
        *self.clips.write() = Arc::new(clips);
    }

    /// Start a background refresh unless one was attempted within the
    /// refresh interval. Returns the task handle when a refresh was started.
    ///
    /// The catalog is left untouched when the server is unreachable or
    /// lists no clips.
    pub fn refresh(self: &Arc<Self>, force: bool) -> Option<JoinHandle<()>> {
        {
            let mut last = self.last_refresh.lock();
            if let Some(at) = *last {
                if !force && at.elapsed() < self.refresh_interval {
                    return None;
                }
            }
            *last = Some(Instant::now());
        }

        let catalog = Arc::clone(self);
        Some(tokio::spawn(async move { catalog.rebuild().await }))
    }

    async fn rebuild(&self) {
        let names = match self.client.list_clips().await {
            Ok(names) => names,
            Err(e) => {
                warn!("[Caspar] Failed to refresh clips: {}", e);
                return;
            }
        };
        if names.is_empty() {
            info!("[Caspar] Server returned no clips; keeping existing catalog");
            return;
        }

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let info = match self.client.clip_info(&name).await {
                Ok(info) => info,
                Err(e) => {
                    warn!("[Caspar] CINF failed for \"{}\": {}", name, e);
                    ClipInfo::default()
                }
            };
            entries.push((name, info));
        }

        let count = entries.len();
        self.replace(entries);
        info!("[Caspar] Refreshed {} clips", count);
    }
}
