//! Translation of deck commands into session updates and playout calls.
//!
//! Replies are produced synchronously from the session and the current
//! catalog snapshot. Every playout call (`PLAY`, `PAUSE`, `LOAD`, `INFO`) and
//! every catalog refresh runs as a detached task whose failure is only
//! logged; the controller's reply never waits for them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use tokio::task::JoinHandle;

use caspar_client::{CasparClient, Layer};
use hyperdeck_protocol::{ClipsGetParams, Command, NotifyUpdate, PlayParams, RemoteUpdate, Reply};

use crate::catalog::ClipCatalog;
use crate::device::{DEVICE, SLOT};
use crate::server::state::{SessionHandle, TransportStatus};

/// Minimum time between two live timecode queries for one session.
const TIMECODE_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

const DEFAULT_PLAY_SPEED: i32 = 100;

/// Shared by every session.
pub struct Dispatcher {
    client: Arc<CasparClient>,
    catalog: Arc<ClipCatalog>,
    layer: Layer,
}

impl Dispatcher {
    pub fn new(client: Arc<CasparClient>, catalog: Arc<ClipCatalog>) -> Self {
        let layer = client.default_layer();
        Self {
            client,
            catalog,
            layer,
        }
    }

    /// Apply one command to the session and build its reply.
    pub fn dispatch(&self, session: &SessionHandle, command: Command) -> Reply {
        match command {
            Command::Ping | Command::Quit => Reply::Ok,
            Command::DeviceInfo => DEVICE.reply(),
            Command::SlotInfo => SLOT.reply(),
            Command::DiskList => self.disk_list(),
            Command::Remote(update) => self.remote(session, update),
            Command::Notify(update) => self.notify(session, update),
            Command::Play(params) => self.play(session, params),
            Command::Stop => self.stop(session),
            Command::TransportInfo => self.transport_info(session),
            Command::ClipsCount => {
                self.catalog.refresh(false);
                Reply::block(
                    214,
                    "clips count",
                    vec![format!("clip count: {}", self.catalog.len())],
                )
            }
            Command::ClipsGet(params) => self.clips_get(params),
            Command::Goto { clip_id } => self.goto(session, clip_id),
            Command::Unsupported(name) => {
                debug!("[Session {}] Unsupported command: {}", session.id, name);
                Reply::Unsupported
            }
        }
    }

    fn disk_list(&self) -> Reply {
        self.catalog.refresh(false);

        let clips = self.catalog.snapshot();
        let mut lines = Vec::with_capacity(clips.len() + 1);
        lines.push(format!("slot id: {}", SLOT.slot_id));
        lines.extend(clips.iter().map(|clip| {
            format!(
                "{}: {} {} {} {}",
                clip.index, clip.name, clip.file_format, clip.video_format, clip.duration
            )
        }));
        Reply::block(206, "disk list", lines)
    }

    fn remote(&self, session: &SessionHandle, update: Option<RemoteUpdate>) -> Reply {
        let mut state = session.state.lock();
        match update {
            None => Reply::block(
                210,
                "remote info",
                vec![
                    format!("enabled: {}", state.remote_enabled),
                    format!("override: {}", state.remote_override),
                ],
            ),
            Some(update) => {
                if let Some(enable) = update.enable {
                    state.remote_enabled = enable;
                }
                if let Some(override_enabled) = update.override_enabled {
                    state.remote_override = override_enabled;
                }
                Reply::Ok
            }
        }
    }

    fn notify(&self, session: &SessionHandle, update: Option<NotifyUpdate>) -> Reply {
        let mut state = session.state.lock();
        match update {
            None => {
                let notify = state.notify;
                Reply::block(
                    209,
                    "notify",
                    vec![
                        format!("transport: {}", notify.transport),
                        format!("slot: {}", notify.slot),
                        format!("remote: {}", notify.remote),
                        format!("configuration: {}", notify.configuration),
                    ],
                )
            }
            Some(update) => {
                let notify = &mut state.notify;
                if let Some(v) = update.transport {
                    notify.transport = v;
                }
                if let Some(v) = update.slot {
                    notify.slot = v;
                }
                if let Some(v) = update.remote {
                    notify.remote = v;
                }
                if let Some(v) = update.configuration {
                    notify.configuration = v;
                }
                Reply::Ok
            }
        }
    }

    fn play(&self, session: &SessionHandle, params: PlayParams) -> Reply {
        {
            let mut state = session.state.lock();
            if !state.remote_allowed() {
                return Reply::RemoteDisabled;
            }

            let index = params.clip_id.or(state.current_clip).unwrap_or(1);
            state.current_clip = Some(index);

            self.catalog.refresh(false);
            match self.catalog.get(index) {
                Some(clip) => {
                    let name = clip.playout_name().to_string();
                    let client = Arc::clone(&self.client);
                    let layer = self.layer;
                    let id = session.id;
                    tokio::spawn(async move {
                        if let Err(e) = client.play_clip(Some(&name), layer).await {
                            warn!("[Session {}] Failed to send PLAY: {}", id, e);
                        }
                    });
                }
                None => debug!("[Session {}] play: clip {} not in catalog", session.id, index),
            }

            state.speed = params.speed.unwrap_or(DEFAULT_PLAY_SPEED);
            if let Some(looping) = params.looping {
                state.looping = looping;
            }
            if let Some(single_clip) = params.single_clip {
                state.single_clip = single_clip;
            }
            state.transport = TransportStatus::Play;
        }

        self.refresh_timecode(session);
        Reply::Ok
    }

    fn stop(&self, session: &SessionHandle) -> Reply {
        {
            let mut state = session.state.lock();
            if !state.remote_allowed() {
                return Reply::RemoteDisabled;
            }
            state.transport = TransportStatus::Stopped;
            state.speed = 0;
        }

        // Stop maps to PAUSE downstream.
        let client = Arc::clone(&self.client);
        let layer = self.layer;
        let id = session.id;
        tokio::spawn(async move {
            if let Err(e) = client.pause(layer).await {
                warn!("[Session {}] Failed to send PAUSE: {}", id, e);
            }
        });

        Reply::Ok
    }

    fn transport_info(&self, session: &SessionHandle) -> Reply {
        self.refresh_timecode(session);

        let state = session.state.lock();
        let clip_id = state
            .current_clip
            .map(|index| index.to_string())
            .unwrap_or_else(|| "none".to_string());

        Reply::block(
            208,
            "transport info",
            vec![
                format!("status: {}", state.transport),
                format!("speed: {}", state.speed),
                format!("slot id: {}", SLOT.slot_id),
                format!("slot name: {}", SLOT.slot_name),
                format!("device name: {}", SLOT.device_name),
                format!("clip id: {}", clip_id),
                format!("single clip: {}", state.single_clip),
                format!("display timecode: {}", state.display_timecode),
                format!("timecode: {}", state.timeline_timecode),
                format!("video format: {}", SLOT.video_format),
                format!("loop: {}", state.looping),
                "timeline: 0".to_string(),
                format!("input video format: {}", SLOT.video_format),
                "dynamic range: Rec709".to_string(),
                "reference locked: false".to_string(),
            ],
        )
    }

    fn clips_get(&self, params: ClipsGetParams) -> Reply {
        self.catalog.refresh(false);

        let clips = self.catalog.snapshot();
        let total = clips.len();
        let start = params.start.max(1) as usize;
        if start > total {
            return Reply::block(205, "clips info", vec!["clip count: 0".to_string()]);
        }

        let remaining = total - (start - 1);
        let count = params
            .count
            .map(|c| c as usize)
            .filter(|c| *c < remaining)
            .unwrap_or(remaining);

        let mut lines = Vec::with_capacity(count + 1);
        lines.push(format!("clip count: {}", total));
        lines.extend(
            clips[start - 1..start - 1 + count]
                .iter()
                .map(|clip| format!("{}: {} {} {}", clip.index, clip.name, clip.start, clip.duration)),
        );
        Reply::block(205, "clips info", lines)
    }

    fn goto(&self, session: &SessionHandle, clip_id: Option<u32>) -> Reply {
        let mut state = session.state.lock();

        if let Some(index) = clip_id {
            self.catalog.refresh(false);
            match self.catalog.get(index) {
                Some(clip) => {
                    state.current_clip = Some(index);

                    let name = clip.playout_name().to_string();
                    let client = Arc::clone(&self.client);
                    let layer = self.layer;
                    let id = session.id;
                    tokio::spawn(async move {
                        if let Err(e) = client.load_clip(&name, layer).await {
                            warn!("[Session {}] Failed to send LOAD: {}", id, e);
                        }
                    });
                }
                None => warn!("[Session {}] goto: invalid clip id {}", session.id, index),
            }
        }

        state.reset_transport();
        Reply::Ok
    }

    /// Query the live position, at most once per interval per session. Both
    /// timecodes are overwritten when the server reports one. Returns the
    /// task handle when a query was started.
    fn refresh_timecode(&self, session: &SessionHandle) -> Option<JoinHandle<()>> {
        {
            let mut state = session.state.lock();
            if let Some(at) = state.last_timecode_refresh {
                if at.elapsed() < TIMECODE_REFRESH_INTERVAL {
                    return None;
                }
            }
            state.last_timecode_refresh = Some(Instant::now());
        }

        let client = Arc::clone(&self.client);
        let layer = self.layer;
        let handle = session.clone();
        Some(tokio::spawn(async move {
            match client.layer_status(layer).await {
                Ok(Some(status)) => {
                    if let Some(timecode) = status.timecode() {
                        let mut state = handle.state.lock();
                        state.display_timecode = timecode;
                        state.timeline_timecode = timecode;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("[Session {}] Failed to fetch timecode: {}", handle.id, e),
            }
        }))
    }
}
