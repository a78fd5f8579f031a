//! Command and reply type definitions for the deck protocol.

use std::collections::BTreeMap;

use serde::Serialize;

/// Protocol version reported in the connection banner and device info.
pub const PROTOCOL_VERSION: &str = "1.11";

/// TCP port a HyperDeck listens on.
pub const DEFAULT_PORT: u16 = 9993;

/// A parsed record before any per-command interpretation.
///
/// `params` maps lowercase parameter names to their raw values. A repeated
/// parameter keeps the value of its last occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawCommand {
    /// Canonical lowercase command name (`"play"`, `"clips get"`, ...).
    pub name: String,
    /// Parameter name to raw value.
    pub params: BTreeMap<String, String>,
}

impl RawCommand {
    fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    fn flag(&self, name: &str) -> Option<bool> {
        self.param(name).map(parse_flag)
    }
}

/// Deck booleans: anything other than the literal `true` is false.
fn parse_flag(value: &str) -> bool {
    value == "true"
}

fn parse_number(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

/// Parameters for `play`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayParams {
    /// Target clip. Zero, negative or unparsable ids select clip 1.
    pub clip_id: Option<u32>,
    /// Playback speed in percent. Unparsable values are dropped.
    pub speed: Option<i32>,
    pub looping: Option<bool>,
    pub single_clip: Option<bool>,
}

/// Parameters for `clips get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipsGetParams {
    /// First clip index to return, always >= 1.
    pub start: u32,
    /// Upper bound on the number of clips returned. Only positive counts are kept.
    pub count: Option<u32>,
}

impl Default for ClipsGetParams {
    fn default() -> Self {
        Self { start: 1, count: None }
    }
}

/// Settings carried by `remote` when it is not a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteUpdate {
    pub enable: Option<bool>,
    pub override_enabled: Option<bool>,
}

/// Settings carried by `notify` when it is not a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyUpdate {
    pub transport: Option<bool>,
    pub slot: Option<bool>,
    pub remote: Option<bool>,
    pub configuration: Option<bool>,
}

/// A controller command with typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Quit,
    DeviceInfo,
    SlotInfo,
    DiskList,
    /// `None` queries the current state.
    Remote(Option<RemoteUpdate>),
    /// `None` queries the current subscriptions.
    Notify(Option<NotifyUpdate>),
    Play(PlayParams),
    Stop,
    TransportInfo,
    ClipsCount,
    ClipsGet(ClipsGetParams),
    /// Cue a clip. An unparsable id is kept as 0, which never names a clip.
    Goto { clip_id: Option<u32> },
    /// Anything this deck does not implement.
    Unsupported(String),
}

impl From<RawCommand> for Command {
    fn from(raw: RawCommand) -> Self {
        match raw.name.as_str() {
            "ping" => Command::Ping,
            "quit" => Command::Quit,
            "device info" => Command::DeviceInfo,
            "slot info" => Command::SlotInfo,
            "disk" | "disk list" => Command::DiskList,
            "remote" => {
                if raw.params.is_empty() {
                    Command::Remote(None)
                } else {
                    Command::Remote(Some(RemoteUpdate {
                        enable: raw.flag("enable"),
                        override_enabled: raw.flag("override"),
                    }))
                }
            }
            "notify" => {
                if raw.params.is_empty() {
                    Command::Notify(None)
                } else {
                    Command::Notify(Some(NotifyUpdate {
                        transport: raw.flag("transport"),
                        slot: raw.flag("slot"),
                        remote: raw.flag("remote"),
                        configuration: raw.flag("configuration"),
                    }))
                }
            }
            "play" => Command::Play(PlayParams {
                clip_id: raw.param("clip id").map(|v| {
                    parse_number(v)
                        .filter(|n| *n >= 1)
                        .and_then(|n| u32::try_from(n).ok())
                        .unwrap_or(1)
                }),
                speed: raw
                    .param("speed")
                    .and_then(parse_number)
                    .and_then(|n| i32::try_from(n).ok()),
                looping: raw.flag("loop"),
                single_clip: raw.flag("single clip"),
            }),
            "stop" => Command::Stop,
            "transport info" => Command::TransportInfo,
            "clips count" => Command::ClipsCount,
            "clips get" => {
                let start = raw
                    .param("clip id")
                    .and_then(parse_number)
                    .filter(|n| *n >= 1)
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(1);
                let count = raw
                    .param("count")
                    .and_then(parse_number)
                    .filter(|n| *n > 0)
                    .map(|n| u32::try_from(n).unwrap_or(u32::MAX));
                Command::ClipsGet(ClipsGetParams { start, count })
            }
            "goto" => Command::Goto {
                clip_id: raw.param("clip id").map(|v| {
                    parse_number(v)
                        .and_then(|n| u32::try_from(n).ok())
                        .unwrap_or(0)
                }),
            },
            _ => Command::Unsupported(raw.name),
        }
    }
}

/// A reply sent back to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `200 ok`
    Ok,
    /// `103 unsupported`
    Unsupported,
    /// `111 remote control disabled`
    RemoteDisabled,
    /// `{code} {text}:` followed by one line per entry and a blank line.
    Block {
        code: u16,
        text: &'static str,
        lines: Vec<String>,
    },
}

impl Reply {
    pub fn block(code: u16, text: &'static str, lines: Vec<String>) -> Self {
        Reply::Block { code, text, lines }
    }

    /// Numeric status code of the reply.
    pub fn code(&self) -> u16 {
        match self {
            Reply::Ok => 200,
            Reply::Unsupported => 103,
            Reply::RemoteDisabled => 111,
            Reply::Block { code, .. } => *code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::parse_command;

    fn command(line: &str) -> Command {
        Command::from(parse_command(line).unwrap())
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(command("ping"), Command::Ping);
        assert_eq!(command("QUIT"), Command::Quit);
        assert_eq!(command("device info"), Command::DeviceInfo);
        assert_eq!(command("slot info: slot id: 1"), Command::SlotInfo);
        assert_eq!(command("disk"), Command::DiskList);
        assert_eq!(command("disk list"), Command::DiskList);
        assert_eq!(command("stop"), Command::Stop);
        assert_eq!(command("transport info"), Command::TransportInfo);
        assert_eq!(command("clips count"), Command::ClipsCount);
        assert_eq!(command("record"), Command::Unsupported("record".to_string()));
    }

    #[test]
    fn test_remote_query_and_update() {
        assert_eq!(command("remote"), Command::Remote(None));
        assert_eq!(
            command("remote: enable: true override: yes"),
            Command::Remote(Some(RemoteUpdate {
                enable: Some(true),
                override_enabled: Some(false),
            }))
        );
        // An unknown key still turns the command into an update.
        assert_eq!(
            command("remote: foo: true"),
            Command::Remote(Some(RemoteUpdate::default()))
        );
    }

    #[test]
    fn test_notify_update_only_literal_true() {
        assert_eq!(command("notify"), Command::Notify(None));
        assert_eq!(
            command("notify: transport: true slot: TRUE remote: 1"),
            Command::Notify(Some(NotifyUpdate {
                transport: Some(true),
                slot: Some(false),
                remote: Some(false),
                configuration: None,
            }))
        );
    }

    #[test]
    fn test_play_params() {
        assert_eq!(command("play"), Command::Play(PlayParams::default()));
        assert_eq!(
            command("play: clip id: 3 speed: 50 loop: true single clip: false"),
            Command::Play(PlayParams {
                clip_id: Some(3),
                speed: Some(50),
                looping: Some(true),
                single_clip: Some(false),
            })
        );
        match command("play: clip id: 0 speed: fast") {
            Command::Play(p) => {
                assert_eq!(p.clip_id, Some(1));
                assert_eq!(p.speed, None);
            }
            other => panic!("unexpected {:?}", other),
        }
        match command("play: clip id: banana") {
            Command::Play(p) => assert_eq!(p.clip_id, Some(1)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_clips_get_params() {
        assert_eq!(
            command("clips get"),
            Command::ClipsGet(ClipsGetParams { start: 1, count: None })
        );
        assert_eq!(
            command("clips get: clip id: 2 count: 3"),
            Command::ClipsGet(ClipsGetParams { start: 2, count: Some(3) })
        );
        assert_eq!(
            command("clips get: clip id: -4 count: 0"),
            Command::ClipsGet(ClipsGetParams { start: 1, count: None })
        );
    }

    #[test]
    fn test_goto_params() {
        assert_eq!(command("goto"), Command::Goto { clip_id: None });
        assert_eq!(command("goto: clip id: 7"), Command::Goto { clip_id: Some(7) });
        assert_eq!(command("goto: clip id: x"), Command::Goto { clip_id: Some(0) });
    }

    #[test]
    fn test_reply_codes() {
        assert_eq!(Reply::Ok.code(), 200);
        assert_eq!(Reply::Unsupported.code(), 103);
        assert_eq!(Reply::RemoteDisabled.code(), 111);
        assert_eq!(Reply::block(205, "clips info", vec![]).code(), 205);
    }
}
