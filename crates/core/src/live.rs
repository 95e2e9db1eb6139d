//! The "now playing" feed: full-state JSON snapshots pushed over a WebSocket.
//!
//! Only the latest snapshot matters. Identical consecutive payloads are
//! dropped before parsing, and payloads that are not JSON objects are ignored
//! without disturbing the current state.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api;
use crate::model::{lenient_string, Game, RawGame};

pub const MSG_IDLE: &str = "NO GAME RUNNING";
pub const MSG_ERROR: &str = "ERROR";
pub const UNREACHABLE_TEXT: &str = "Notification service unreachable";

#[derive(Debug, Clone, Default, Deserialize)]
struct Snapshot {
    #[serde(default, deserialize_with = "lenient_string")]
    msg: String,
    #[serde(default, rename = "systemName", deserialize_with = "lenient_string")]
    system_name: String,
    #[serde(flatten)]
    game: RawGame,
}

/// A game currently running on the device.
#[derive(Debug, Clone, Default)]
pub struct NowPlaying {
    pub system_name: String,
    raw: RawGame,
}

impl NowPlaying {
    pub fn name(&self) -> &str {
        &self.raw.name
    }

    pub fn to_game(&self) -> Game {
        Game::from(self.raw.clone())
    }

    pub fn banner(&self) -> NowPlayingBanner {
        let image = [self.raw.image.as_str(), self.raw.thumbnail.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(str::to_string);
        NowPlayingBanner {
            image,
            system_name: self.system_name.clone(),
            system_logo: Some(self.system_name.as_str())
                .filter(|s| !s.is_empty())
                .map(api::logo),
            game_name: self.raw.name.clone(),
        }
    }
}

impl PartialEq for NowPlaying {
    fn eq(&self, other: &Self) -> bool {
        self.system_name == other.system_name && self.to_game() == other.to_game()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlayingBanner {
    pub image: Option<String>,
    pub system_name: String,
    pub system_logo: Option<String>,
    pub game_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// Nothing is running; the banner is hidden.
    Idle,
    /// The feed reported an error or the socket closed.
    Unreachable,
    Playing(NowPlaying),
}

impl LiveEvent {
    pub fn parse(raw: &str) -> Result<LiveEvent, serde_json::Error> {
        let snap: Snapshot = serde_json::from_str(raw)?;
        Ok(match snap.msg.as_str() {
            MSG_IDLE => LiveEvent::Idle,
            MSG_ERROR => LiveEvent::Unreachable,
            _ if !snap.game.name.is_empty() => LiveEvent::Playing(NowPlaying {
                system_name: snap.system_name,
                raw: snap.game,
            }),
            _ => LiveEvent::Idle,
        })
    }

    pub fn now_playing(&self) -> Option<&NowPlaying> {
        match self {
            LiveEvent::Playing(np) => Some(np),
            _ => None,
        }
    }
}

/// What the banner area shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LiveStatus {
    Hidden,
    Unreachable { message: &'static str },
    Playing(NowPlayingBanner),
}

impl From<&LiveEvent> for LiveStatus {
    fn from(event: &LiveEvent) -> Self {
        match event {
            LiveEvent::Idle => LiveStatus::Hidden,
            LiveEvent::Unreachable => LiveStatus::Unreachable {
                message: UNREACHABLE_TEXT,
            },
            LiveEvent::Playing(np) => LiveStatus::Playing(np.banner()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LiveFeed {
    last_raw: Option<String>,
}

impl LiveFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one socket message. `None` when it repeats the previous payload
    /// or cannot be read.
    pub fn accept(&mut self, raw: &str) -> Option<LiveEvent> {
        if self.last_raw.as_deref() == Some(raw) {
            return None;
        }
        match LiveEvent::parse(raw) {
            Ok(event) => {
                self.last_raw = Some(raw.to_string());
                debug!(?event, "live snapshot");
                Some(event)
            }
            Err(e) => {
                warn!(error = %e, "ignoring unreadable live snapshot");
                None
            }
        }
    }

    /// The socket went away. Forget the last payload so the first snapshot
    /// after a reconnect is shown even if unchanged.
    pub fn closed(&mut self) -> LiveEvent {
        self.last_raw = None;
        LiveEvent::Unreachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYING: &str = r#"{"name":"Sonic","systemName":"megadrive","thumbnail":"/t.png","path":"/roms/md/sonic.md","playcount":"4","favorite":"true"}"#;

    #[test]
    fn message_kinds() {
        assert_eq!(LiveEvent::parse(r#"{"msg":"NO GAME RUNNING"}"#).unwrap(), LiveEvent::Idle);
        assert_eq!(LiveEvent::parse(r#"{"msg":"ERROR"}"#).unwrap(), LiveEvent::Unreachable);
        assert_eq!(LiveEvent::parse(r#"{}"#).unwrap(), LiveEvent::Idle);
        let ev = LiveEvent::parse(PLAYING).unwrap();
        let np = ev.now_playing().unwrap();
        assert_eq!(np.name(), "Sonic");
        assert_eq!(np.system_name, "megadrive");
        let g = np.to_game();
        assert!(g.favorite);
        assert_eq!(g.playcount, 4);
    }

    #[test]
    fn banner_prefers_image_and_builds_logo() {
        let ev = LiveEvent::parse(PLAYING).unwrap();
        match LiveStatus::from(&ev) {
            LiveStatus::Playing(b) => {
                assert_eq!(b.image.as_deref(), Some("/t.png"));
                assert_eq!(b.system_logo.as_deref(), Some("/systems/megadrive/logo"));
                assert_eq!(b.game_name, "Sonic");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn repeats_and_garbage_are_dropped() {
        let mut feed = LiveFeed::new();
        assert!(feed.accept(PLAYING).is_some());
        assert!(feed.accept(PLAYING).is_none());
        assert!(feed.accept("not json").is_none());
        // Garbage does not reset dedup.
        assert!(feed.accept(PLAYING).is_none());
        assert_eq!(feed.accept(r#"{"msg":"NO GAME RUNNING"}"#), Some(LiveEvent::Idle));
        assert_eq!(feed.closed(), LiveEvent::Unreachable);
        assert!(feed.accept(r#"{"msg":"NO GAME RUNNING"}"#).is_some());
    }
}
