//! Paths of the EmulationStation web API, relative to the page origin.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Characters left alone by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const SYSTEMS: &str = "/systems";
pub const LAUNCH: &str = "/launch";
pub const RELOAD_GAMES: &str = "/reloadgames";
pub const EMU_KILL: &str = "/emukill";
pub const LAUNCH_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Port of the "now playing" WebSocket on the same host as the page.
pub const LIVE_PORT: u16 = 8080;

pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

pub fn games(system: &str) -> String {
    format!("/systems/{}/games", encode_component(system))
}

pub fn logo(system: &str) -> String {
    format!("/systems/{}/logo", encode_component(system))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Manual,
    Map,
}

impl MediaKind {
    pub fn all() -> &'static [MediaKind] {
        &[MediaKind::Manual, MediaKind::Map]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Manual => "manual",
            MediaKind::Map => "map",
        }
    }
}

pub fn media(system: &str, game_id: &str, kind: MediaKind) -> String {
    format!(
        "/systems/{}/games/{}/media/{}",
        encode_component(system),
        encode_component(game_id),
        kind.as_str()
    )
}

/// Body of `POST /launch`: the bare ROM path, sent as-is.
pub fn launch_body(path: &str) -> String {
    crate::model::launch_path(path)
}

/// `ws://host:8080/` (or `wss:`) for a page served from `protocol//host`.
/// `host` may carry a port, which is replaced.
pub fn live_feed_url(page_protocol: &str, host: &str) -> String {
    let scheme = if page_protocol.trim_end_matches(':') == "https" {
        "wss"
    } else {
        "ws"
    };
    let hostname = host.split(':').next().unwrap_or(host);
    format!("{scheme}://{hostname}:{LIVE_PORT}/")
}

pub fn retroachievements_url(cheevos_id: &str) -> String {
    format!(
        "https://retroachievements.org/game/{}",
        encode_component(cheevos_id.trim())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_are_encoded() {
        assert_eq!(games("snes"), "/systems/snes/games");
        assert_eq!(
            media("pc engine", "a/b", MediaKind::Manual),
            "/systems/pc%20engine/games/a%2Fb/media/manual"
        );
        assert_eq!(logo("gb"), "/systems/gb/logo");
    }

    #[test]
    fn live_url_follows_page_protocol() {
        assert_eq!(live_feed_url("http:", "batocera.local"), "ws://batocera.local:8080/");
        assert_eq!(live_feed_url("https:", "10.0.0.5:1234"), "wss://10.0.0.5:8080/");
    }

    #[test]
    fn launch_body_is_raw_path_without_quotes() {
        assert_eq!(launch_body("/roms/n64/Kirby's.z64"), "/roms/n64/Kirbys.z64");
    }

    #[test]
    fn cheevos_link() {
        assert_eq!(
            retroachievements_url(" 1446 "),
            "https://retroachievements.org/game/1446"
        );
    }
}
