//! Game and system records as served by the EmulationStation web API.
//!
//! The backend serializes most fields as strings, including booleans
//! (`"true"`/`"false"`) and counters. [`RawGame`] and [`RawSystem`] accept
//! whatever shape arrives; [`Game`] and [`System`] are the normalized forms
//! the rest of the crate works with. Normalization happens exactly once, at
//! ingestion, and never fails: malformed fields degrade to "absent".

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FetchError;

/// Accept a string, number, bool or null and keep its textual form.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGame {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub path: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub genre: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub releasedate: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub playcount: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub favorite: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hidden: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cheevos_hash: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cheevos_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub thumbnail: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub marquee: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub desc: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub players: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub developer: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub publisher: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub rating: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lastplayed: String,
}

/// A game with its string-typed fields interpreted.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub name: String,
    pub path: String,
    pub genre: String,
    pub release_date: String,
    /// Year taken from the first four digits of `release_date`.
    pub year: Option<u32>,
    pub playcount: u32,
    pub favorite: bool,
    pub hidden: bool,
    pub cheevos_hash: String,
    pub cheevos_id: String,
    pub has_cheevos: bool,
    pub thumbnail: String,
    pub image: String,
    pub marquee: String,
    pub desc: String,
    pub players: String,
    pub developer: String,
    pub publisher: String,
    /// Rating in `0.0..=1.0` as reported; not clamped here.
    pub rating: Option<f32>,
    pub last_played: String,
}

impl From<RawGame> for Game {
    fn from(raw: RawGame) -> Self {
        let year = year_of(&raw.releasedate);
        let playcount = parse_count(&raw.playcount);
        let has_cheevos = parse_leading_int(&raw.cheevos_hash).is_some_and(|v| v != 0);
        let rating = parse_rating(&raw.rating);
        Self {
            id: raw.id,
            name: raw.name,
            path: raw.path,
            genre: raw.genre,
            release_date: raw.releasedate,
            year,
            playcount,
            favorite: raw.favorite == "true",
            hidden: raw.hidden == "true",
            cheevos_hash: raw.cheevos_hash,
            cheevos_id: raw.cheevos_id,
            has_cheevos,
            thumbnail: raw.thumbnail,
            image: raw.image,
            marquee: raw.marquee,
            desc: raw.desc,
            players: raw.players,
            developer: raw.developer,
            publisher: raw.publisher,
            rating,
            last_played: raw.lastplayed,
        }
    }
}

impl Game {
    /// Path as sent to `/launch`. Single quotes are stripped, as the
    /// frontend's launcher has always done.
    pub fn launch_path(&self) -> String {
        launch_path(&self.path)
    }

    /// Cover art to show: the thumbnail, falling back to the full image.
    pub fn cover(&self) -> Option<&str> {
        [self.thumbnail.as_str(), self.image.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
    }
}

pub fn launch_path(path: &str) -> String {
    path.replace('\'', "")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSystem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub fullname: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub logo: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub visible: String,
}

/// A system (console/platform). Identity is `name`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct System {
    pub name: String,
    pub fullname: String,
    pub logo: Option<String>,
    pub visible: bool,
}

impl From<RawSystem> for System {
    fn from(raw: RawSystem) -> Self {
        Self {
            name: raw.name,
            fullname: raw.fullname,
            logo: Some(raw.logo).filter(|l| !l.is_empty()),
            visible: raw.visible == "true",
        }
    }
}

impl System {
    pub fn display_name(&self) -> &str {
        if self.fullname.is_empty() {
            &self.name
        } else {
            &self.fullname
        }
    }
}

/// Parse a leading base-10 integer the way a lenient text field expects:
/// leading whitespace and an optional sign are accepted, trailing garbage is
/// ignored, no digits at all yields `None`.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end]
        .bytes()
        .fold(0i64, |acc, b| acc.saturating_mul(10).saturating_add((b - b'0') as i64));
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_count(s: &str) -> u32 {
    parse_leading_int(s)
        .map(|v| v.clamp(0, u32::MAX as i64) as u32)
        .unwrap_or(0)
}

fn parse_rating(s: &str) -> Option<f32> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f32>().ok().filter(|r| r.is_finite())
}

/// Year from a `YYYYMMDD...` date. Year zero counts as missing.
pub fn year_of(release_date: &str) -> Option<u32> {
    let head = release_date.get(..4)?;
    if !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    head.parse::<u32>().ok().filter(|y| *y != 0)
}

/// Decode a `/systems/:name/games` payload. Games keep the backend's order
/// but are pre-sorted by raw name, matching the page's initial listing.
pub fn parse_games(body: &str) -> Result<Vec<Game>, FetchError> {
    let raw: Vec<RawGame> =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(ingest_games(raw))
}

pub fn ingest_games(mut raw: Vec<RawGame>) -> Vec<Game> {
    raw.sort_by(|a, b| a.name.cmp(&b.name));
    raw.into_iter().map(Game::from).collect()
}

pub fn parse_systems(body: &str) -> Result<Vec<System>, FetchError> {
    let raw: Vec<RawSystem> =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(raw.into_iter().map(System::from).collect())
}

/// Number of games a user can see in a system (hidden ones excluded).
pub fn visible_count(games: &[Game]) -> usize {
    games.iter().filter(|g| !g.hidden).count()
}
