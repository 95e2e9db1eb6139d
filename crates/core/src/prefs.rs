//! Per-browser user preferences and the key-value port they persist through.
//!
//! Two JSON documents are stored under versioned keys, one for the games
//! panel and one for the systems dock. Loading never fails: a missing or
//! unreadable document yields defaults, and every field is read on its own so
//! one bad value does not discard the rest. Saving is best effort.

use std::collections::BTreeSet;

use hashbrown::HashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::parse_leading_int;

pub const GAMES_KEY: &str = "esweb.games.v5";
pub const SYSTEMS_KEY: &str = "esweb.systems.v2";

/// Keys written by earlier page scripts and the userscript variant, newest
/// first. They are read once for migration and never written.
pub const LEGACY_GAMES_KEYS: &[&str] = &["games-settings-v4", "bwe-games-settings-v4"];
pub const LEGACY_SYSTEMS_KEYS: &[&str] = &["sys-settings-v1", "bwe-sys-settings-v1"];

pub const ZOOM_MIN: f32 = 0.6;
pub const ZOOM_MAX: f32 = 1.8;
pub const ZOOM_STEP: f32 = 0.1;
pub const RECENT_CAP: usize = 24;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Stored page size meaning "everything on one page".
pub const PAGE_SIZE_ALL: u32 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameSort {
    #[default]
    #[serde(rename = "name-asc")]
    NameAsc,
    #[serde(rename = "name-desc")]
    NameDesc,
    #[serde(rename = "year-desc")]
    YearDesc,
    #[serde(rename = "year-asc")]
    YearAsc,
    #[serde(rename = "playcount-desc")]
    PlaycountDesc,
    #[serde(rename = "playcount-asc")]
    PlaycountAsc,
    #[serde(rename = "favorite-first")]
    FavoriteFirst,
}

impl GameSort {
    pub fn all() -> &'static [GameSort] {
        &[
            GameSort::NameAsc,
            GameSort::NameDesc,
            GameSort::YearDesc,
            GameSort::YearAsc,
            GameSort::PlaycountDesc,
            GameSort::PlaycountAsc,
            GameSort::FavoriteFirst,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameSort::NameAsc => "name-asc",
            GameSort::NameDesc => "name-desc",
            GameSort::YearDesc => "year-desc",
            GameSort::YearAsc => "year-asc",
            GameSort::PlaycountDesc => "playcount-desc",
            GameSort::PlaycountAsc => "playcount-asc",
            GameSort::FavoriteFirst => "favorite-first",
        }
    }

    pub fn parse(s: &str) -> Option<GameSort> {
        Self::all().iter().copied().find(|k| k.as_str() == s)
    }
}

/// Page size: a fixed positive count or "all results on one page".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    Fixed(u32),
    All,
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::Fixed(DEFAULT_PAGE_SIZE)
    }
}

impl PageSize {
    /// Interpret a stored number. Non-positive values fall back to the default;
    /// the legacy sentinel and anything above it mean "all".
    pub fn from_raw(raw: i64) -> PageSize {
        if raw >= PAGE_SIZE_ALL as i64 {
            PageSize::All
        } else if raw <= 0 {
            PageSize::default()
        } else {
            PageSize::Fixed(raw as u32)
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            PageSize::Fixed(n) => n,
            PageSize::All => PAGE_SIZE_ALL,
        }
    }

    pub fn options() -> &'static [PageSize] {
        &[
            PageSize::Fixed(10),
            PageSize::Fixed(20),
            PageSize::Fixed(50),
            PageSize::Fixed(100),
            PageSize::All,
        ]
    }
}

impl Serialize for PageSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.to_raw())
    }
}

impl<'de> Deserialize<'de> for PageSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(deserializer)?;
        Ok(int_field(&v).map(PageSize::from_raw).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SystemSort {
    /// Pinned first, then by recency rank, then alphabetical.
    #[default]
    #[serde(rename = "pinned-recent-alpha")]
    Composite,
    #[serde(rename = "pinned-first")]
    PinnedFirst,
    #[serde(rename = "recent-first")]
    RecentFirst,
    #[serde(rename = "alpha")]
    Alpha,
    #[serde(rename = "original")]
    Original,
}

impl SystemSort {
    pub fn all() -> &'static [SystemSort] {
        &[
            SystemSort::Composite,
            SystemSort::PinnedFirst,
            SystemSort::RecentFirst,
            SystemSort::Alpha,
            SystemSort::Original,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SystemSort::Composite => "pinned-recent-alpha",
            SystemSort::PinnedFirst => "pinned-first",
            SystemSort::RecentFirst => "recent-first",
            SystemSort::Alpha => "alpha",
            SystemSort::Original => "original",
        }
    }

    pub fn parse(s: &str) -> Option<SystemSort> {
        Self::all().iter().copied().find(|k| k.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollbarMode {
    Auto,
    #[default]
    Hide,
    Thin,
}

impl ScrollbarMode {
    pub fn all() -> &'static [ScrollbarMode] {
        &[ScrollbarMode::Auto, ScrollbarMode::Hide, ScrollbarMode::Thin]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScrollbarMode::Auto => "auto",
            ScrollbarMode::Hide => "hide",
            ScrollbarMode::Thin => "thin",
        }
    }

    pub fn parse(s: &str) -> Option<ScrollbarMode> {
        Self::all().iter().copied().find(|k| k.as_str() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePrefs {
    pub query: String,
    pub sort: GameSort,
    pub fav_only: bool,
    pub unplayed_only: bool,
    pub cheevos_only: bool,
    pub page_size: PageSize,
    /// 1-based. Clamped against the filtered list on every derivation.
    pub page: u32,
    pub view: ViewMode,
}

impl Default for GamePrefs {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort: GameSort::NameAsc,
            fav_only: false,
            unplayed_only: false,
            cheevos_only: false,
            page_size: PageSize::default(),
            page: 1,
            view: ViewMode::Grid,
        }
    }
}

impl GamePrefs {
    pub fn from_json(d: &Value) -> Self {
        let mut p = Self::default();
        if let Some(q) = d.get("query").and_then(Value::as_str) {
            p.query = q.to_string();
        }
        if let Some(s) = d.get("sort").and_then(Value::as_str).and_then(GameSort::parse) {
            p.sort = s;
        }
        p.fav_only = d.get("favOnly").is_some_and(truthy);
        p.unplayed_only = d.get("unplayedOnly").is_some_and(truthy);
        p.cheevos_only = d.get("cheevosOnly").is_some_and(truthy);
        if let Some(n) = d.get("pageSize").and_then(int_field) {
            p.page_size = PageSize::from_raw(n);
        }
        if let Some(n) = d.get("page").and_then(int_field) {
            p.page = n.clamp(1, u32::MAX as i64) as u32;
        }
        if d.get("view").and_then(Value::as_str) == Some("list") {
            p.view = ViewMode::List;
        }
        p
    }

    /// Back to the out-of-the-box filters. The view mode is a layout choice
    /// and survives a reset.
    pub fn reset_filters(&mut self) {
        let view = self.view;
        *self = Self {
            view,
            ..Self::default()
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemPrefs {
    /// Stored trimmed and lower-cased.
    pub filter: String,
    pub sort: SystemSort,
    pub zoom: f32,
    pub pinned: BTreeSet<String>,
    /// Most recent first, unique, at most [`RECENT_CAP`] entries.
    pub recent: Vec<String>,
    pub scrollbars: ScrollbarMode,
}

impl Default for SystemPrefs {
    fn default() -> Self {
        Self {
            filter: String::new(),
            sort: SystemSort::Composite,
            zoom: 1.0,
            pinned: BTreeSet::new(),
            recent: Vec::new(),
            scrollbars: ScrollbarMode::Hide,
        }
    }
}

impl SystemPrefs {
    pub fn from_json(d: &Value) -> Self {
        let mut p = Self::default();
        if let Some(f) = d.get("filter").and_then(Value::as_str) {
            p.filter = normalize_filter(f);
        }
        if let Some(s) = d.get("sort").and_then(Value::as_str).and_then(SystemSort::parse) {
            p.sort = s;
        }
        let zoom = d
            .get("zoom")
            .and_then(Value::as_f64)
            .filter(|z| z.is_finite() && *z != 0.0)
            .unwrap_or(1.0);
        p.zoom = clamp_zoom(zoom as f32);
        if let Some(items) = d.get("pinned").and_then(Value::as_array) {
            p.pinned = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
        }
        if let Some(items) = d.get("recent").and_then(Value::as_array) {
            for name in items.iter().filter_map(Value::as_str) {
                if p.recent.len() == RECENT_CAP {
                    break;
                }
                if !p.recent.iter().any(|n| n == name) {
                    p.recent.push(name.to_string());
                }
            }
        }
        if let Some(m) = d
            .get("scrollbars")
            .and_then(Value::as_str)
            .and_then(ScrollbarMode::parse)
        {
            p.scrollbars = m;
        }
        p
    }

    /// Move `name` to the front of the recent list.
    pub fn push_recent(&mut self, name: &str) {
        self.recent.retain(|n| n != name);
        self.recent.insert(0, name.to_string());
        self.recent.truncate(RECENT_CAP);
    }

    pub fn recent_rank(&self, name: &str) -> Option<usize> {
        self.recent.iter().position(|n| n == name)
    }

    pub fn toggle_pin(&mut self, name: &str) -> bool {
        if self.pinned.remove(name) {
            false
        } else {
            self.pinned.insert(name.to_string());
            true
        }
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.zoom = clamp_zoom(self.zoom + delta);
    }
}

pub fn normalize_filter(f: &str) -> String {
    f.trim().to_lowercase()
}

/// Clamp into `[ZOOM_MIN, ZOOM_MAX]` and snap to two decimals so repeated
/// steps do not accumulate float noise in storage.
pub fn clamp_zoom(z: f32) -> f32 {
    let z = if z.is_finite() { z } else { 1.0 };
    (z.clamp(ZOOM_MIN, ZOOM_MAX) * 100.0).round() / 100.0
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn int_field(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("storage io: {0}")]
    Io(String),
}

/// Persistence port: a string-to-string store such as `localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str);
}

/// In-process store, used by tests and as a fallback when no browser storage
/// is reachable.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preferences {
    pub games: GamePrefs,
    pub systems: SystemPrefs,
}

pub struct PreferenceStore<S> {
    store: S,
}

impl<S: KeyValueStore> PreferenceStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn load(&mut self) -> Preferences {
        Preferences {
            games: self.load_games(),
            systems: self.load_systems(),
        }
    }

    pub fn load_games(&mut self) -> GamePrefs {
        match self.read_document(GAMES_KEY, LEGACY_GAMES_KEYS) {
            Some((doc, migrated)) => {
                let prefs = GamePrefs::from_json(&doc);
                if migrated {
                    self.save_games(&prefs);
                }
                prefs
            }
            None => GamePrefs::default(),
        }
    }

    pub fn load_systems(&mut self) -> SystemPrefs {
        match self.read_document(SYSTEMS_KEY, LEGACY_SYSTEMS_KEYS) {
            Some((doc, migrated)) => {
                let prefs = SystemPrefs::from_json(&doc);
                if migrated {
                    self.save_systems(&prefs);
                }
                prefs
            }
            None => SystemPrefs::default(),
        }
    }

    pub fn save(&mut self, prefs: &Preferences) {
        self.save_games(&prefs.games);
        self.save_systems(&prefs.systems);
    }

    pub fn save_games(&mut self, prefs: &GamePrefs) {
        self.write_document(GAMES_KEY, prefs);
    }

    pub fn save_systems(&mut self, prefs: &SystemPrefs) {
        self.write_document(SYSTEMS_KEY, prefs);
    }

    /// The parsed document and whether it came from a legacy key.
    fn read_document(&self, key: &str, legacy: &[&str]) -> Option<(Value, bool)> {
        if let Some(raw) = self.store.get(key) {
            return match serde_json::from_str::<Value>(&raw) {
                Ok(doc) if doc.is_object() => Some((doc, false)),
                Ok(_) => {
                    warn!(key, "ignoring stored preferences: not an object");
                    None
                }
                Err(e) => {
                    warn!(key, error = %e, "ignoring unreadable stored preferences");
                    None
                }
            };
        }
        legacy.iter().find_map(|old| {
            let raw = self.store.get(old)?;
            let doc = serde_json::from_str::<Value>(&raw).ok().filter(Value::is_object)?;
            info!(from = *old, to = key, "migrating stored preferences");
            Some((doc, true))
        })
    }

    fn write_document<T: Serialize>(&mut self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "could not serialize preferences");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &raw) {
            warn!(key, error = %e, "could not persist preferences");
        }
    }
}
