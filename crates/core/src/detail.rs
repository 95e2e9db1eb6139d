//! Detail overlay for one game, opened either from a card in the list or from
//! the "now playing" banner.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::api::{self, MediaKind};
use crate::model::{Game, RawGame};
use crate::probe::ProbeCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DetailSource {
    Card,
    NowPlaying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FactKind {
    Year,
    Genre,
    Path,
    Sessions,
    LastPlayed,
    Players,
    Developer,
    Publisher,
    Favorite,
    Rating,
}

impl FactKind {
    pub fn label(self) -> &'static str {
        match self {
            FactKind::Year => "Année",
            FactKind::Genre => "Genre",
            FactKind::Path => "Chemin",
            FactKind::Sessions => "Sessions",
            FactKind::LastPlayed => "Dernière session",
            FactKind::Players => "Joueurs",
            FactKind::Developer => "Développeur",
            FactKind::Publisher => "Éditeur",
            FactKind::Favorite => "Favori",
            FactKind::Rating => "Note",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fact {
    pub kind: FactKind,
    pub label: &'static str,
    pub value: String,
}

impl Fact {
    fn new(kind: FactKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            label: kind.label(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DetailAction {
    /// Start the game; `path` is already stripped of single quotes.
    Launch { path: String },
    /// Kill the running emulator.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaLinkKind {
    Manual,
    Map,
    RetroAchievements,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaLink {
    pub kind: MediaLinkKind,
    pub title: &'static str,
    pub url: String,
    /// Probed links stay hidden until the backend confirms they exist.
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailView {
    pub source: DetailSource,
    pub title: String,
    /// HTML description as provided by the scraper.
    pub desc: String,
    pub image: Option<String>,
    pub facts: Vec<Fact>,
    pub actions: Vec<DetailAction>,
    pub media: Vec<MediaLink>,
}

impl DetailView {
    /// `system` is the system the game belongs to; media links need it.
    pub fn from_game(game: &Game, source: DetailSource, system: Option<&str>) -> Self {
        let mut actions = Vec::new();
        if !game.path.is_empty() {
            actions.push(DetailAction::Launch {
                path: game.launch_path(),
            });
        }
        if source == DetailSource::NowPlaying {
            actions.push(DetailAction::Stop);
        }
        Self {
            source,
            title: game.name.clone(),
            desc: game.desc.clone(),
            image: [game.image.as_str(), game.thumbnail.as_str()]
                .into_iter()
                .find(|s| !s.is_empty())
                .map(str::to_string),
            facts: facts(game),
            actions,
            media: media_links(game, system),
        }
    }

    /// URLs that still need an existence check before their link can show.
    pub fn probe_urls(&self) -> impl Iterator<Item = &str> {
        self.media
            .iter()
            .filter(|m| m.kind != MediaLinkKind::RetroAchievements)
            .map(|m| m.url.as_str())
    }

    pub fn resolve_media(mut self, probes: &ProbeCache) -> Self {
        for link in &mut self.media {
            if link.kind != MediaLinkKind::RetroAchievements {
                link.visible = probes.is_available(&link.url);
            }
        }
        self
    }
}

pub fn facts(game: &Game) -> Vec<Fact> {
    let mut rows = Vec::new();
    if let Some(year) = game.year {
        rows.push(Fact::new(FactKind::Year, year.to_string()));
    }
    let genre = game.genre.trim();
    if !genre.is_empty() {
        rows.push(Fact::new(FactKind::Genre, genre));
    }
    if !game.path.is_empty() {
        rows.push(Fact::new(FactKind::Path, game.path.as_str()));
    }
    rows.push(Fact::new(
        FactKind::Sessions,
        if game.playcount > 0 {
            format!("{} fois", game.playcount)
        } else {
            "Jamais".to_string()
        },
    ));
    if let Some(last) = format_es_date(&game.last_played) {
        rows.push(Fact::new(FactKind::LastPlayed, last));
    }
    for (kind, value) in [
        (FactKind::Players, &game.players),
        (FactKind::Developer, &game.developer),
        (FactKind::Publisher, &game.publisher),
    ] {
        if !value.is_empty() {
            rows.push(Fact::new(kind, value.as_str()));
        }
    }
    rows.push(Fact::new(
        FactKind::Favorite,
        if game.favorite { "Oui" } else { "Non" },
    ));
    if let Some(r) = game.rating {
        rows.push(Fact::new(FactKind::Rating, format!("{}%", rating_percent(r))));
    }
    rows
}

pub fn rating_percent(rating: f32) -> u32 {
    (rating.clamp(0.0, 1.0) * 100.0).round() as u32
}

fn media_links(game: &Game, system: Option<&str>) -> Vec<MediaLink> {
    let mut links = Vec::new();
    if let Some(system) = system.filter(|s| !s.is_empty()) {
        if !game.id.is_empty() {
            for kind in MediaKind::all() {
                let (kind_link, title) = match kind {
                    MediaKind::Manual => (MediaLinkKind::Manual, "Manuel"),
                    MediaKind::Map => (MediaLinkKind::Map, "Carte/Map"),
                };
                links.push(MediaLink {
                    kind: kind_link,
                    title,
                    url: api::media(system, &game.id, *kind),
                    visible: false,
                });
            }
        }
    }
    if !game.cheevos_id.trim().is_empty() {
        links.push(MediaLink {
            kind: MediaLinkKind::RetroAchievements,
            title: "RetroAchievements",
            url: api::retroachievements_url(&game.cheevos_id),
            visible: true,
        });
    }
    links
}

/// `YYYYMMDD...` to `YYYY-MM-DD`; `None` unless all eight digits are there.
pub fn format_es_date(value: &str) -> Option<String> {
    let head = value.get(..8)?;
    if !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}-{}-{}", &head[..4], &head[4..6], &head[6..8]))
}

/// `data-*` attributes embedded in a game card, keyed without the prefix.
pub type CardAttributes = BTreeMap<String, String>;

pub fn card_attributes(game: &Game) -> CardAttributes {
    let rating = game.rating.map(|r| r.to_string()).unwrap_or_default();
    [
        ("name", game.name.clone()),
        ("desc", game.desc.clone()),
        ("thumb", game.thumbnail.clone()),
        ("image", game.image.clone()),
        ("genre", game.genre.clone()),
        ("releasedate", game.release_date.clone()),
        ("cheevos", game.has_cheevos.to_string()),
        ("path", game.path.clone()),
        ("playcount", game.playcount.to_string()),
        ("players", game.players.clone()),
        ("developer", game.developer.clone()),
        ("publisher", game.publisher.clone()),
        ("rating", rating),
        ("lastplayed", game.last_played.clone()),
        ("favorite", game.favorite.to_string()),
        ("cheevosid", game.cheevos_id.clone()),
        ("id", game.id.clone()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Rebuild a game from card attributes. Missing attributes read as empty.
pub fn game_from_card(attrs: &CardAttributes) -> Game {
    let get = |k: &str| attrs.get(k).cloned().unwrap_or_default();
    let cheevos = get("cheevos");
    let favorite = attrs
        .get("favorite")
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| "false".to_string());
    Game::from(RawGame {
        id: get("id"),
        name: get("name"),
        path: get("path"),
        genre: get("genre"),
        releasedate: get("releasedate"),
        playcount: get("playcount"),
        favorite,
        hidden: String::new(),
        cheevos_hash: if cheevos == "true" { "1".to_string() } else { cheevos },
        cheevos_id: get("cheevosid"),
        thumbnail: get("thumb"),
        image: get("image"),
        marquee: String::new(),
        desc: get("desc"),
        players: get("players"),
        developer: get("developer"),
        publisher: get("publisher"),
        rating: get("rating"),
        lastplayed: get("lastplayed"),
    })
}
