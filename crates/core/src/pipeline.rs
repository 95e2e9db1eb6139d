//! The game list pipeline: hide filter, text filter, attribute filters, sort,
//! paginate. Everything here is a pure function of the game list and the
//! current [`GamePrefs`].

use std::cmp::Ordering;

use serde::Serialize;

use crate::collate;
use crate::model::Game;
use crate::prefs::{GamePrefs, GameSort, PageSize};
use crate::prng::Prng;

/// Year used for games without one: last when descending, last when ascending.
const YEAR_MISSING_DESC: i64 = -1;
const YEAR_MISSING_ASC: i64 = 99_999;

/// One page of the filtered, sorted list.
#[derive(Debug, Clone, PartialEq)]
pub struct Visible<'a> {
    pub page_items: Vec<&'a Game>,
    /// Number of games passing every filter, across all pages.
    pub total: usize,
    /// The page actually shown, after clamping.
    pub page: u32,
    pub page_count: u32,
}

fn by_name(a: &Game, b: &Game) -> Ordering {
    collate::compare(&a.name, &b.name)
}

pub fn compare(sort: GameSort, a: &Game, b: &Game) -> Ordering {
    match sort {
        GameSort::NameAsc => by_name(a, b),
        GameSort::NameDesc => by_name(b, a),
        GameSort::YearDesc => {
            let ya = a.year.map_or(YEAR_MISSING_DESC, i64::from);
            let yb = b.year.map_or(YEAR_MISSING_DESC, i64::from);
            yb.cmp(&ya).then_with(|| by_name(a, b))
        }
        GameSort::YearAsc => {
            let ya = a.year.map_or(YEAR_MISSING_ASC, i64::from);
            let yb = b.year.map_or(YEAR_MISSING_ASC, i64::from);
            ya.cmp(&yb).then_with(|| by_name(a, b))
        }
        GameSort::PlaycountDesc => b.playcount.cmp(&a.playcount).then_with(|| by_name(a, b)),
        GameSort::PlaycountAsc => a.playcount.cmp(&b.playcount).then_with(|| by_name(a, b)),
        GameSort::FavoriteFirst => b.favorite.cmp(&a.favorite).then_with(|| by_name(a, b)),
    }
}

/// Every game passing the filters, sorted; no pagination.
pub fn filter_sorted<'a>(games: &'a [Game], prefs: &GamePrefs) -> Vec<&'a Game> {
    let query = prefs.query.to_lowercase();
    let mut out: Vec<&Game> = games
        .iter()
        .filter(|g| !g.hidden)
        .filter(|g| {
            query.is_empty()
                || collate::contains_ci(&g.name, &query)
                || collate::contains_ci(&g.genre, &query)
        })
        .filter(|g| !prefs.fav_only || g.favorite)
        .filter(|g| !prefs.unplayed_only || g.playcount == 0)
        .filter(|g| !prefs.cheevos_only || g.has_cheevos)
        .collect();
    out.sort_by(|a, b| compare(prefs.sort, a, b));
    out
}

pub fn page_count(total: usize, size: PageSize) -> u32 {
    match size {
        PageSize::All => 1,
        PageSize::Fixed(n) => {
            let n = n.max(1) as usize;
            total.div_ceil(n).max(1).min(u32::MAX as usize) as u32
        }
    }
}

pub fn clamp_page(page: u32, total: usize, size: PageSize) -> u32 {
    page.clamp(1, page_count(total, size))
}

pub fn paginate<'a>(filtered: &[&'a Game], page: u32, size: PageSize) -> Vec<&'a Game> {
    match size {
        PageSize::All => filtered.to_vec(),
        PageSize::Fixed(n) => {
            let n = n.max(1) as usize;
            let start = (page.max(1) as usize - 1).saturating_mul(n);
            filtered.iter().skip(start).take(n).copied().collect()
        }
    }
}

pub fn derive_visible<'a>(games: &'a [Game], prefs: &GamePrefs) -> Visible<'a> {
    let filtered = filter_sorted(games, prefs);
    let total = filtered.len();
    let page = clamp_page(prefs.page, total, prefs.page_size);
    Visible {
        page_items: paginate(&filtered, page, prefs.page_size),
        total,
        page,
        page_count: page_count(total, prefs.page_size),
    }
}

/// Bottom-bar summary: "{total} games · {start}-{end}".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub total: usize,
    /// 1-based index of the first item shown; 0 when nothing matches.
    pub start: usize,
    pub end: usize,
    pub page: u32,
    pub page_count: u32,
}

impl PageSummary {
    pub fn new(total: usize, page: u32, size: PageSize) -> Self {
        let page = clamp_page(page, total, size);
        let (start, end) = match (total, size) {
            (0, _) => (0, 0),
            (_, PageSize::All) => (1, total),
            (_, PageSize::Fixed(n)) => {
                let n = n.max(1) as usize;
                let first = (page as usize - 1) * n;
                (first + 1, (first + n).min(total))
            }
        };
        Self {
            total,
            start,
            end,
            page,
            page_count: page_count(total, size),
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportEntry<'a> {
    pub name: &'a str,
    pub path: &'a str,
    pub genre: Option<&'a str>,
    pub year: Option<u32>,
    pub playcount: u32,
    pub favorite: bool,
    pub cheevos: bool,
}

/// Pretty-printed JSON of the filtered list, for copying to the clipboard.
pub fn export_minimal(games: &[&Game]) -> String {
    let entries: Vec<ExportEntry<'_>> = games
        .iter()
        .map(|g| ExportEntry {
            name: &g.name,
            path: &g.path,
            genre: Some(g.genre.as_str()).filter(|s| !s.is_empty()),
            year: g.year,
            playcount: g.playcount,
            favorite: g.favorite,
            cheevos: g.has_cheevos,
        })
        .collect();
    // Serializing plain borrowed fields cannot fail.
    serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
}

pub fn pick_random<'a>(games: &[&'a Game], rng: &mut Prng) -> Option<&'a Game> {
    if games.is_empty() {
        return None;
    }
    Some(games[rng.gen_range_usize(0, games.len())])
}
