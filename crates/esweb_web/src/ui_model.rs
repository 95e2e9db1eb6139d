//! UI labels and text that should be available on both wasm and native.
//!
//! Keeping these out of the wasm-only `web` module allows us to unit-test the
//! option inventories on the host. The interface is in French, like the
//! EmulationStation page it extends.

use esweb::app::{FilterToggle, Frame, LoadState};
use esweb::pipeline::PageSummary;
use esweb::prefs::{GameSort, PageSize, ScrollbarMode, SystemSort, ViewMode};
use serde::Serialize;

/// One entry of a select or toggle group: the value sent back in intents and
/// the text shown for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice<T> {
    pub value: T,
    pub label: String,
}

fn choices<T: Copy>(values: &[T], label: impl Fn(T) -> String) -> Vec<Choice<T>> {
    values
        .iter()
        .map(|&value| Choice {
            value,
            label: label(value),
        })
        .collect()
}

/// Option inventories for every control on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Labels {
    pub game_sorts: Vec<Choice<GameSort>>,
    pub system_sorts: Vec<Choice<SystemSort>>,
    pub scrollbars: Vec<Choice<ScrollbarMode>>,
    pub page_sizes: Vec<Choice<PageSize>>,
    pub views: Vec<Choice<ViewMode>>,
    pub filters: Vec<Choice<FilterToggle>>,
}

pub fn labels() -> Labels {
    Labels {
        game_sorts: choices(GameSort::all(), |s| game_sort_label(s).to_string()),
        system_sorts: choices(SystemSort::all(), |s| system_sort_label(s).to_string()),
        scrollbars: choices(ScrollbarMode::all(), |m| scrollbar_label(m).to_string()),
        page_sizes: choices(PageSize::options(), page_size_label),
        views: choices(&[ViewMode::Grid, ViewMode::List], |v| view_label(v).to_string()),
        filters: choices(filter_toggles(), |f| filter_label(f).to_string()),
    }
}

/// Text derived from a frame, handed to the render callback next to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameText {
    pub summary: String,
    pub pager: String,
    pub placeholder: Option<String>,
    pub scrollbar_class: Option<&'static str>,
}

pub fn frame_text(frame: &Frame) -> FrameText {
    let games = &frame.games;
    FrameText {
        summary: summary_text(&games.summary),
        pager: pager_text(&games.summary),
        placeholder: games_placeholder(&games.load, games.summary.total),
        scrollbar_class: scrollbar_class(frame.dock.scrollbars),
    }
}

pub fn game_sort_label(sort: GameSort) -> &'static str {
    match sort {
        GameSort::NameAsc => "Nom A→Z",
        GameSort::NameDesc => "Nom Z→A",
        GameSort::YearDesc => "Année ↓",
        GameSort::YearAsc => "Année ↑",
        GameSort::PlaycountDesc => "Sessions ↓",
        GameSort::PlaycountAsc => "Sessions ↑",
        GameSort::FavoriteFirst => "Favoris d'abord",
    }
}

pub fn system_sort_label(sort: SystemSort) -> &'static str {
    match sort {
        SystemSort::Composite => "Favoris + Récents + A→Z",
        SystemSort::PinnedFirst => "Favoris d'abord",
        SystemSort::RecentFirst => "Récents d'abord",
        SystemSort::Alpha => "Alphabétique",
        SystemSort::Original => "Ordre original",
    }
}

pub fn scrollbar_label(mode: ScrollbarMode) -> &'static str {
    match mode {
        ScrollbarMode::Auto => "Auto",
        ScrollbarMode::Hide => "Masquer",
        ScrollbarMode::Thin => "Fines",
    }
}

/// Class put on the document root for a scrollbar mode, if any.
pub fn scrollbar_class(mode: ScrollbarMode) -> Option<&'static str> {
    match mode {
        ScrollbarMode::Auto => None,
        ScrollbarMode::Hide => Some("hide-scrollbars"),
        ScrollbarMode::Thin => Some("thin-scrollbars"),
    }
}

pub fn page_size_label(size: PageSize) -> String {
    match size {
        PageSize::Fixed(n) => n.to_string(),
        PageSize::All => "Tous".to_string(),
    }
}

pub fn view_label(view: ViewMode) -> &'static str {
    match view {
        ViewMode::Grid => "Grille",
        ViewMode::List => "Liste",
    }
}

pub fn filter_label(filter: FilterToggle) -> &'static str {
    match filter {
        FilterToggle::Favorites => "Favoris",
        FilterToggle::Unplayed => "Jamais joués",
        FilterToggle::Achievements => "Succès",
    }
}

pub fn filter_toggles() -> &'static [FilterToggle] {
    &[
        FilterToggle::Favorites,
        FilterToggle::Unplayed,
        FilterToggle::Achievements,
    ]
}

/// Range shown in the bottom bar: `21-23`, or `0-0` when nothing matches.
pub fn summary_text(summary: &PageSummary) -> String {
    format!("{}-{}", summary.start, summary.end)
}

pub fn pager_text(summary: &PageSummary) -> String {
    format!("Page {}/{}", summary.page, summary.page_count)
}

/// Placeholder for the games panel, when it shows no cards.
pub fn games_placeholder(load: &LoadState, total: usize) -> Option<String> {
    match load {
        LoadState::Idle => None,
        LoadState::Loading => Some("Chargement des jeux…".to_string()),
        LoadState::Failed(reason) => Some(format!("Impossible de charger les jeux ({reason}).")),
        LoadState::Loaded if total == 0 => {
            Some("Aucun jeu ne correspond aux filtres/recherche.".to_string())
        }
        LoadState::Loaded => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_inventories_are_labelled() {
        let mut labels: Vec<&'static str> = GameSort::all().iter().copied().map(game_sort_label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), GameSort::all().len());

        for s in SystemSort::all() {
            assert!(!system_sort_label(*s).trim().is_empty());
        }
        for m in ScrollbarMode::all() {
            assert!(!scrollbar_label(*m).trim().is_empty());
        }
    }

    #[test]
    fn page_sizes_end_with_all() {
        let labels: Vec<String> = PageSize::options().iter().copied().map(page_size_label).collect();
        assert_eq!(labels, ["10", "20", "50", "100", "Tous"]);
    }

    #[test]
    fn summary_and_placeholder_text() {
        let s = PageSummary::new(23, 3, PageSize::Fixed(10));
        assert_eq!(summary_text(&s), "21-23");
        assert_eq!(pager_text(&s), "Page 3/3");
        assert_eq!(summary_text(&PageSummary::new(0, 1, PageSize::All)), "0-0");

        assert_eq!(games_placeholder(&LoadState::Loaded, 4), None);
        assert_eq!(
            games_placeholder(&LoadState::Failed("Timeout".into()), 0).as_deref(),
            Some("Impossible de charger les jeux (Timeout).")
        );
        assert!(games_placeholder(&LoadState::Loaded, 0).is_some());
    }

    #[test]
    fn label_inventories_serialize_for_the_page() {
        let l = labels();
        assert_eq!(l.game_sorts.len(), GameSort::all().len());
        assert_eq!(l.page_sizes.last().map(|c| c.label.as_str()), Some("Tous"));
        assert_eq!(l.filters[1].label, "Jamais joués");

        let json = serde_json::to_value(&l).unwrap();
        assert_eq!(json["views"][1], serde_json::json!({"value": "list", "label": "Liste"}));
        assert_eq!(json["pageSizes"][4]["value"], 9999);
        assert_eq!(json["scrollbars"][2]["value"], "thin");
    }

    #[test]
    fn frame_text_follows_the_games_panel() {
        let frame = esweb::app::AppState::default().frame();
        let text = frame_text(&frame);
        assert_eq!(text.summary, "0-0");
        assert_eq!(text.placeholder, None);
        assert_eq!(text.scrollbar_class, scrollbar_class(frame.dock.scrollbars));
    }

    #[test]
    fn scrollbar_classes() {
        assert_eq!(scrollbar_class(ScrollbarMode::Auto), None);
        assert_eq!(scrollbar_class(ScrollbarMode::Thin), Some("thin-scrollbars"));
        assert_eq!(filter_toggles().len(), 3);
        assert_eq!(filter_label(FilterToggle::Unplayed), "Jamais joués");
    }
}
