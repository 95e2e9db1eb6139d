//! The systems dock: a horizontal strip of visible systems with pinning,
//! recency, filtering, zoom, and the selected/running highlights.
//!
//! Persistent parts (pins, recent list, filter, sort, zoom, scrollbars) live in
//! [`SystemPrefs`]; this module holds the transient session state and derives
//! the rendered items from both.

use std::cmp::Ordering;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::collate;
use crate::model::System;
use crate::prefs::{normalize_filter, ScrollbarMode, SystemPrefs, SystemSort};

/// Height in pixels of a dock item at zoom 1.0.
pub const BASE_ITEM_HEIGHT: f32 = 64.0;

/// Rank of a system absent from the recent list.
const NOT_RECENT: usize = 999;

/// What the next render does with the strip's horizontal scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollIntent {
    Keep,
    #[default]
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DockItem {
    pub name: String,
    pub title: String,
    pub logo: Option<String>,
    pub active: bool,
    pub running: bool,
    pub pinned: bool,
    /// Visible game count, once fetched.
    pub count: Option<usize>,
    pub menu: Vec<MenuEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerItem {
    pub name: String,
    pub title: String,
    pub logo: Option<String>,
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockAction {
    Open,
    Random,
    Reload,
    Pin,
}

impl DockAction {
    pub fn all() -> &'static [DockAction] {
        &[
            DockAction::Open,
            DockAction::Random,
            DockAction::Reload,
            DockAction::Pin,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub action: DockAction,
    pub label: &'static str,
}

/// Context menu entries for one system, labels already resolved.
pub fn context_menu(prefs: &SystemPrefs, name: &str) -> Vec<MenuEntry> {
    DockAction::all()
        .iter()
        .map(|&action| {
            let label = match action {
                DockAction::Open => "Ouvrir",
                DockAction::Random => "Lancer un jeu aléatoire",
                DockAction::Reload => "Recharger la gamelist",
                DockAction::Pin if prefs.pinned.contains(name) => "Retirer des favoris",
                DockAction::Pin => "Épingler en favoris",
            };
            MenuEntry { action, label }
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct DockState {
    systems: Vec<System>,
    selected: Option<String>,
    running: Option<String>,
    /// `None` while a count request is in flight.
    counts: HashMap<String, Option<usize>>,
    scroll: ScrollIntent,
}

impl DockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the system list wholesale. Selection, running and cached
    /// counts survive; they are keyed by name.
    pub fn set_systems(&mut self, systems: Vec<System>) {
        self.systems = systems;
        self.scroll = ScrollIntent::Reset;
    }

    pub fn systems(&self) -> &[System] {
        &self.systems
    }

    pub fn system(&self, name: &str) -> Option<&System> {
        self.systems.iter().find(|s| s.name == name)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn running(&self) -> Option<&str> {
        self.running.as_deref()
    }

    pub fn scroll(&self) -> ScrollIntent {
        self.scroll
    }

    /// Start of a transition: the strip keeps its offset unless something
    /// below asks for a reset.
    pub(crate) fn settle_scroll(&mut self) {
        self.scroll = ScrollIntent::Keep;
    }

    /// Make `name` the browsed system and bump it in the recent list.
    /// Returns false when `name` is already selected.
    pub fn select(&mut self, prefs: &mut SystemPrefs, name: &str) -> bool {
        prefs.push_recent(name);
        self.scroll = ScrollIntent::Keep;
        if self.selected.as_deref() == Some(name) {
            return false;
        }
        self.selected = Some(name.to_string());
        true
    }

    /// Set from the live feed; independent of the selection.
    pub fn set_running(&mut self, name: Option<&str>) {
        self.running = name.filter(|n| !n.is_empty()).map(str::to_string);
        self.scroll = ScrollIntent::Keep;
    }

    pub fn toggle_pin(&mut self, prefs: &mut SystemPrefs, name: &str) -> bool {
        self.scroll = ScrollIntent::Reset;
        prefs.toggle_pin(name)
    }

    pub fn set_filter(&mut self, prefs: &mut SystemPrefs, filter: &str) {
        prefs.filter = normalize_filter(filter);
        self.scroll = ScrollIntent::Reset;
    }

    pub fn set_sort(&mut self, prefs: &mut SystemPrefs, sort: SystemSort) {
        prefs.sort = sort;
        self.scroll = ScrollIntent::Keep;
    }

    pub fn zoom_by(&mut self, prefs: &mut SystemPrefs, steps: i32) {
        prefs.zoom_by(steps as f32 * crate::prefs::ZOOM_STEP);
        self.scroll = ScrollIntent::Keep;
    }

    pub fn set_scrollbars(&mut self, prefs: &mut SystemPrefs, mode: ScrollbarMode) {
        prefs.scrollbars = mode;
        self.scroll = ScrollIntent::Keep;
    }

    /// Called on first hover or focus of an item. True when the caller must
    /// fetch the count; the request is then considered in flight.
    pub fn count_requested(&mut self, name: &str) -> bool {
        if self.counts.contains_key(name) {
            return false;
        }
        self.counts.insert(name.to_string(), None);
        true
    }

    /// Cache a count for the rest of the session. Failed fetches record 0.
    pub fn record_count(&mut self, name: &str, count: usize) {
        self.counts.insert(name.to_string(), Some(count));
    }

    pub fn count(&self, name: &str) -> Option<usize> {
        self.counts.get(name).copied().flatten()
    }

    fn visible(&self) -> impl Iterator<Item = &System> {
        self.systems.iter().filter(|s| s.visible)
    }

    pub fn items(&self, prefs: &SystemPrefs) -> Vec<DockItem> {
        let filter = normalize_filter(&prefs.filter);
        let mut list: Vec<&System> = self
            .visible()
            .filter(|s| collate::contains_ci(s.display_name(), &filter))
            .collect();
        sort_systems(&mut list, prefs);
        list.into_iter()
            .map(|s| DockItem {
                name: s.name.clone(),
                title: s.display_name().to_string(),
                logo: s.logo.clone(),
                active: self.selected.as_deref() == Some(s.name.as_str()),
                running: self.running.as_deref() == Some(s.name.as_str()),
                pinned: prefs.pinned.contains(&s.name),
                count: self.count(&s.name),
                menu: context_menu(prefs, &s.name),
            })
            .collect()
    }

    /// Systems picker list: every visible system in backend order, narrowed
    /// by the picker's own filter.
    pub fn picker_items(&self, filter: &str) -> Vec<PickerItem> {
        let filter = normalize_filter(filter);
        self.visible()
            .filter(|s| collate::contains_ci(s.display_name(), &filter))
            .map(|s| PickerItem {
                name: s.name.clone(),
                title: s.display_name().to_string(),
                logo: s.logo.clone(),
                count: self.count(&s.name),
            })
            .collect()
    }
}

pub fn item_height(zoom: f32) -> u32 {
    (BASE_ITEM_HEIGHT * zoom).round().max(0.0) as u32
}

fn alpha(a: &System, b: &System) -> Ordering {
    collate::compare_base(a.display_name(), b.display_name())
}

pub fn sort_systems(list: &mut [&System], prefs: &SystemPrefs) {
    let pin = |s: &System| u8::from(!prefs.pinned.contains(&s.name));
    let recent = |s: &System| prefs.recent_rank(&s.name).unwrap_or(NOT_RECENT);
    match prefs.sort {
        SystemSort::Original => {}
        SystemSort::Alpha => list.sort_by(|a, b| alpha(a, b)),
        SystemSort::PinnedFirst => list.sort_by(|a, b| pin(a).cmp(&pin(b)).then_with(|| alpha(a, b))),
        SystemSort::RecentFirst => {
            list.sort_by(|a, b| recent(a).cmp(&recent(b)).then_with(|| alpha(a, b)))
        }
        SystemSort::Composite => list.sort_by(|a, b| {
            pin(a)
                .cmp(&pin(b))
                .then_with(|| recent(a).cmp(&recent(b)))
                .then_with(|| alpha(a, b))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sys(name: &str, fullname: &str, visible: bool) -> System {
        System {
            name: name.into(),
            fullname: fullname.into(),
            logo: None,
            visible,
        }
    }

    fn dock() -> DockState {
        let mut d = DockState::new();
        d.set_systems(vec![
            sys("snes", "Super Nintendo", true),
            sys("atari2600", "Atari 2600", true),
            sys("nes", "Nintendo", true),
            sys("hidden", "Hidden", false),
        ]);
        d
    }

    fn names(items: &[DockItem]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn pinned_first_beats_alphabet() {
        let d = dock();
        let mut prefs = SystemPrefs {
            sort: SystemSort::PinnedFirst,
            ..SystemPrefs::default()
        };
        prefs.pinned.insert("snes".into());
        assert_eq!(names(&d.items(&prefs)), ["snes", "atari2600", "nes"]);
    }

    #[test]
    fn composite_orders_pin_then_recent_then_alpha() {
        let mut d = dock();
        let mut prefs = SystemPrefs::default();
        prefs.pinned.insert("snes".into());
        d.select(&mut prefs, "atari2600");
        d.select(&mut prefs, "nes");
        assert_eq!(names(&d.items(&prefs)), ["snes", "nes", "atari2600"]);

        prefs.sort = SystemSort::RecentFirst;
        assert_eq!(names(&d.items(&prefs)), ["nes", "atari2600", "snes"]);
        prefs.sort = SystemSort::Alpha;
        assert_eq!(names(&d.items(&prefs)), ["atari2600", "nes", "snes"]);
        prefs.sort = SystemSort::Original;
        assert_eq!(names(&d.items(&prefs)), ["snes", "atari2600", "nes"]);
    }

    #[test]
    fn invisible_systems_and_filter() {
        let mut d = dock();
        let mut prefs = SystemPrefs {
            sort: SystemSort::Original,
            ..SystemPrefs::default()
        };
        d.set_filter(&mut prefs, "  NINTENDO ");
        assert_eq!(prefs.filter, "nintendo");
        assert_eq!(names(&d.items(&prefs)), ["snes", "nes"]);
        assert_eq!(d.scroll(), ScrollIntent::Reset);
        assert_eq!(d.picker_items("hid").len(), 0);
        assert_eq!(d.picker_items("").len(), 3);
    }

    #[test]
    fn selected_and_running_are_independent() {
        let mut d = dock();
        let mut prefs = SystemPrefs::default();
        assert!(d.select(&mut prefs, "nes"));
        assert!(!d.select(&mut prefs, "nes"));
        d.set_running(Some("snes"));
        d.select(&mut prefs, "snes");
        let items = d.items(&prefs);
        let snes = items.iter().find(|i| i.name == "snes").unwrap();
        assert!(snes.active && snes.running);
        let nes = items.iter().find(|i| i.name == "nes").unwrap();
        assert!(!nes.active && !nes.running);
        assert_eq!(d.scroll(), ScrollIntent::Keep);
        d.set_running(None);
        assert_eq!(d.running(), None);
    }

    #[test]
    fn counts_are_fetched_once() {
        let mut d = dock();
        assert!(d.count_requested("nes"));
        assert!(!d.count_requested("nes"));
        assert_eq!(d.count("nes"), None);
        d.record_count("nes", 12);
        assert!(!d.count_requested("nes"));
        let items = d.items(&SystemPrefs::default());
        let nes = items.iter().find(|i| i.name == "nes").unwrap();
        assert_eq!(nes.count, Some(12));
    }

    #[test]
    fn zoom_steps_and_height() {
        let mut d = dock();
        let mut prefs = SystemPrefs::default();
        for _ in 0..20 {
            d.zoom_by(&mut prefs, 1);
        }
        assert_eq!(prefs.zoom, crate::prefs::ZOOM_MAX);
        assert_eq!(item_height(prefs.zoom), 115);
        d.zoom_by(&mut prefs, -3);
        assert_eq!(prefs.zoom, 1.5);
        assert_eq!(item_height(1.0), 64);
    }

    #[test]
    fn context_menu_pin_label_follows_state() {
        let mut prefs = SystemPrefs::default();
        let menu = context_menu(&prefs, "nes");
        assert_eq!(menu.len(), 4);
        assert_eq!(menu[3].label, "Épingler en favoris");
        prefs.pinned.insert("nes".into());
        assert_eq!(context_menu(&prefs, "nes")[3].label, "Retirer des favoris");
    }

    #[test]
    fn dock_items_carry_their_menu() {
        let d = dock();
        let mut prefs = SystemPrefs::default();
        prefs.pinned.insert("snes".into());
        let items = d.items(&prefs);
        let snes = items.iter().find(|i| i.name == "snes").unwrap();
        let actions: Vec<DockAction> = snes.menu.iter().map(|e| e.action).collect();
        assert_eq!(actions, DockAction::all());
        assert_eq!(snes.menu[3].label, "Retirer des favoris");
        let nes = items.iter().find(|i| i.name == "nes").unwrap();
        assert_eq!(nes.menu[3].label, "Épingler en favoris");

        let json = serde_json::to_value(&snes.menu[1]).unwrap();
        assert_eq!(json, serde_json::json!({"action": "random", "label": "Lancer un jeu aléatoire"}));
    }
}
