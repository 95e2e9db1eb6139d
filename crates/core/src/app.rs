//! Application state and its transition function.
//!
//! Every user intent and every backend result arrives as a [`Msg`].
//! [`AppState::update`] consumes the state and returns the next one together
//! with the side effects to run, as [`Command`]s. The rendered page is a
//! projection of the state: [`AppState::frame`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::{self, MediaKind};
use crate::detail::{card_attributes, game_from_card, CardAttributes, DetailSource, DetailView};
use crate::dock::{item_height, DockAction, DockItem, DockState, PickerItem, ScrollIntent};
use crate::error::FetchError;
use crate::live::{LiveEvent, LiveFeed, LiveStatus};
use crate::model::{launch_path, visible_count, Game, System};
use crate::pipeline::{self, PageSummary};
use crate::prefs::{
    GamePrefs, GameSort, PageSize, Preferences, ScrollbarMode, SystemPrefs, SystemSort, ViewMode,
};
use crate::probe::ProbeCache;
use crate::prng::Prng;

/// Delay after startup before the first dock item is auto-selected.
pub const AUTO_SELECT_DELAY_MS: u32 = 600;

/// Identity of one games-list fetch. A response is applied only if it
/// carries the request currently awaited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GamesRequest {
    pub system: String,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "camelCase")]
pub enum LoadState {
    /// No system chosen yet.
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterToggle {
    Favorites,
    Unplayed,
    Achievements,
}

/// Things the user does. Deserializable so a host page can post them as JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Intent {
    SetQuery { query: String },
    SetSort { sort: GameSort },
    SetFilter { filter: FilterToggle, on: bool },
    SetPageSize { size: PageSize },
    GoToPage { page: u32 },
    FirstPage,
    PrevPage,
    NextPage,
    LastPage,
    SetView { view: ViewMode },
    ResetFilters,
    RandomGame,
    Export,
    ReloadGames,
    FocusSearch,

    SelectSystem { name: String },
    HoverSystem { name: String },
    SystemAction { name: String, action: DockAction },
    SetSystemFilter { filter: String },
    SetSystemSort { sort: SystemSort },
    Zoom { steps: i32 },
    SetScrollbars { mode: ScrollbarMode },
    OpenPicker,
    SetPickerFilter { filter: String },
    ClosePicker,
    AutoSelect,

    OpenCardDetail { attributes: CardAttributes },
    OpenNowPlaying,
    CloseDetail,
    Launch { path: String },
    StopEmulator,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Intent(Intent),
    SystemsLoaded(Result<Vec<System>, FetchError>),
    GamesLoaded {
        request: GamesRequest,
        result: Result<Vec<Game>, FetchError>,
    },
    CountLoaded {
        system: String,
        result: Result<usize, FetchError>,
    },
    RandomPoolLoaded {
        system: String,
        result: Result<Vec<Game>, FetchError>,
    },
    ProbeResult {
        url: String,
        exists: bool,
    },
    LiveMessage(String),
    LiveClosed,
}

impl From<Intent> for Msg {
    fn from(intent: Intent) -> Self {
        Msg::Intent(intent)
    }
}

impl Msg {
    /// Map a key press to an intent. `in_input` is true while a text field
    /// has focus; shortcuts then leave the keystroke alone.
    pub fn from_key(key: &str, ctrl: bool, meta: bool, in_input: bool) -> Option<Msg> {
        if in_input {
            return None;
        }
        let intent = match key {
            "/" => Intent::FocusSearch,
            "r" | "R" if !ctrl && !meta => Intent::ReloadGames,
            "ArrowRight" => Intent::NextPage,
            "ArrowLeft" => Intent::PrevPage,
            _ => return None,
        };
        Some(Msg::Intent(intent))
    }
}

/// Side effects requested by a transition. The runtime handles `Persist`;
/// the host executes the rest and reports results back as [`Msg`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    FetchSystems,
    FetchGames(GamesRequest),
    FetchCount { system: String },
    FetchRandomPool { system: String },
    Probe { url: String },
    Launch { path: String },
    ReloadGames,
    KillEmulator,
    CopyToClipboard { text: String },
    FocusSearch,
    Persist,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub name: String,
    pub cover: Option<String>,
    pub year: Option<u32>,
    pub genre: String,
    pub playcount: u32,
    pub favorite: bool,
    pub cheevos: bool,
    pub launch_path: String,
    pub has_manual: bool,
    pub has_map: bool,
    pub attributes: CardAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamesFrame {
    pub load: LoadState,
    pub prefs: GamePrefs,
    pub items: Vec<CardView>,
    pub summary: PageSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DockFrame {
    pub items: Vec<DockItem>,
    pub filter: String,
    pub sort: SystemSort,
    pub zoom: f32,
    pub item_height: u32,
    pub scrollbars: ScrollbarMode,
    pub scroll: ScrollIntent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerFrame {
    pub filter: String,
    pub items: Vec<PickerItem>,
}

/// Everything the host needs to draw the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub nav_title: Option<String>,
    pub systems_error: Option<String>,
    pub games: GamesFrame,
    pub dock: DockFrame,
    pub picker: Option<PickerFrame>,
    pub detail: Option<DetailView>,
    pub live: LiveStatus,
}

#[derive(Debug, Clone)]
struct OpenDetail {
    game: Game,
    source: DetailSource,
    system: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppState {
    prefs: Preferences,
    dock: DockState,
    systems_error: Option<String>,
    games: Vec<Game>,
    games_system: Option<String>,
    load: LoadState,
    generation: u64,
    pending: Option<GamesRequest>,
    probes: ProbeCache,
    feed: LiveFeed,
    live: LiveEvent,
    detail: Option<OpenDetail>,
    picker: Option<String>,
    rng: Prng,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Preferences::default(), 0)
    }
}

impl AppState {
    pub fn new(prefs: Preferences, seed: u64) -> Self {
        Self {
            prefs,
            dock: DockState::new(),
            systems_error: None,
            games: Vec::new(),
            games_system: None,
            load: LoadState::Idle,
            generation: 0,
            pending: None,
            probes: ProbeCache::new(),
            feed: LiveFeed::new(),
            live: LiveEvent::Idle,
            detail: None,
            picker: None,
            rng: Prng::new(seed),
        }
    }

    /// Commands to issue once at startup.
    pub fn init() -> Vec<Command> {
        vec![Command::FetchSystems]
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn selected_system(&self) -> Option<&str> {
        self.dock.selected()
    }

    pub fn running_system(&self) -> Option<&str> {
        self.dock.running()
    }

    pub fn pending_request(&self) -> Option<&GamesRequest> {
        self.pending.as_ref()
    }

    pub fn update(mut self, msg: Msg) -> (AppState, Vec<Command>) {
        let mut cmds = Vec::new();
        self.dock.settle_scroll();
        self.apply(msg, &mut cmds);
        (self, cmds)
    }

    fn apply(&mut self, msg: Msg, cmds: &mut Vec<Command>) {
        match msg {
            Msg::Intent(intent) => self.apply_intent(intent, cmds),
            Msg::SystemsLoaded(Ok(systems)) => {
                info!(count = systems.len(), "systems loaded");
                self.systems_error = None;
                self.dock.set_systems(systems);
            }
            Msg::SystemsLoaded(Err(e)) => {
                warn!(error = %e, detail = %e.detail(), "failed to load systems");
                self.systems_error = Some(e.to_string());
            }
            Msg::GamesLoaded { request, result } => self.games_loaded(request, result, cmds),
            Msg::CountLoaded { system, result } => {
                let count = result.unwrap_or_else(|e| {
                    debug!(%system, error = %e, "count unavailable");
                    0
                });
                self.dock.record_count(&system, count);
            }
            Msg::RandomPoolLoaded { system, result } => match result {
                Ok(games) => {
                    let pool: Vec<&Game> = games.iter().filter(|g| !g.hidden).collect();
                    if let Some(g) = pipeline::pick_random(&pool, &mut self.rng) {
                        info!(%system, game = %g.name, "launching random game");
                        cmds.push(Command::Launch {
                            path: g.launch_path(),
                        });
                    }
                }
                Err(e) => warn!(%system, error = %e, "random pick failed"),
            },
            Msg::ProbeResult { url, exists } => self.probes.record(&url, exists),
            Msg::LiveMessage(raw) => {
                if let Some(event) = self.feed.accept(&raw) {
                    self.apply_live(event);
                }
            }
            Msg::LiveClosed => {
                let event = self.feed.closed();
                self.apply_live(event);
            }
        }
    }

    fn apply_intent(&mut self, intent: Intent, cmds: &mut Vec<Command>) {
        match intent {
            Intent::SetQuery { query } => {
                self.prefs.games.query = query;
                self.filters_changed(cmds);
            }
            Intent::SetSort { sort } => {
                self.prefs.games.sort = sort;
                self.filters_changed(cmds);
            }
            Intent::SetFilter { filter, on } => {
                let g = &mut self.prefs.games;
                match filter {
                    FilterToggle::Favorites => g.fav_only = on,
                    FilterToggle::Unplayed => g.unplayed_only = on,
                    FilterToggle::Achievements => g.cheevos_only = on,
                }
                self.filters_changed(cmds);
            }
            Intent::SetPageSize { size } => {
                self.prefs.games.page_size = size;
                self.filters_changed(cmds);
            }
            Intent::GoToPage { page } => self.go_to_page(page, cmds),
            Intent::FirstPage => self.go_to_page(1, cmds),
            Intent::PrevPage => self.go_to_page(self.prefs.games.page.saturating_sub(1), cmds),
            Intent::NextPage => self.go_to_page(self.prefs.games.page.saturating_add(1), cmds),
            Intent::LastPage => self.go_to_page(u32::MAX, cmds),
            Intent::SetView { view } => {
                self.prefs.games.view = view;
                cmds.push(Command::Persist);
            }
            Intent::ResetFilters => {
                self.prefs.games.reset_filters();
                self.filters_changed(cmds);
            }
            Intent::RandomGame => {
                let filtered = pipeline::filter_sorted(&self.games, &self.prefs.games);
                if let Some(g) = pipeline::pick_random(&filtered, &mut self.rng) {
                    cmds.push(Command::Launch {
                        path: g.launch_path(),
                    });
                }
            }
            Intent::Export => {
                let filtered = pipeline::filter_sorted(&self.games, &self.prefs.games);
                cmds.push(Command::CopyToClipboard {
                    text: pipeline::export_minimal(&filtered),
                });
            }
            Intent::ReloadGames => cmds.push(Command::ReloadGames),
            Intent::FocusSearch => cmds.push(Command::FocusSearch),

            Intent::SelectSystem { name } => {
                self.picker = None;
                self.select_system(&name, cmds);
            }
            Intent::HoverSystem { name } => {
                if self.dock.count_requested(&name) {
                    cmds.push(Command::FetchCount { system: name });
                }
            }
            Intent::SystemAction { name, action } => match action {
                DockAction::Open => self.select_system(&name, cmds),
                DockAction::Random => cmds.push(Command::FetchRandomPool { system: name }),
                DockAction::Reload => cmds.push(Command::ReloadGames),
                DockAction::Pin => {
                    let pinned = self.dock.toggle_pin(&mut self.prefs.systems, &name);
                    debug!(system = %name, pinned, "pin toggled");
                    cmds.push(Command::Persist);
                }
            },
            Intent::SetSystemFilter { filter } => {
                self.dock.set_filter(&mut self.prefs.systems, &filter);
                cmds.push(Command::Persist);
            }
            Intent::SetSystemSort { sort } => {
                self.dock.set_sort(&mut self.prefs.systems, sort);
                cmds.push(Command::Persist);
            }
            Intent::Zoom { steps } => {
                self.dock.zoom_by(&mut self.prefs.systems, steps);
                cmds.push(Command::Persist);
            }
            Intent::SetScrollbars { mode } => {
                self.dock.set_scrollbars(&mut self.prefs.systems, mode);
                cmds.push(Command::Persist);
            }
            Intent::OpenPicker => {
                let filter = self.prefs.systems.filter.clone();
                for item in self.dock.picker_items("") {
                    if self.dock.count_requested(&item.name) {
                        cmds.push(Command::FetchCount { system: item.name });
                    }
                }
                self.picker = Some(filter);
            }
            Intent::SetPickerFilter { filter } => {
                if let Some(current) = self.picker.as_mut() {
                    *current = filter;
                }
            }
            Intent::ClosePicker => self.picker = None,
            Intent::AutoSelect => {
                let idle = self.dock.selected().is_none()
                    && self.pending.is_none()
                    && self.games.is_empty();
                if idle {
                    if let Some(first) = self.dock.items(&self.prefs.systems).into_iter().next() {
                        info!(system = %first.name, "auto-selecting first system");
                        self.select_system(&first.name, cmds);
                    }
                }
            }

            Intent::OpenCardDetail { attributes } => {
                // Cards belong to the list on screen, not to a pending selection.
                let system = self
                    .games_system
                    .as_deref()
                    .or(self.dock.selected())
                    .map(str::to_string);
                self.open_detail(game_from_card(&attributes), DetailSource::Card, system, cmds);
            }
            Intent::OpenNowPlaying => {
                if let Some(np) = self.live.now_playing() {
                    let system = Some(np.system_name.clone()).filter(|s| !s.is_empty());
                    let game = np.to_game();
                    self.open_detail(game, DetailSource::NowPlaying, system, cmds);
                }
            }
            Intent::CloseDetail => self.detail = None,
            Intent::Launch { path } => {
                self.detail = None;
                cmds.push(Command::Launch {
                    path: launch_path(&path),
                });
            }
            Intent::StopEmulator => {
                self.detail = None;
                cmds.push(Command::KillEmulator);
            }
        }
    }

    fn select_system(&mut self, name: &str, cmds: &mut Vec<Command>) {
        self.dock.select(&mut self.prefs.systems, name);
        self.prefs.games.page = 1;
        self.generation += 1;
        let request = GamesRequest {
            system: name.to_string(),
            generation: self.generation,
        };
        debug!(system = name, generation = self.generation, "selecting system");
        self.pending = Some(request.clone());
        self.load = LoadState::Loading;
        cmds.push(Command::Persist);
        cmds.push(Command::FetchGames(request));
    }

    fn games_loaded(
        &mut self,
        request: GamesRequest,
        result: Result<Vec<Game>, FetchError>,
        cmds: &mut Vec<Command>,
    ) {
        if self.pending.as_ref() != Some(&request) {
            debug!(
                system = %request.system,
                generation = request.generation,
                "discarding stale games response"
            );
            return;
        }
        self.pending = None;
        match result {
            Ok(games) => {
                info!(system = %request.system, count = games.len(), "games loaded");
                self.games = games;
                self.load = LoadState::Loaded;
            }
            Err(e) => {
                warn!(system = %request.system, error = %e, detail = %e.detail(), "failed to load games");
                self.games = Vec::new();
                self.load = LoadState::Failed(e.to_string());
            }
        }
        self.games_system = Some(request.system);
        self.clamp_stored_page(cmds);
        self.probe_page(cmds);
    }

    fn filters_changed(&mut self, cmds: &mut Vec<Command>) {
        self.prefs.games.page = 1;
        cmds.push(Command::Persist);
        self.probe_page(cmds);
    }

    fn go_to_page(&mut self, page: u32, cmds: &mut Vec<Command>) {
        let total = pipeline::filter_sorted(&self.games, &self.prefs.games).len();
        let page = pipeline::clamp_page(page, total, self.prefs.games.page_size);
        if page == self.prefs.games.page {
            return;
        }
        self.prefs.games.page = page;
        cmds.push(Command::Persist);
        self.probe_page(cmds);
    }

    fn clamp_stored_page(&mut self, cmds: &mut Vec<Command>) {
        let total = pipeline::filter_sorted(&self.games, &self.prefs.games).len();
        let page = pipeline::clamp_page(self.prefs.games.page, total, self.prefs.games.page_size);
        if page != self.prefs.games.page {
            self.prefs.games.page = page;
            cmds.push(Command::Persist);
        }
    }

    /// Queue existence checks for the media of every game on the current page.
    fn probe_page(&mut self, cmds: &mut Vec<Command>) {
        let Some(system) = self.games_system.as_deref() else {
            return;
        };
        let visible = pipeline::derive_visible(&self.games, &self.prefs.games);
        for game in visible.page_items.iter().filter(|g| !g.id.is_empty()) {
            for kind in MediaKind::all() {
                let url = api::media(system, &game.id, *kind);
                if self.probes.begin(&url) {
                    cmds.push(Command::Probe { url });
                }
            }
        }
    }

    fn open_detail(
        &mut self,
        game: Game,
        source: DetailSource,
        system: Option<String>,
        cmds: &mut Vec<Command>,
    ) {
        let view = DetailView::from_game(&game, source, system.as_deref());
        for url in view.probe_urls() {
            if self.probes.begin(url) {
                cmds.push(Command::Probe {
                    url: url.to_string(),
                });
            }
        }
        self.detail = Some(OpenDetail {
            game,
            source,
            system,
        });
    }

    fn apply_live(&mut self, event: LiveEvent) {
        match &event {
            LiveEvent::Playing(np) => self.dock.set_running(Some(&np.system_name)),
            LiveEvent::Idle => self.dock.set_running(None),
            LiveEvent::Unreachable => {}
        }
        self.live = event;
    }

    pub fn nav_title(&self) -> Option<String> {
        let system = self.games_system.as_deref()?;
        let title = self
            .dock
            .system(system)
            .map(System::display_name)
            .filter(|t| !t.is_empty())
            .unwrap_or(system);
        Some(format!("{title} - {} games", visible_count(&self.games)))
    }

    pub fn frame(&self) -> Frame {
        let prefs = &self.prefs.games;
        let visible = pipeline::derive_visible(&self.games, prefs);
        let system = self.games_system.as_deref().unwrap_or_default();
        let items = visible
            .page_items
            .iter()
            .map(|g| {
                let badge = |kind| !g.id.is_empty() && self.probes.is_available(&api::media(system, &g.id, kind));
                CardView {
                    name: g.name.clone(),
                    cover: g.cover().map(str::to_string),
                    year: g.year,
                    genre: g.genre.clone(),
                    playcount: g.playcount,
                    favorite: g.favorite,
                    cheevos: g.has_cheevos,
                    launch_path: g.launch_path(),
                    has_manual: badge(MediaKind::Manual),
                    has_map: badge(MediaKind::Map),
                    attributes: card_attributes(g),
                }
            })
            .collect();
        let mut shown_prefs = prefs.clone();
        shown_prefs.page = visible.page;

        let sys = &self.prefs.systems;
        Frame {
            nav_title: self.nav_title(),
            systems_error: self.systems_error.clone(),
            games: GamesFrame {
                load: self.load.clone(),
                prefs: shown_prefs,
                items,
                summary: PageSummary::new(visible.total, visible.page, prefs.page_size),
            },
            dock: dock_frame(&self.dock, sys),
            picker: self.picker.as_ref().map(|filter| PickerFrame {
                filter: filter.clone(),
                items: self.dock.picker_items(filter),
            }),
            detail: self.detail.as_ref().map(|d| {
                DetailView::from_game(&d.game, d.source, d.system.as_deref())
                    .resolve_media(&self.probes)
            }),
            live: LiveStatus::from(&self.live),
        }
    }
}

fn dock_frame(dock: &DockState, prefs: &SystemPrefs) -> DockFrame {
    DockFrame {
        items: dock.items(prefs),
        filter: prefs.filter.clone(),
        sort: prefs.sort,
        zoom: prefs.zoom,
        item_height: item_height(prefs.zoom),
        scrollbars: prefs.scrollbars,
        scroll: dock.scroll(),
    }
}
