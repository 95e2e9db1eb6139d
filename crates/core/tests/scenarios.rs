//! End-to-end scenarios driven through `Runtime` with an in-memory store and a
//! host that records what it is asked to do.

use esweb::prelude::*;
use esweb::prefs::{GAMES_KEY, SYSTEMS_KEY};

#[derive(Default)]
struct RecordingHost {
    frames: Vec<Frame>,
    executed: Vec<Command>,
}

impl RecordingHost {
    fn last_frame(&self) -> &Frame {
        self.frames.last().expect("at least one frame")
    }

    fn take_fetches(&mut self) -> Vec<GamesRequest> {
        let (fetches, rest): (Vec<Command>, Vec<Command>) = self
            .executed
            .drain(..)
            .partition(|c| matches!(c, Command::FetchGames(_)));
        self.executed = rest;
        fetches
            .into_iter()
            .filter_map(|c| match c {
                Command::FetchGames(r) => Some(r),
                _ => None,
            })
            .collect()
    }
}

impl Host for RecordingHost {
    fn render(&mut self, frame: &Frame) {
        self.frames.push(frame.clone());
    }

    fn execute(&mut self, cmd: Command) {
        self.executed.push(cmd);
    }
}

fn systems() -> Vec<System> {
    esweb::model::parse_systems(
        r#"[{"name":"atari2600","fullname":"Atari 2600","visible":"true"},
            {"name":"snes","fullname":"Super Nintendo","visible":"true"},
            {"name":"gc","fullname":"GameCube","visible":"false"}]"#,
    )
    .unwrap()
}

fn snes_games() -> Vec<Game> {
    esweb::model::parse_games(
        r#"[{"name":"Zelda","hidden":"false","favorite":"true","playcount":"5"},
            {"name":"Mario","hidden":"false","favorite":"false","playcount":"0"},
            {"name":"Hidden","hidden":"true"}]"#,
    )
    .unwrap()
}

fn atari_games() -> Vec<Game> {
    esweb::model::parse_games(r#"[{"name":"Pitfall!"},{"name":"Adventure"}]"#).unwrap()
}

fn started(store: MemoryStore) -> Runtime<MemoryStore, RecordingHost> {
    let mut rt = Runtime::start(store, RecordingHost::default(), 11);
    rt.dispatch(Msg::SystemsLoaded(Ok(systems())));
    rt
}

fn names(frame: &Frame) -> Vec<&str> {
    frame.games.items.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn slow_first_selection_does_not_overwrite_second() {
    let mut rt = started(MemoryStore::new());

    rt.dispatch(Intent::SelectSystem { name: "atari2600".into() }.into());
    rt.dispatch(Intent::SelectSystem { name: "snes".into() }.into());
    let fetches = rt.host_mut().take_fetches();
    assert_eq!(fetches.len(), 2);
    let (slow_a, fast_b) = (fetches[0].clone(), fetches[1].clone());

    rt.dispatch(Msg::GamesLoaded {
        request: fast_b,
        result: Ok(snes_games()),
    });
    assert_eq!(names(rt.host().last_frame()), ["Mario", "Zelda"]);

    rt.dispatch(Msg::GamesLoaded {
        request: slow_a,
        result: Ok(atari_games()),
    });
    let frame = rt.host().last_frame();
    assert_eq!(names(frame), ["Mario", "Zelda"]);
    assert_eq!(frame.nav_title.as_deref(), Some("Super Nintendo - 2 games"));
    assert_eq!(rt.state().selected_system(), Some("snes"));
}

#[test]
fn unplayed_filter_leaves_mario() {
    let mut rt = started(MemoryStore::new());
    rt.dispatch(Intent::SelectSystem { name: "snes".into() }.into());
    let req = rt.host_mut().take_fetches().remove(0);
    rt.dispatch(Msg::GamesLoaded {
        request: req,
        result: Ok(snes_games()),
    });
    rt.dispatch(
        Intent::SetFilter {
            filter: esweb::app::FilterToggle::Unplayed,
            on: true,
        }
        .into(),
    );
    assert_eq!(names(rt.host().last_frame()), ["Mario"]);
}

#[test]
fn pinned_system_leads_the_dock() {
    let mut rt = started(MemoryStore::new());
    rt.dispatch(
        Intent::SetSystemSort {
            sort: SystemSort::PinnedFirst,
        }
        .into(),
    );
    rt.dispatch(
        Intent::SystemAction {
            name: "snes".into(),
            action: esweb::dock::DockAction::Pin,
        }
        .into(),
    );
    let dock: Vec<&str> = rt
        .host()
        .last_frame()
        .dock
        .items
        .iter()
        .map(|i| i.name.as_str())
        .collect();
    assert_eq!(dock, ["snes", "atari2600"]);
}

#[test]
fn preferences_survive_a_restart() {
    let mut rt = started(MemoryStore::new());
    rt.dispatch(Intent::SetQuery { query: "zel".into() }.into());
    rt.dispatch(
        Intent::SetPageSize {
            size: PageSize::All,
        }
        .into(),
    );
    rt.dispatch(Intent::Zoom { steps: 2 }.into());
    rt.dispatch(Intent::SelectSystem { name: "snes".into() }.into());
    let store = rt.store().clone();
    let games_bytes = store.get(GAMES_KEY);
    let systems_bytes = store.get(SYSTEMS_KEY);

    let rt = started(store);
    let prefs = rt.state().prefs();
    assert_eq!(prefs.games.query, "zel");
    assert_eq!(prefs.games.page_size, PageSize::All);
    assert_eq!(prefs.systems.zoom, 1.2);
    assert_eq!(prefs.systems.recent, ["snes"]);
    // Nothing changed, nothing rewritten differently.
    assert_eq!(rt.store().get(GAMES_KEY), games_bytes);
    assert_eq!(rt.store().get(SYSTEMS_KEY), systems_bytes);
}

#[test]
fn one_render_per_message() {
    let mut rt = started(MemoryStore::new());
    let before = rt.host().frames.len();
    rt.dispatch(Intent::SetQuery { query: "m".into() }.into());
    rt.dispatch(Msg::ProbeResult {
        url: "/x".into(),
        exists: false,
    });
    assert_eq!(rt.host().frames.len(), before + 2);
}
