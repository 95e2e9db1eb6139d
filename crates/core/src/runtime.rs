//! Wires [`AppState`] to persistence and to a host that renders frames and
//! runs commands.

use tracing::debug;

use crate::app::{AppState, Command, Frame, Msg};
use crate::prefs::{KeyValueStore, PreferenceStore};

/// The integration surface a page (or a native shell) implements.
pub trait Host {
    /// Draw the page. Called exactly once per dispatched message.
    fn render(&mut self, frame: &Frame);
    /// Run a side effect. Results come back later through
    /// [`Runtime::dispatch`]. `Command::Persist` never reaches the host.
    fn execute(&mut self, cmd: Command);
}

pub struct Runtime<S, H> {
    state: AppState,
    prefs: PreferenceStore<S>,
    host: H,
}

impl<S: KeyValueStore, H: Host> Runtime<S, H> {
    /// Load preferences, render the first frame and issue startup commands.
    pub fn start(store: S, host: H, seed: u64) -> Self {
        let mut prefs = PreferenceStore::new(store);
        let state = AppState::new(prefs.load(), seed);
        let mut rt = Self { state, prefs, host };
        rt.host.render(&rt.state.frame());
        for cmd in AppState::init() {
            rt.host.execute(cmd);
        }
        rt
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (next, cmds) = state.update(msg);
        self.state = next;

        let (persist, effects): (Vec<Command>, Vec<Command>) =
            cmds.into_iter().partition(|c| *c == Command::Persist);
        if !persist.is_empty() {
            self.prefs.save(self.state.prefs());
        }
        self.host.render(&self.state.frame());
        debug!(effects = effects.len(), "dispatched");
        for cmd in effects {
            self.host.execute(cmd);
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn store(&self) -> &S {
        self.prefs.store()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Intent;
    use crate::prefs::{MemoryStore, GAMES_KEY};

    #[derive(Default)]
    struct Recorder {
        frames: usize,
        executed: Vec<Command>,
    }

    impl Host for Recorder {
        fn render(&mut self, _frame: &Frame) {
            self.frames += 1;
        }
        fn execute(&mut self, cmd: Command) {
            self.executed.push(cmd);
        }
    }

    #[test]
    fn start_renders_and_fetches_systems() {
        let rt = Runtime::start(MemoryStore::new(), Recorder::default(), 3);
        assert_eq!(rt.host().frames, 1);
        assert_eq!(rt.host().executed, [Command::FetchSystems]);
    }

    #[test]
    fn persist_is_handled_not_forwarded() {
        let mut rt = Runtime::start(MemoryStore::new(), Recorder::default(), 3);
        rt.dispatch(Msg::Intent(Intent::SetQuery {
            query: "zel".into(),
        }));
        assert_eq!(rt.host().frames, 2);
        assert!(!rt.host().executed.contains(&Command::Persist));
        let saved = rt.store().get(GAMES_KEY).unwrap();
        assert!(saved.contains("\"query\":\"zel\""));
    }
}
