//! Async host: runs [`Runtime`] on a tokio task and executes its commands
//! against an [`HttpBackend`].
//!
//! Messages are processed one at a time in arrival order. Command results
//! re-enter the same queue, so a slow response can arrive after a newer one;
//! the core discards it by generation.

use std::time::Duration;

use esweb::app::{Command, Frame, Intent, Msg, AUTO_SELECT_DELAY_MS};
use esweb::model::visible_count;
use esweb::prefs::KeyValueStore;
use esweb::runtime::{Host, Runtime};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::HttpBackend;

/// Page-side effects with no native equivalent, surfaced to the embedder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CopyToClipboard(String),
    FocusSearch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Increments once per render.
    pub seq: u64,
    pub frame: Frame,
}

struct ChannelHost {
    backend: HttpBackend,
    /// Weak so the session ends once every [`SessionHandle`] is dropped.
    inbox: mpsc::WeakUnboundedSender<Msg>,
    frames: watch::Sender<Option<Rendered>>,
    effects: mpsc::UnboundedSender<Effect>,
    seq: u64,
    auto_select: bool,
}

impl ChannelHost {
    fn spawn<F>(&self, fut: F)
    where
        F: std::future::Future<Output = Option<Msg>> + Send + 'static,
    {
        let inbox = self.inbox.clone();
        tokio::spawn(async move {
            if let Some(msg) = fut.await {
                // The session may have shut down meanwhile.
                if let Some(inbox) = inbox.upgrade() {
                    let _ = inbox.send(msg);
                }
            }
        });
    }
}

impl Host for ChannelHost {
    fn render(&mut self, frame: &Frame) {
        self.seq += 1;
        self.frames.send_replace(Some(Rendered {
            seq: self.seq,
            frame: frame.clone(),
        }));
    }

    fn execute(&mut self, cmd: Command) {
        debug!(?cmd, "execute");
        let backend = self.backend.clone();
        match cmd {
            Command::FetchSystems => {
                let inbox = self.inbox.clone();
                let auto_select = self.auto_select;
                self.spawn(async move {
                    let result = backend.systems().await;
                    if result.is_ok() && auto_select {
                        tokio::spawn(async move {
                            tokio::time::sleep(Duration::from_millis(AUTO_SELECT_DELAY_MS as u64))
                                .await;
                            if let Some(inbox) = inbox.upgrade() {
                                let _ = inbox.send(Intent::AutoSelect.into());
                            }
                        });
                    }
                    Some(Msg::SystemsLoaded(result))
                });
            }
            Command::FetchGames(request) => self.spawn(async move {
                let result = backend.games(&request.system).await;
                Some(Msg::GamesLoaded { request, result })
            }),
            Command::FetchCount { system } => self.spawn(async move {
                let result = backend.games(&system).await.map(|g| visible_count(&g));
                Some(Msg::CountLoaded { system, result })
            }),
            Command::FetchRandomPool { system } => self.spawn(async move {
                let result = backend.games(&system).await;
                Some(Msg::RandomPoolLoaded { system, result })
            }),
            Command::Probe { url } => self.spawn(async move {
                let exists = backend.probe(&url).await;
                Some(Msg::ProbeResult { url, exists })
            }),
            Command::Launch { path } => self.spawn(async move {
                if let Err(e) = backend.launch(&path).await {
                    warn!(%path, error = %e.detail(), "launch failed");
                }
                None
            }),
            Command::ReloadGames => self.spawn(async move {
                if let Err(e) = backend.reload_games().await {
                    warn!(error = %e.detail(), "reload request failed");
                }
                None
            }),
            Command::KillEmulator => self.spawn(async move {
                if let Err(e) = backend.kill_emulator().await {
                    warn!(error = %e.detail(), "emukill request failed");
                }
                None
            }),
            Command::CopyToClipboard { text } => {
                let _ = self.effects.send(Effect::CopyToClipboard(text));
            }
            Command::FocusSearch => {
                let _ = self.effects.send(Effect::FocusSearch);
            }
            Command::Persist => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub seed: u64,
    /// Select the first dock system shortly after systems arrive.
    pub auto_select: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            auto_select: true,
        }
    }
}

/// Handle to a running session. Dropping every handle stops the task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inbox: mpsc::UnboundedSender<Msg>,
    frames: watch::Receiver<Option<Rendered>>,
}

pub struct Session {
    pub handle: SessionHandle,
    pub effects: mpsc::UnboundedReceiver<Effect>,
    pub task: JoinHandle<()>,
}

impl Session {
    /// Spawn the runtime on the current tokio runtime.
    pub fn start<S>(backend: HttpBackend, store: S, options: SessionOptions) -> Session
    where
        S: KeyValueStore + Send + 'static,
    {
        let (inbox, mut rx) = mpsc::unbounded_channel();
        let (frames_tx, frames) = watch::channel(None);
        let (effects_tx, effects) = mpsc::unbounded_channel();

        let host = ChannelHost {
            backend,
            inbox: inbox.downgrade(),
            frames: frames_tx,
            effects: effects_tx,
            seq: 0,
            auto_select: options.auto_select,
        };

        let task = tokio::spawn(async move {
            let mut rt = Runtime::start(store, host, options.seed);
            info!("session started");
            while let Some(msg) = rx.recv().await {
                rt.dispatch(msg);
            }
            info!("session stopped");
        });

        Session {
            handle: SessionHandle { inbox, frames },
            effects,
            task,
        }
    }
}

impl SessionHandle {
    /// Queue a message. Returns false once the session has stopped.
    pub fn send(&self, msg: impl Into<Msg>) -> bool {
        self.inbox.send(msg.into()).is_ok()
    }

    pub fn frames(&self) -> watch::Receiver<Option<Rendered>> {
        self.frames.clone()
    }

    pub fn latest(&self) -> Option<Rendered> {
        self.frames.borrow().clone()
    }

    /// Wait until a rendered frame satisfies `pred`, or `timeout` passes.
    pub async fn wait_for(
        &self,
        timeout: Duration,
        mut pred: impl FnMut(&Frame) -> bool,
    ) -> Option<Frame> {
        let mut rx = self.frames.clone();
        let wait = rx.wait_for(|r| r.as_ref().is_some_and(|r| pred(&r.frame)));
        let frame = match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(r)) => r.as_ref().map(|r| r.frame.clone()),
            _ => None,
        };
        frame
    }
}
