use std::rc::Weak;

use esweb::api;
use esweb::app::{Command, Frame, Intent, Msg, AUTO_SELECT_DELAY_MS};
use esweb::model::{parse_games, parse_systems, visible_count};
use esweb::runtime::Host;
use tracing::{debug, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use super::{fetch, Shared};
use crate::ui_model;

/// Executes commands against the page's origin and hands frames to JS.
pub(crate) struct BrowserHost {
    render: js_sys::Function,
    on_effect: Option<js_sys::Function>,
    shared: Weak<Shared>,
}

impl BrowserHost {
    pub(super) fn new(
        render: js_sys::Function,
        on_effect: Option<js_sys::Function>,
        shared: Weak<Shared>,
    ) -> Self {
        Self {
            render,
            on_effect,
            shared,
        }
    }

    /// Run `fut` and feed its message back into the app, if it still exists.
    fn spawn<F>(&self, fut: F)
    where
        F: std::future::Future<Output = Option<Msg>> + 'static,
    {
        let shared = self.shared.clone();
        spawn_local(async move {
            if let Some(msg) = fut.await {
                if let Some(shared) = shared.upgrade() {
                    Shared::dispatch(&shared, msg);
                }
            }
        });
    }

    /// Page-side effects the core cannot perform itself.
    fn effect(&self, cmd: &Command) {
        let Some(cb) = &self.on_effect else {
            debug!(?cmd, "no effect handler");
            return;
        };
        match to_js(cmd) {
            Ok(value) => {
                if let Err(e) = cb.call1(&JsValue::NULL, &value) {
                    warn!(error = ?e, "effect handler threw");
                }
            }
            Err(e) => warn!(error = ?e, "failed to hand effect to page"),
        }
    }
}

pub(super) fn schedule_auto_select(shared: Weak<Shared>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let cb = Closure::once(move || {
        if let Some(shared) = shared.upgrade() {
            Shared::dispatch(&shared, Intent::AutoSelect.into());
        }
    });
    match window.set_timeout_with_callback_and_timeout_and_arguments_0(
        cb.as_ref().unchecked_ref(),
        AUTO_SELECT_DELAY_MS as i32,
    ) {
        Ok(_) => cb.forget(),
        Err(e) => warn!(error = ?e, "failed to schedule auto-select"),
    }
}

/// Hand a serializable value to JS as a plain object.
pub(super) fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&json)
}

impl Host for BrowserHost {
    fn render(&mut self, frame: &Frame) {
        let text = ui_model::frame_text(frame);
        let (frame, text) = match (to_js(frame), to_js(&text)) {
            (Ok(frame), Ok(text)) => (frame, text),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = ?e, "failed to encode frame");
                return;
            }
        };
        if let Err(e) = self.render.call2(&JsValue::NULL, &frame, &text) {
            warn!(error = ?e, "render callback threw");
        }
    }

    fn execute(&mut self, cmd: Command) {
        debug!(?cmd, "execute");
        match cmd {
            Command::FetchSystems => {
                let shared = self.shared.clone();
                self.spawn(async move {
                    let result = fetch::fetch_text(api::SYSTEMS)
                        .await
                        .and_then(|body| parse_systems(&body));
                    if result.is_ok() {
                        schedule_auto_select(shared);
                    }
                    Some(Msg::SystemsLoaded(result))
                });
            }
            Command::FetchGames(request) => self.spawn(async move {
                let result = fetch::fetch_text(&api::games(&request.system))
                    .await
                    .and_then(|body| parse_games(&body));
                Some(Msg::GamesLoaded { request, result })
            }),
            Command::FetchCount { system } => self.spawn(async move {
                let result = fetch::fetch_text(&api::games(&system))
                    .await
                    .and_then(|body| parse_games(&body))
                    .map(|games| visible_count(&games));
                Some(Msg::CountLoaded { system, result })
            }),
            Command::FetchRandomPool { system } => self.spawn(async move {
                let result = fetch::fetch_text(&api::games(&system))
                    .await
                    .and_then(|body| parse_games(&body));
                Some(Msg::RandomPoolLoaded { system, result })
            }),
            Command::Probe { url } => self.spawn(async move {
                let exists = fetch::fetch_exists(&url).await;
                Some(Msg::ProbeResult { url, exists })
            }),
            Command::Launch { path } => self.spawn(async move {
                let body = api::launch_body(&path);
                if let Err(e) = fetch::fetch_post(api::LAUNCH, api::LAUNCH_CONTENT_TYPE, &body).await {
                    warn!(error = %e, "launch failed");
                }
                None
            }),
            Command::ReloadGames => self.spawn(async {
                if let Err(e) = fetch::fetch_action(api::RELOAD_GAMES).await {
                    warn!(error = %e, "reload request failed");
                }
                None
            }),
            Command::KillEmulator => self.spawn(async {
                if let Err(e) = fetch::fetch_action(api::EMU_KILL).await {
                    warn!(error = %e, "emukill request failed");
                }
                None
            }),
            cmd @ (Command::CopyToClipboard { .. } | Command::FocusSearch) => self.effect(&cmd),
            // Handled by the runtime before commands reach the host.
            Command::Persist => {}
        }
    }
}
