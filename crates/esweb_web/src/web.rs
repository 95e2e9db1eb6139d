//! wasm-bindgen surface used by the host page.
//!
//! The page builds an [`EswebApp`] with a render callback, then forwards user
//! events to it. Every state change produces one call to the render callback
//! with the current frame and its display text as plain JS objects.

mod fetch;
mod host;
mod logging;
mod socket;
mod storage;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use esweb::api;
use esweb::app::{Intent, Msg};
use esweb::detail::CardAttributes;
use esweb::runtime::Runtime;
use tracing::{info, warn};

use crate::ui_model;
use wasm_bindgen::prelude::*;

use host::BrowserHost;
use socket::LiveSocket;
use storage::LocalStorage;

type AppRuntime = Runtime<LocalStorage, BrowserHost>;

/// State shared between the exported handle and in-flight callbacks.
pub(crate) struct Shared {
    runtime: RefCell<Option<AppRuntime>>,
    queue: RefCell<VecDeque<Msg>>,
    socket: RefCell<Option<LiveSocket>>,
}

impl Shared {
    /// Queue `msg` and process the queue unless a dispatch is already
    /// running further up the stack, in which case that one drains it.
    pub(crate) fn dispatch(this: &Rc<Self>, msg: Msg) {
        this.queue.borrow_mut().push_back(msg);
        Self::drain(this);
    }

    fn drain(this: &Rc<Self>) {
        loop {
            let Ok(mut slot) = this.runtime.try_borrow_mut() else {
                return;
            };
            let Some(rt) = slot.as_mut() else {
                return;
            };
            let Some(next) = this.queue.borrow_mut().pop_front() else {
                return;
            };
            rt.dispatch(next);
        }
    }
}

fn seed() -> u64 {
    let now = js_sys::Date::now() as u64;
    let noise = (js_sys::Math::random() * u32::MAX as f64) as u64;
    now ^ (noise << 32)
}

fn default_live_url() -> Option<String> {
    let location = web_sys::window()?.location();
    let protocol = location.protocol().ok()?;
    let host = location.host().ok()?;
    Some(api::live_feed_url(&protocol, &host))
}

#[wasm_bindgen]
pub struct EswebApp {
    shared: Rc<Shared>,
    render: js_sys::Function,
    on_effect: Option<js_sys::Function>,
    live_url: Option<String>,
}

#[wasm_bindgen]
impl EswebApp {
    /// `render(frame, text)` draws the page. `on_effect(cmd)` handles
    /// clipboard and focus requests. `live_url` overrides the now-playing socket address.
    #[wasm_bindgen(constructor)]
    pub fn new(
        render: js_sys::Function,
        on_effect: Option<js_sys::Function>,
        live_url: Option<String>,
    ) -> EswebApp {
        logging::init();
        EswebApp {
            shared: Rc::new(Shared {
                runtime: RefCell::new(None),
                queue: RefCell::new(VecDeque::new()),
                socket: RefCell::new(None),
            }),
            render,
            on_effect,
            live_url,
        }
    }

    /// Load preferences, draw the first frame, fetch systems and open the
    /// live feed. Calling it again is a no-op.
    pub fn start(&self) {
        if self.shared.runtime.borrow().is_some() {
            return;
        }
        let host = BrowserHost::new(
            self.render.clone(),
            self.on_effect.clone(),
            Rc::downgrade(&self.shared),
        );
        let rt = Runtime::start(LocalStorage, host, seed());
        *self.shared.runtime.borrow_mut() = Some(rt);
        info!("esweb started");

        self.connect_live_feed();

        // Messages posted by the page while the first frame was drawn.
        Shared::drain(&self.shared);
    }

    fn connect_live_feed(&self) {
        let url = self.live_url.clone().or_else(default_live_url);
        let Some(url) = url else {
            Shared::dispatch(&self.shared, Msg::LiveClosed);
            return;
        };

        let on_message = {
            let shared = Rc::downgrade(&self.shared);
            move |text: String| {
                if let Some(shared) = shared.upgrade() {
                    Shared::dispatch(&shared, Msg::LiveMessage(text));
                }
            }
        };
        let on_close = {
            let shared = Rc::downgrade(&self.shared);
            move || {
                if let Some(shared) = shared.upgrade() {
                    Shared::dispatch(&shared, Msg::LiveClosed);
                }
            }
        };

        match LiveSocket::connect(&url, on_message, on_close) {
            Ok(socket) => *self.shared.socket.borrow_mut() = Some(socket),
            Err(e) => {
                warn!(%url, error = ?e, "live feed unavailable");
                Shared::dispatch(&self.shared, Msg::LiveClosed);
            }
        }
    }

    /// Post an intent as JSON, e.g. `{"type":"setSort","sort":"year-desc"}`.
    pub fn dispatch(&self, intent_json: &str) -> Result<(), JsValue> {
        let intent: Intent = serde_json::from_str(intent_json)
            .map_err(|e| JsValue::from_str(&format!("invalid intent: {e}")))?;
        Shared::dispatch(&self.shared, intent.into());
        Ok(())
    }

    /// Option inventories (sorts, page sizes, views, filters) with their
    /// display labels.
    pub fn labels(&self) -> Result<JsValue, JsValue> {
        host::to_js(&ui_model::labels())
    }

    pub fn select_system(&self, name: &str) {
        Shared::dispatch(
            &self.shared,
            Intent::SelectSystem {
                name: name.to_string(),
            }
            .into(),
        );
    }

    pub fn set_query(&self, query: &str) {
        Shared::dispatch(
            &self.shared,
            Intent::SetQuery {
                query: query.to_string(),
            }
            .into(),
        );
    }

    /// Open the detail overlay from a card's `data-*` attributes.
    pub fn open_card_detail(&self, card: &web_sys::Element) {
        let mut attributes = CardAttributes::new();
        for name in card.get_attribute_names().iter() {
            let Some(name) = name.as_string() else {
                continue;
            };
            let Some(key) = name.strip_prefix("data-") else {
                continue;
            };
            if let Some(value) = card.get_attribute(&name) {
                attributes.insert(key.to_string(), value);
            }
        }
        Shared::dispatch(&self.shared, Intent::OpenCardDetail { attributes }.into());
    }

    /// Returns true when the key was consumed and the page should call
    /// `preventDefault`.
    pub fn key_down(&self, key: &str, ctrl: bool, meta: bool, in_input: bool) -> bool {
        match Msg::from_key(key, ctrl, meta, in_input) {
            Some(msg) => {
                Shared::dispatch(&self.shared, msg);
                true
            }
            None => false,
        }
    }
}
