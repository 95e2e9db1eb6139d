use std::cell::Cell;
use std::rc::Rc;

use esweb::error::FetchError;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// Budget for list downloads (systems, games, counts).
pub(super) const LIST_TIMEOUT_MS: i32 = 10_000;
/// Budget for a media existence probe.
pub(super) const PROBE_TIMEOUT_MS: i32 = 1_000;

struct Reply {
    status: u16,
    body: Option<String>,
}

/// Aborts a request after a delay. Must be finished before it is dropped.
struct Deadline {
    handle: i32,
    fired: Rc<Cell<bool>>,
    _cb: Closure<dyn FnMut()>,
}

impl Deadline {
    fn start(
        window: &web_sys::Window,
        controller: web_sys::AbortController,
        ms: i32,
    ) -> Result<Self, FetchError> {
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let cb = Closure::wrap(Box::new(move || {
            flag.set(true);
            controller.abort();
        }) as Box<dyn FnMut()>);
        let handle = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), ms)
            .map_err(js_network)?;
        Ok(Self {
            handle,
            fired,
            _cb: cb,
        })
    }

    /// Cancel the timer; true if it already fired.
    fn finish(self, window: &web_sys::Window) -> bool {
        window.clear_timeout_with_handle(self.handle);
        self.fired.get()
    }
}

fn js_network(e: JsValue) -> FetchError {
    FetchError::Network(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

async fn send(
    method: &str,
    url: &str,
    body: Option<(&str, &str)>,
    timeout_ms: Option<i32>,
    read_body: bool,
) -> Result<Reply, FetchError> {
    let window = web_sys::window().ok_or_else(|| FetchError::Network("no window".into()))?;

    let init = web_sys::RequestInit::new();
    init.set_method(method);
    if let Some((content_type, payload)) = body {
        let headers = web_sys::Headers::new().map_err(js_network)?;
        headers.set("Content-Type", content_type).map_err(js_network)?;
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(payload));
    }

    let deadline = match timeout_ms {
        Some(ms) => {
            let controller = web_sys::AbortController::new().map_err(js_network)?;
            init.set_signal(Some(&controller.signal()));
            Some(Deadline::start(&window, controller, ms)?)
        }
        None => None,
    };

    let request = web_sys::Request::new_with_str_and_init(url, &init).map_err(js_network);
    let outcome = match request {
        Ok(request) => read(&window, &request, read_body).await,
        Err(e) => Err(e),
    };

    let timed_out = deadline.is_some_and(|d| d.finish(&window));
    match outcome {
        Err(_) if timed_out => Err(FetchError::Timeout),
        other => other,
    }
}

async fn read(
    window: &web_sys::Window,
    request: &web_sys::Request,
    read_body: bool,
) -> Result<Reply, FetchError> {
    let value = JsFuture::from(window.fetch_with_request(request))
        .await
        .map_err(js_network)?;
    let response: web_sys::Response = value
        .dyn_into()
        .map_err(|_| FetchError::Decode("not a Response".into()))?;
    let status = response.status();
    if !read_body || !response.ok() {
        return Ok(Reply { status, body: None });
    }
    let text = JsFuture::from(response.text().map_err(js_network)?)
        .await
        .map_err(js_network)?;
    let body = text
        .as_string()
        .ok_or_else(|| FetchError::Decode("body is not text".into()))?;
    Ok(Reply {
        status,
        body: Some(body),
    })
}

/// GET a body; non-2xx statuses are errors.
pub(super) async fn fetch_text(url: &str) -> Result<String, FetchError> {
    let reply = send("GET", url, None, Some(LIST_TIMEOUT_MS), true).await?;
    match reply.body {
        Some(body) => Ok(body),
        None => Err(FetchError::Status(reply.status)),
    }
}

/// HEAD `url`; any failure counts as "does not exist".
pub(super) async fn fetch_exists(url: &str) -> bool {
    match send("HEAD", url, None, Some(PROBE_TIMEOUT_MS), false).await {
        Ok(reply) => (200..300).contains(&reply.status),
        Err(_) => false,
    }
}

/// Fire-and-forget GET for action endpoints.
pub(super) async fn fetch_action(url: &str) -> Result<u16, FetchError> {
    send("GET", url, None, None, false)
        .await
        .map(|reply| reply.status)
}

pub(super) async fn fetch_post(url: &str, content_type: &str, body: &str) -> Result<u16, FetchError> {
    send("POST", url, Some((content_type, body)), None, false)
        .await
        .map(|reply| reply.status)
}
