use std::sync::Arc;
use std::time::Duration;

use esweb::api;
use esweb::error::FetchError;
use esweb::model::{parse_games, parse_systems, Game, System};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::Result;

/// Typed access to the EmulationStation web server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: Arc<ClientConfig>,
}

fn fetch_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = e.status() {
        FetchError::Status(status.as_u16())
    } else if e.is_decode() {
        FetchError::Decode(e.to_string())
    } else {
        FetchError::Network(e.to_string())
    }
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("esweb/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn get_text(&self, path: &str, timeout: Duration) -> std::result::Result<String, FetchError> {
        let url = self.config.url(path);
        debug!(%url, "GET");
        let resp = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(fetch_error)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        resp.text().await.map_err(fetch_error)
    }

    pub async fn systems(&self) -> std::result::Result<Vec<System>, FetchError> {
        let body = self.get_text(api::SYSTEMS, self.config.games_timeout).await?;
        parse_systems(&body)
    }

    pub async fn games(&self, system: &str) -> std::result::Result<Vec<Game>, FetchError> {
        let body = self
            .get_text(&api::games(system), self.config.games_timeout)
            .await?;
        parse_games(&body)
    }

    /// Raw logo image bytes for `system`.
    pub async fn logo(&self, system: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let resp = self
            .client
            .get(self.config.url(&api::logo(system)))
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(fetch_error)?;
        ensure_success(resp.status())?;
        let bytes = resp.bytes().await.map_err(fetch_error)?;
        Ok(bytes.to_vec())
    }

    /// HEAD probe; anything but a 2xx within the probe budget is "absent".
    pub async fn probe(&self, path: &str) -> bool {
        let url = self.config.url(path);
        match self
            .client
            .head(&url)
            .timeout(self.config.probe_timeout)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(%url, error = %e, "probe failed");
                false
            }
        }
    }

    pub async fn launch(&self, path: &str) -> std::result::Result<(), FetchError> {
        let resp = self
            .client
            .post(self.config.url(api::LAUNCH))
            .header(reqwest::header::CONTENT_TYPE, api::LAUNCH_CONTENT_TYPE)
            .body(api::launch_body(path))
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(fetch_error)?;
        ensure_success(resp.status())
    }

    pub async fn reload_games(&self) -> std::result::Result<(), FetchError> {
        self.trigger(api::RELOAD_GAMES).await
    }

    pub async fn kill_emulator(&self) -> std::result::Result<(), FetchError> {
        self.trigger(api::EMU_KILL).await
    }

    async fn trigger(&self, path: &str) -> std::result::Result<(), FetchError> {
        let resp = self
            .client
            .get(self.config.url(path))
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(fetch_error)?;
        ensure_success(resp.status())
    }
}

fn ensure_success(status: reqwest::StatusCode) -> std::result::Result<(), FetchError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::Status(status.as_u16()))
    }
}
