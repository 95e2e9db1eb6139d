use std::time::Duration;

/// Where the EmulationStation web server lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Origin of the web server, e.g. `http://batocera.local:1234`.
    pub base_url: String,
    /// Budget for `/systems` and per-system game list downloads.
    pub games_timeout: Duration,
    /// Budget for a media existence probe.
    pub probe_timeout: Duration,
    /// Budget for action endpoints (launch, reload, kill).
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234".to_string(),
            games_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Resolve a server path (or pass an absolute URL through).
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
