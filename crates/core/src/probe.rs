//! Memo of media existence checks, keyed by URL.
//!
//! A URL is probed at most once per session. Failures of any kind (timeout,
//! non-2xx, network) are recorded as unavailable and never retried.

use hashbrown::HashMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Pending,
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Default)]
pub struct ProbeCache {
    entries: HashMap<String, Availability>,
}

impl ProbeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<Availability> {
        self.entries.get(url).copied()
    }

    /// Whether `url` still has to be probed. Marks it pending when so, so a
    /// second caller in the same tick does not issue a duplicate request.
    pub fn begin(&mut self, url: &str) -> bool {
        if self.entries.contains_key(url) {
            return false;
        }
        self.entries.insert(url.to_string(), Availability::Pending);
        true
    }

    pub fn record(&mut self, url: &str, exists: bool) {
        let state = if exists {
            Availability::Available
        } else {
            Availability::Unavailable
        };
        self.entries.insert(url.to_string(), state);
    }

    pub fn is_available(&self, url: &str) -> bool {
        self.get(url) == Some(Availability::Available)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_once_per_url() {
        let mut cache = ProbeCache::new();
        assert!(cache.begin("/m"));
        assert!(!cache.begin("/m"));
        assert_eq!(cache.get("/m"), Some(Availability::Pending));
        assert!(!cache.is_available("/m"));

        cache.record("/m", false);
        assert!(!cache.begin("/m"));
        assert_eq!(cache.get("/m"), Some(Availability::Unavailable));

        cache.record("/n", true);
        assert!(cache.is_available("/n"));
        assert_eq!(cache.len(), 2);
    }
}
