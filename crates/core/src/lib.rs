//! # esweb
//!
//! Client-side core for the Batocera EmulationStation web interface.
//!
//! The crate is pure: no I/O, no clocks, no threads. It builds for native
//! targets and `wasm32` alike. Hosts (the browser page, the native session)
//! feed it [`app::Msg`]s and execute the [`app::Command`]s it returns.
//!
//! ## Modules
//!
//! - [`model`]: game and system records, normalized at ingestion
//! - [`prefs`]: persisted preferences and the key-value port
//! - [`pipeline`]: hide, filter, sort and paginate the game list
//! - [`dock`]: the systems dock
//! - [`detail`]: the game detail overlay
//! - [`live`]: the "now playing" feed
//! - [`app`] / [`runtime`]: the state container and its host wiring

pub mod api;
pub mod app;
pub mod collate;
pub mod detail;
pub mod dock;
pub mod error;
pub mod live;
pub mod model;
pub mod pipeline;
pub mod prefs;
pub mod prng;
pub mod probe;
pub mod runtime;

/// Prelude module for convenient imports.
///
/// ```
/// use esweb::prelude::*;
/// ```
pub mod prelude {
    pub use crate::app::{AppState, Command, Frame, GamesRequest, Intent, LoadState, Msg};
    pub use crate::error::FetchError;
    pub use crate::model::{Game, System};
    pub use crate::prefs::{
        GamePrefs, GameSort, KeyValueStore, MemoryStore, PageSize, PreferenceStore, Preferences,
        StoreError, SystemPrefs, SystemSort,
    };
    pub use crate::runtime::{Host, Runtime};
}
