//! Native host for the esweb client core.
//!
//! [`HttpBackend`] talks to an EmulationStation web server, [`FileStore`]
//! keeps preferences on disk, and [`Session`] drives the core's runtime on a
//! tokio task.

pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod paths;
pub mod session;
pub mod store;

pub use backend::HttpBackend;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use paths::AppPaths;
pub use session::{Effect, Rendered, Session, SessionHandle, SessionOptions};
pub use store::FileStore;
