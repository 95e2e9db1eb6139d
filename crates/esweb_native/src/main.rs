//! `esweb [BASE_URL] [SYSTEM]`
//!
//! Lists the systems of an EmulationStation web server, or the first page of
//! one system's games, using the same preferences as previous runs.

use std::time::Duration;

use esweb::app::{Intent, LoadState};
use esweb_native::{init_logging, AppPaths, ClientConfig, FileStore, HttpBackend, Session, SessionOptions};
use tracing::info;

const WAIT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(base_url) => ClientConfig::with_base_url(base_url),
        None => ClientConfig::default(),
    };
    let system = args.next();

    let paths = AppPaths::new()?;
    let store = FileStore::open(paths.prefs_file())?;
    info!(prefs = %store.path().display(), server = %config.base_url, "starting");

    let backend = HttpBackend::new(config)?;
    let options = SessionOptions {
        auto_select: false,
        ..SessionOptions::default()
    };
    let session = Session::start(backend, store, options);
    let handle = session.handle;

    let Some(frame) = handle
        .wait_for(WAIT, |f| !f.dock.items.is_empty() || f.systems_error.is_some())
        .await
    else {
        return Err("no response from server".into());
    };
    if let Some(err) = frame.systems_error {
        return Err(format!("systems unavailable: {err}").into());
    }

    let Some(system) = system else {
        for item in &frame.dock.items {
            let pin = if item.pinned { "*" } else { " " };
            println!("{pin} {:<16} {}", item.name, item.title);
        }
        return Ok(());
    };

    handle.send(Intent::SelectSystem { name: system });
    let Some(frame) = handle
        .wait_for(WAIT, |f| {
            matches!(f.games.load, LoadState::Loaded | LoadState::Failed(_))
        })
        .await
    else {
        return Err("games list timed out".into());
    };

    if let LoadState::Failed(reason) = &frame.games.load {
        return Err(format!("games unavailable: {reason}").into());
    }
    if let Some(title) = &frame.nav_title {
        println!("{title}");
    }
    for card in &frame.games.items {
        let year = card.year.map(|y| y.to_string()).unwrap_or_default();
        let fav = if card.favorite { "*" } else { " " };
        println!("{fav} {:<4} {}", year, card.name);
    }
    let s = frame.games.summary;
    println!(
        "{}-{} of {} (page {}/{})",
        s.start, s.end, s.total, s.page, s.page_count
    );
    Ok(())
}
