use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use esweb::app::{Intent, LoadState};
use esweb::detail::MediaLinkKind;
use esweb::prefs::MemoryStore;
use esweb_native::{ClientConfig, HttpBackend, Session, SessionHandle, SessionOptions};

const SYSTEMS: &str = r#"[
    {"name":"snes","fullname":"Super Nintendo","visible":"true"},
    {"name":"nes","fullname":"Nintendo Entertainment System","visible":"true"},
    {"name":"broken","fullname":"Zapper (broken)","visible":"true"}
]"#;

const SNES_GAMES: &str = r#"[
    {"id":"1","name":"Zelda","path":"/roms/snes/zelda.sfc","favorite":"true","playcount":"5","releasedate":"19920101T000000"},
    {"id":"2","name":"Mario","path":"/roms/snes/mario.sfc","playcount":"0"}
]"#;

const NES_GAMES: &str = r#"[
    {"id":"7","name":"Metroid","path":"/roms/nes/metroid.nes"},
    {"id":"8","name":"Kirby","path":"/roms/nes/kirby.nes"},
    {"id":"9","name":"Secret","path":"/roms/nes/secret.nes","hidden":"true"}
]"#;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Fake {
    launches: Mutex<Vec<String>>,
}

async fn systems() -> &'static str {
    SYSTEMS
}

async fn games(Path(name): Path<String>) -> axum::response::Response {
    match name.as_str() {
        "snes" => {
            tokio::time::sleep(Duration::from_millis(400)).await;
            SNES_GAMES.into_response()
        }
        "nes" => NES_GAMES.into_response(),
        _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn media(Path((_system, _id, kind)): Path<(String, String, String)>) -> StatusCode {
    if kind == "manual" {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn launch(State(fake): State<Arc<Fake>>, body: String) -> StatusCode {
    if let Ok(mut launches) = fake.launches.lock() {
        launches.push(body);
    }
    StatusCode::OK
}

async fn serve() -> (String, Arc<Fake>) {
    let fake = Arc::new(Fake::default());
    let app = Router::new()
        .route("/systems", get(systems))
        .route("/systems/:name/games", get(games))
        .route("/systems/:name/games/:id/media/:kind", get(media))
        .route("/launch", post(launch))
        .with_state(fake.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), fake)
}

async fn session(base_url: &str, auto_select: bool) -> SessionHandle {
    let backend = HttpBackend::new(ClientConfig::with_base_url(base_url)).unwrap();
    let options = SessionOptions {
        auto_select,
        ..SessionOptions::default()
    };
    let session = Session::start(backend, MemoryStore::new(), options);
    let handle = session.handle;
    handle
        .wait_for(WAIT, |f| f.dock.items.len() == 3)
        .await
        .expect("systems loaded");
    handle
}

fn loaded(f: &esweb::app::Frame) -> bool {
    matches!(f.games.load, LoadState::Loaded | LoadState::Failed(_))
}

#[tokio::test]
async fn slow_response_for_abandoned_system_is_discarded() {
    let (base, _fake) = serve().await;
    let handle = session(&base, false).await;

    handle.send(Intent::SelectSystem { name: "snes".into() });
    handle.send(Intent::SelectSystem { name: "nes".into() });

    let frame = handle.wait_for(WAIT, loaded).await.expect("nes loaded");
    assert_eq!(
        frame.nav_title.as_deref(),
        Some("Nintendo Entertainment System - 2 games")
    );

    // Let the snes response land; it must not replace the list.
    tokio::time::sleep(Duration::from_millis(700)).await;
    let latest = handle.latest().expect("rendered").frame;
    let names: Vec<&str> = latest.games.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Kirby", "Metroid"]);
    assert_eq!(
        latest.nav_title.as_deref(),
        Some("Nintendo Entertainment System - 2 games")
    );
}

#[tokio::test]
async fn failed_load_reports_status() {
    let (base, _fake) = serve().await;
    let handle = session(&base, false).await;

    handle.send(Intent::SelectSystem { name: "broken".into() });
    let frame = handle.wait_for(WAIT, loaded).await.expect("load settled");
    assert_eq!(frame.games.load, LoadState::Failed("HTTP 500".into()));
    assert_eq!(frame.nav_title.as_deref(), Some("Zapper (broken) - 0 games"));
    assert!(frame.games.items.is_empty());
}

#[tokio::test]
async fn launch_posts_path_without_quotes() {
    let (base, fake) = serve().await;
    let handle = session(&base, false).await;

    handle.send(Intent::Launch {
        path: "/roms/snes/Link's Awakening.sfc".into(),
    });

    let mut received = Vec::new();
    for _ in 0..50 {
        received = fake.launches.lock().unwrap().clone();
        if !received.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(received, ["/roms/snes/Links Awakening.sfc"]);
}

#[tokio::test]
async fn detail_shows_only_media_that_exists() {
    let (base, _fake) = serve().await;
    let handle = session(&base, false).await;

    handle.send(Intent::SelectSystem { name: "snes".into() });
    let frame = handle.wait_for(WAIT, loaded).await.expect("snes loaded");
    let zelda = frame
        .games
        .items
        .iter()
        .find(|c| c.name == "Zelda")
        .expect("zelda card");
    handle.send(Intent::OpenCardDetail {
        attributes: zelda.attributes.clone(),
    });

    let frame = handle
        .wait_for(WAIT, |f| {
            f.detail.as_ref().is_some_and(|d| {
                d.media
                    .iter()
                    .any(|m| m.kind == MediaLinkKind::Manual && m.visible)
            })
        })
        .await
        .expect("manual probed");
    let detail = frame.detail.expect("detail open");
    assert_eq!(detail.title, "Zelda");
    assert!(!detail
        .media
        .iter()
        .any(|m| m.kind == MediaLinkKind::Map && m.visible));
}

#[tokio::test]
async fn auto_select_picks_first_dock_item() {
    let (base, _fake) = serve().await;
    let handle = session(&base, true).await;

    let frame = handle.wait_for(WAIT, loaded).await.expect("auto-selected");
    // Alphabetical by display name: "Nintendo Entertainment System" first.
    assert_eq!(
        frame.nav_title.as_deref(),
        Some("Nintendo Entertainment System - 2 games")
    );
}

#[tokio::test]
async fn wait_for_times_out_without_a_matching_frame() {
    let (base, _fake) = serve().await;
    let handle = session(&base, false).await;

    let none = handle
        .wait_for(Duration::from_millis(50), |f| f.dock.items.is_empty())
        .await;
    assert!(none.is_none());

    // A frame already rendered satisfies the wait immediately.
    let frame = handle
        .wait_for(WAIT, |f| f.dock.items.len() == 3)
        .await
        .expect("current frame");
    assert_eq!(frame.dock.items[0].menu.len(), 4);
}
