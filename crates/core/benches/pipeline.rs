//! Criterion benchmarks for the game list pipeline.
//!
//! Run with:
//!   cargo bench -p esweb
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use esweb::model::{ingest_games, Game, RawGame};
use esweb::pipeline::derive_visible;
use esweb::prefs::{GamePrefs, GameSort, PageSize};

fn make_library(size: usize) -> Vec<Game> {
    let genres = ["Action", "Platform", "RPG", "Puzzle", "Shooter"];
    let raw = (0..size)
        .map(|i| RawGame {
            id: i.to_string(),
            name: format!("Game {:05}", (i * 7919) % size.max(1)),
            genre: genres[i % genres.len()].to_string(),
            releasedate: if i % 9 == 0 {
                String::new()
            } else {
                format!("{}0101T000000", 1980 + i % 40)
            },
            playcount: (i % 13).to_string(),
            favorite: (i % 11 == 0).to_string(),
            hidden: (i % 50 == 0).to_string(),
            cheevos_hash: if i % 3 == 0 { "0".into() } else { "1".into() },
            ..RawGame::default()
        })
        .collect();
    ingest_games(raw)
}

/// Sort cost dominates: compare each comparator on the same library.
fn bench_sorts(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_visible_sort");
    let games = make_library(5_000);
    group.throughput(Throughput::Elements(games.len() as u64));

    for sort in GameSort::all() {
        let prefs = GamePrefs {
            sort: *sort,
            ..GamePrefs::default()
        };
        group.bench_with_input(BenchmarkId::new("sort", sort.as_str()), &prefs, |b, prefs| {
            b.iter(|| black_box(derive_visible(&games, prefs).total));
        });
    }

    group.finish();
}

/// Library size scaling with a text query and the "all" page size.
fn bench_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_visible_size");

    for size in [500usize, 2_000, 10_000].iter() {
        let games = make_library(*size);
        let prefs = GamePrefs {
            query: "plat".into(),
            page_size: PageSize::All,
            ..GamePrefs::default()
        };
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("query", size), &prefs, |b, prefs| {
            b.iter(|| black_box(derive_visible(&games, prefs).page_items.len()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sorts, bench_sizes);
criterion_main!(benches);
