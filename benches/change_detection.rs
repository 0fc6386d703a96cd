//! Benchmarks for change detection and artifact generation.
//!
//! These benchmarks measure classifying `git status` output against the
//! registry and inferring Rust types from schema documents of various sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use schema_tracker::app::{default_apps, EconApp, ResourceKind};
use schema_tracker::detector::{self, UPDATED};
use schema_tracker::generator::render_module;
use schema_tracker::registry::Registry;

/// `count` synthetic apps with distinct ids and short codes.
fn generate_apps(count: u32) -> Vec<EconApp> {
    (0..count)
        .map(|i| EconApp::new(10_000 + i, &format!("Game {}", i), &format!("Game{}", i)))
        .collect()
}

/// Every tracked file of `apps` plus one unrelated file per app.
fn generate_status(apps: &[EconApp]) -> Vec<String> {
    let mut files = Vec::new();
    for app in apps {
        files.push(format!("cache/{}", app.file_name(ResourceKind::PrimarySchema)));
        files.push(format!("cache/{}", app.file_name(ResourceKind::SecondarySchema)));
        files.push(format!(
            "SteamEcon/Schema/{}",
            app.file_name(ResourceKind::GeneratedArtifact)
        ));
        files.push(format!("notes/{}.txt", app.short_code));
    }
    files
}

/// A GetSchema `result` with `items` entries.
fn generate_schema(items: usize) -> String {
    let entries: Vec<String> = (0..items)
        .map(|i| {
            format!(
                r#"{{"defindex":{},"name":"Item {}","item_class":"tool","capabilities":{{"nameable":true,"can_gift_wrap":{}}},"attributes":[{{"name":"attr","class":"set_attr","value":{}.5}}]}}"#,
                i,
                i,
                i % 2 == 0,
                i
            )
        })
        .collect();
    format!(
        r#"{{"status":1,"items_game_url":"http://media.steampowered.com/apps/440/scripts/items/items_game.txt","qualities":{{"normal":0,"unique":6}},"items":[{}]}}"#,
        entries.join(",")
    )
}

fn bench_registry_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_build");

    group.bench_function("builtin", |b| {
        let apps = default_apps();
        b.iter(|| Registry::build(black_box(&apps)))
    });

    for count in [10, 100, 1000] {
        let apps = generate_apps(count);
        group.bench_with_input(BenchmarkId::new("apps", count), &apps, |b, apps| {
            b.iter(|| Registry::build(black_box(apps)))
        });
    }

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    for count in [10, 100, 1000] {
        let apps = generate_apps(count);
        let registry = Registry::build(&apps).unwrap();
        let files = generate_status(&apps);
        group.bench_with_input(BenchmarkId::new("apps", count), &files, |b, files| {
            b.iter(|| detector::classify(&registry, black_box(files), UPDATED, |_| Ok(())))
        });
    }

    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_module");

    for items in [10, 100, 1000] {
        let schema = generate_schema(items);
        group.bench_with_input(BenchmarkId::new("items", items), &schema, |b, schema| {
            b.iter(|| render_module("steam_econ::schema::TF2Schema", "TF2Schema", black_box(schema)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_registry_build, bench_classify, bench_generate);
criterion_main!(benches);
