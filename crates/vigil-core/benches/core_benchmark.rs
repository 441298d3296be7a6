//! Benchmark tests for vigil-core hot paths
//!
//! Run with: cargo bench -p vigil-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use vigil_core::scrub::fraction_at;
use vigil_core::sim::SimHost;
use vigil_core::{format_time, BarBounds, Command, KeyChord, PlayerEvent, SecureWidget, WidgetConfig};

// ============================================================================
// Helpers
// ============================================================================

fn playing_widget(host: &SimHost) -> SecureWidget {
    host.embed.set_duration(3600.0);
    let mut widget = SecureWidget::mount(&WidgetConfig::new("bench"), host.collaborators()).unwrap();
    widget.on_player_event(PlayerEvent::Ready);
    widget.command(Command::Play);
    widget
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_format_time(c: &mut Criterion) {
    let mut group = c.benchmark_group("format_time");
    for seconds in [5.0, 125.0, 3599.0] {
        group.bench_with_input(BenchmarkId::from_parameter(seconds), &seconds, |b, &s| {
            b.iter(|| format_time(black_box(s)))
        });
    }
    group.finish();
}

fn bench_fraction_at(c: &mut Criterion) {
    let bar = BarBounds::new(40.0, 960.0);
    c.bench_function("fraction_at", |b| b.iter(|| fraction_at(black_box(512.0), black_box(bar))));
}

fn bench_frame_ticks(c: &mut Criterion) {
    c.bench_function("one_second_of_frames", |b| {
        b.iter_batched(
            || {
                let host = SimHost::new();
                let widget = playing_widget(&host);
                (host, widget)
            },
            |(host, mut widget)| {
                host.advance(&mut widget, Duration::from_secs(1));
                widget.view()
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_key_chords(c: &mut Criterion) {
    let chords = [
        KeyChord::new("a"),
        KeyChord::new("F12"),
        KeyChord::new("I").ctrl().shift(),
        KeyChord::new("u").meta(),
    ];
    c.bench_function("is_inspection_chord", |b| {
        b.iter(|| chords.iter().filter(|c| black_box(c).is_inspection_chord()).count())
    });
}

criterion_group!(benches, bench_format_time, bench_fraction_at, bench_frame_ticks, bench_key_chords);
criterion_main!(benches);
