//! Compositor Benchmarks
//!
//! Measures the cost of one overlay tick against a recording surface.
//!
//! # Running Benchmarks
//! ```bash
//! cargo bench --bench compositor_benchmark
//! ```

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use target_overlay_rs::{
    Compositor, Detection, DisplayList, Mode, Rect, ResultPayload, VideoMeta,
};

/// Synthetic job: `objects` detections per frame for 300 frames, alternating
/// persons and vehicles drifting across the frame.
fn synthetic_payload(objects: usize) -> ResultPayload {
    let mut tracks = Vec::with_capacity(objects * 300);
    for frame in 0..300u32 {
        for i in 0..objects {
            let phase = (frame as f32 / 300.0 + i as f32 / objects as f32) % 1.0;
            let cx = 0.1 + 0.8 * phase;
            let h = 0.1 + 0.05 * (i % 5) as f32;
            let is_vehicle = i % 2 == 0;
            tracks.push(Detection::new(
                frame,
                format!("{i}"),
                Rect::from_center(cx, 0.5, h * 0.8, h),
                is_vehicle,
                0.8,
            ));
        }
    }
    let meta = VideoMeta {
        width: 1920,
        height: 1080,
        fps: 30.0,
        frames: 300,
        duration_s: Some(10.0),
    };
    ResultPayload::new(meta, tracks)
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("compositor_tick");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for objects in [5usize, 20, 50] {
        for mode in [Mode::Taser, Mode::Hawkeye] {
            let mut compositor: Compositor<DisplayList> =
                Compositor::new(synthetic_payload(objects), mode);
            compositor.settings_mut().set("showStatusPanel", true);
            let mut surface = DisplayList::new(1920.0, 1080.0);
            let mut tick = 0u64;

            group.bench_with_input(
                BenchmarkId::new(mode.as_str(), objects),
                &objects,
                |b, _| {
                    b.iter(|| {
                        tick += 1;
                        let t = (tick % 300) as f64 / 30.0;
                        let report = compositor.tick(
                            &mut surface,
                            black_box(t),
                            Duration::from_millis(tick * 33),
                        );
                        black_box(report)
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
