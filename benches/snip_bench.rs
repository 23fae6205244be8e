use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rfsnip::{normalize_rect, PointerPoint, SelectionMachine};

fn bench_normalize(c: &mut Criterion) {
    let anchor = PointerPoint::new(400.0, 300.0);
    c.bench_function("normalize_rect", |b| {
        b.iter(|| normalize_rect(black_box(anchor), black_box(PointerPoint::new(12.0, 900.0))))
    });
}

fn bench_drag(c: &mut Criterion) {
    // A long drag: every move recomputes the overlay from the anchor.
    let path: Vec<PointerPoint> = (0..1000)
        .map(|i| PointerPoint::new((i % 640) as f64, (i / 3) as f64))
        .collect();
    c.bench_function("drag_1000_moves", |b| {
        b.iter(|| {
            let mut m = SelectionMachine::new();
            m.pointer_down(PointerPoint::new(320.0, 160.0), true);
            for p in &path {
                black_box(m.pointer_move(*p));
            }
            m.pointer_up(None)
        })
    });
}

#[cfg(feature = "raster")]
fn bench_rasterize(c: &mut Criterion) {
    use rfsnip::{ContentHost, RasterRegion, Rasterizer, SnipConfig};

    let paragraphs: String = (0..40)
        .map(|i| format!("<p id=\"p{i}\">Paragraph {i} with some text to wrap across lines.</p>"))
        .collect();
    let cfg = SnipConfig {
        content: format!("<div id=\"overlay-bench\">{}</div>", paragraphs),
        ..Default::default()
    };
    let host = ContentHost::render(&cfg).expect("render");
    let (w, h) = host.extents();
    let mut rasterizer = host.rasterizer();
    let region = RasterRegion {
        x: 0.0,
        y: 0.0,
        width: 400.0,
        height: 300.0,
        window_width: w,
        window_height: h,
        device_pixel_ratio: 2.0,
    };
    c.bench_function("rasterize_400x300_dpr2", |b| {
        b.iter(|| rasterizer.rasterize(black_box(&region)).expect("rasterize"))
    });
}

#[cfg(not(feature = "raster"))]
fn bench_rasterize(_c: &mut Criterion) {}

criterion_group!(benches, bench_normalize, bench_drag, bench_rasterize);
criterion_main!(benches);
