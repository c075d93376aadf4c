//! Draws a scripted pen session and rasterizes the canvas to a PNG.
//!
//! `cargo run --example render_png -- out.png`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use xpboard::{
    canvas::Snapshot,
    tablet::{DeviceDescriptor, DIGITIZER_USAGE_PAGE, STAR_G640},
    Builder, ScriptedTransport,
};

fn report(contact: bool, x: u16, y: u16, pressure: u16) -> Vec<u8> {
    let status = if contact { 0x03 } else { 0x02 };
    let [x0, x1] = x.to_le_bytes();
    let [y0, y1] = y.to_le_bytes();
    let [p0, p1] = pressure.to_le_bytes();
    vec![0x07, status, x0, x1, y0, y1, p0, p1]
}

fn render(snapshot: &Snapshot, [width, height]: [f32; 2]) -> tiny_skia::Pixmap {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut pixmap = tiny_skia::Pixmap::new(width as u32, height as u32).unwrap();
    pixmap.fill(tiny_skia::Color::WHITE);

    for stroke in snapshot.iter() {
        let [r, g, b, a] = stroke.color().0;
        let paint = tiny_skia::Paint {
            shader: tiny_skia::Shader::SolidColor(tiny_skia::Color::from_rgba8(r, g, b, a)),
            anti_alias: true,
            ..Default::default()
        };
        // Lone points get a dot as wide as the line would be.
        if let [only] = stroke.points() {
            let [x, y] = only.to_viewport(width, height);
            let dot = tiny_skia::PathBuilder::from_circle(x, y, stroke.width_at(only.pressure()) / 2.0);
            if let Some(dot) = dot {
                pixmap.fill_path(
                    &dot,
                    &paint,
                    tiny_skia::FillRule::Winding,
                    tiny_skia::Transform::identity(),
                    None,
                );
            }
            continue;
        }
        for (from, to, line_width) in stroke.segments() {
            let [x0, y0] = from.to_viewport(width, height);
            let [x1, y1] = to.to_viewport(width, height);
            let mut path = tiny_skia::PathBuilder::with_capacity(2, 2);
            path.move_to(x0, y0);
            path.line_to(x1, y1);
            // Zero-length segments make no path.
            let Some(path) = path.finish() else {
                continue;
            };
            pixmap.stroke_path(
                &path,
                &paint,
                &tiny_skia::Stroke {
                    width: line_width,
                    line_cap: tiny_skia::LineCap::Round,
                    line_join: tiny_skia::LineJoin::Round,
                    ..Default::default()
                },
                tiny_skia::Transform::identity(),
                None,
            );
        }
    }
    pixmap
}

fn main() {
    env_logger::init();
    let out = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "whiteboard.png".to_owned());

    let pen = DeviceDescriptor {
        usb_id: STAR_G640,
        interface: 2,
        usage_page: DIGITIZER_USAGE_PAGE,
        usage: 2,
        path: "scripted-pen".to_owned(),
    };
    let (transport, feed) = ScriptedTransport::new(vec![pen]);
    let redraws = Arc::new(AtomicUsize::new(0));
    let mut board = Builder::new()
        .sink({
            let redraws = redraws.clone();
            move || {
                redraws.fetch_add(1, Ordering::Relaxed);
            }
        })
        .build_scripted(transport)
        .unwrap();
    println!("connected to {}", board.connect().unwrap());
    board.start_input().unwrap();

    // A wave whose pressure swells towards the middle.
    for step in 0..=200u16 {
        let t = f32::from(step) / 200.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x, y, pressure) = (
            (2000.0 + t * 28000.0) as u16,
            (16384.0 + (t * std::f32::consts::TAU * 2.0).sin() * 8000.0) as u16,
            ((t * std::f32::consts::PI).sin() * 8191.0) as u16,
        );
        feed.push(report(true, x, y, pressure));
    }
    feed.push(report(false, 0, 0, 0));
    // A row of taps.
    for tap in 0..5u16 {
        let x = 6000 + tap * 5000;
        feed.push(report(true, x, 28000, 1000 + tap * 1700));
        feed.push(report(false, x, 28000, 0));
    }
    feed.finish();

    while board.is_running() {
        std::thread::sleep(Duration::from_millis(5));
    }
    if let Some(fatal) = board.take_fatal() {
        // Expected, the script ran out.
        println!("{fatal}");
    }

    let snapshot = board.snapshot();
    let dimensions = board.canvas().lock().dimensions();
    println!(
        "{} stroke(s), {} redraw request(s)",
        snapshot.len(),
        redraws.load(Ordering::Relaxed)
    );
    render(&snapshot, dimensions).save_png(&out).unwrap();
    println!("wrote {out}");
}
