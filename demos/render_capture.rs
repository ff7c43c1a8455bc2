//! Render a capture headlessly and report the view under a point.
//!
//! ```text
//! cargo run --example render_capture -- demos/sample_capture.xml out.png 2d 120 80
//! ```
//!
//! Arguments: capture file, output PNG, `2d` or `3d` (default `3d`), and an
//! optional point to pick. Set `RUST_LOG=debug` for per-frame logs. Pass
//! `--gpu` to render with wgpu instead of the CPU rasterizer.

use hierarchy_inspector::prelude::*;
use hierarchy_inspector::renderer::RenderBackend;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

fn main() {
    env_logger::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let use_gpu = match args.iter().position(|a| a == "--gpu") {
        Some(index) => {
            args.remove(index);
            true
        }
        None => false,
    };

    let input = args
        .first()
        .cloned()
        .unwrap_or_else(|| "demos/sample_capture.xml".to_string());
    let output = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "capture.png".to_string());
    let mode = match args.get(2).map(String::as_str) {
        Some("2d") => ProjectionMode::Orthographic,
        _ => ProjectionMode::Perspective,
    };
    let point = match (args.get(3), args.get(4)) {
        (Some(x), Some(y)) => x
            .parse::<f32>()
            .ok()
            .zip(y.parse::<f32>().ok())
            .map(|(x, y)| Point::new(x, y)),
        _ => None,
    };

    let xml = match std::fs::read_to_string(&input) {
        Ok(xml) => xml,
        Err(e) => {
            log::error!("Failed to read {}: {}", input, e);
            std::process::exit(1);
        }
    };

    let config = InspectorConfig::default().initial_mode(mode);
    let tree = match parse_capture(&xml, config.clear_color) {
        Ok(tree) => tree,
        Err(e) => {
            log::error!("Failed to parse {}: {}", input, e);
            std::process::exit(1);
        }
    };

    if use_gpu {
        match GpuContext::new() {
            Ok(context) => {
                let backend = GpuBackend::new(&context, WIDTH, HEIGHT);
                let mut inspector = Inspector::with_config(backend, config);
                inspector.initialize(tree);
                let image = inspector.backend_mut().snapshot();
                report_pick(&mut inspector, point);
                match image {
                    Some(image) => save(&image, &output),
                    None => log::error!("GPU snapshot failed"),
                }
                return;
            }
            Err(e) => log::warn!("Falling back to software rendering: {}", e),
        }
    }

    let mut inspector = Inspector::with_config(SoftwareBackend::new(WIDTH, HEIGHT), config);
    inspector.initialize(tree);
    let image = inspector.backend().snapshot().clone();
    report_pick(&mut inspector, point);
    save(&image, &output);
}

fn report_pick<B: RenderBackend>(inspector: &mut Inspector<B>, point: Option<Point>) {
    let Some(point) = point else {
        return;
    };
    match inspector.pick(point) {
        Some(id) => {
            if let Some(node) = inspector.tree().and_then(|tree| tree.get(id)) {
                log::info!(
                    "View at ({}, {}): {} {:?} bounds {:?} depth {}",
                    point.x,
                    point.y,
                    node.name,
                    node.id,
                    node.bounds,
                    node.depth()
                );
            }
        }
        None => log::info!("No view at ({}, {})", point.x, point.y),
    }
}

fn save(image: &image::RgbaImage, path: &str) {
    match image.save(path) {
        Ok(()) => log::info!("Wrote {}", path),
        Err(e) => log::error!("Failed to write {}: {}", path, e),
    }
}
