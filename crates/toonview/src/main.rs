mod app;

use anyhow::{Context, Result};
use winit::dpi::LogicalSize;

use toonview_engine::device::GpuInit;
use toonview_engine::logging::{LoggingConfig, init_logging};
use toonview_engine::wavefront::{Model, ParserConfig};
use toonview_engine::window::{Runtime, RuntimeConfig};

const USAGE: &str = "usage: toonview [--cw] [--group-per-material] [--log FILTER] model.obj";

fn main() -> Result<()> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        println!("{USAGE}");
        return Ok(());
    }

    let parser_config = ParserConfig {
        clockwise_winding: args.contains("--cw"),
        group_per_material: args.contains("--group-per-material"),
    };
    let log_filter: Option<String> = args.opt_value_from_str("--log")?;
    init_logging(LoggingConfig {
        env_filter: log_filter,
    });

    let model_path: std::path::PathBuf = args.free_from_str().context(USAGE)?;

    let mut model = Model::load(&model_path, &parser_config)?;
    model.consolidate();

    log::info!(
        "loaded '{}': {} groups, {} triangles, {} materials",
        model_path.display(),
        model.groups.len(),
        model.triangle_count(),
        model.materials.len()
    );

    let gpu_init = GpuInit {
        // The geometry pass writes three float targets at once and may
        // alpha-blend into them.
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits {
            max_color_attachment_bytes_per_sample: 64,
            ..wgpu::Limits::default()
        },
        ..GpuInit::default()
    };

    Runtime::run(
        RuntimeConfig {
            title: "toon shading".to_string(),
            initial_size: LogicalSize::new(600.0, 450.0),
        },
        gpu_init,
        app::ViewerApp::new(model),
    )
}
