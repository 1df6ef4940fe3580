//! Headless driver: shows one image file through an [`ImageSource`] and logs
//! what the host would see.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use async_image_source::{HeadlessGraphics, ImageSource, PipelineConfig, SourceEnv, SourceSettings};

/// Simulated video frame rate
const FRAME_RATE: u32 = 60;

/// Show an image file through a headless image source.
#[derive(Parser, Debug)]
#[command(name = "async-image-source", version, about)]
struct Args {
    /// Image file to show
    image: String,

    /// Seconds to run
    #[arg(default_value_t = 3.0)]
    seconds: f32,

    /// Free the image while the source is hidden
    #[arg(long)]
    unload_when_hidden: bool,

    /// Premultiply alpha in linear space
    #[arg(long)]
    linear_alpha: bool,

    /// Pipeline configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn settings(&self) -> SourceSettings {
        SourceSettings::new(self.image.clone())
            .with_unload_when_hidden(self.unload_when_hidden)
            .with_linear_alpha(self.linear_alpha)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match PipelineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => PipelineConfig::default(),
    };

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let env = match SourceEnv::from_config(&config) {
        Ok(env) => env,
        Err(e) => {
            log::error!("Failed to start loader: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let graphics = HeadlessGraphics::new();
    let counters = graphics.counters();
    let mut source = ImageSource::create(args.settings(), env, Box::new(graphics));
    source.show();

    for file in source.missing_files() {
        log::warn!("Missing file: {}", file);
    }

    let frame = Duration::from_secs(1) / FRAME_RATE;
    let frames = (args.seconds * FRAME_RATE as f32).max(0.0) as u32;
    let mut last_size = (0, 0);
    for _ in 0..frames {
        std::thread::sleep(frame);
        source.tick(frame.as_secs_f32());

        let size = (source.width(), source.height());
        if size != last_size {
            log::info!(
                "Showing {:?} at {}x{} ({:?})",
                source.active_path(),
                size.0,
                size.1,
                source.color_space()
            );
            last_size = size;
        }
    }

    let stats = source.load_stats();
    log::info!(
        "Loads: {} requested, {} published, {} stale, {} failed",
        stats.requested,
        stats.published,
        stats.stale,
        stats.failed
    );
    log::info!(
        "Textures: {} created, {} frame uploads, {} bytes uploaded",
        counters.created(),
        counters.updates(),
        counters.uploaded_bytes()
    );

    source.hide();
    source.destroy();
    ExitCode::SUCCESS
}
