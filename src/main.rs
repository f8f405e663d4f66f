// Entry point: loads config, then runs the egui viewer or the headless loop.
mod app;
mod cli;
mod ui;

use std::error::Error;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use clap::Parser;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use auraform::Formation;
use auraform::config::AppConfig;

use crate::cli::Args;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("auraform v{}", env!("CARGO_PKG_VERSION"));

    let mut cfg = AppConfig::load_or_default(&args.config);
    if let Some(shape) = args.shape.as_deref() {
        cfg.selection.shape = Formation::parse_lenient(shape);
    }
    if let Some(count) = args.count {
        cfg.selection.particle_count = count;
    }
    if let Some(seed) = args.seed {
        cfg.particles.seed = Some(seed);
    }

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_for_ctrlc = stop_flag.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        stop_flag_for_ctrlc.store(true, Ordering::SeqCst);
    }) {
        warn!("Ctrl-C handler not installed: {err}");
    }

    if args.nogui {
        return app::run_headless(&args, &cfg, stop_flag);
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1100.0, 900.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Auraform",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::App::new(cc, &args, cfg, stop_flag)))),
    )?;
    Ok(())
}
