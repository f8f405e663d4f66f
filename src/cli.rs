use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML
    #[arg(long, default_value = "config.toml")]
    pub config: String,

    /// Run without GUI (headless)
    #[arg(long, default_value_t = false)]
    pub nogui: bool,

    /// Frames to simulate in headless mode
    #[arg(long, default_value_t = 600)]
    pub frames: u64,

    /// Pace headless frames to 60 Hz instead of running flat out
    #[arg(long, default_value_t = false)]
    pub realtime: bool,

    /// Drive audio bands from a wav file
    #[arg(long)]
    pub wav: Option<String>,

    /// Initial formation (overrides config)
    #[arg(long)]
    pub shape: Option<String>,

    /// Particle count (overrides config)
    #[arg(long)]
    pub count: Option<i64>,

    /// Random seed (overrides config)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}
