//! plcdash command line.
//!
//! One-shot variable commands, live `watch`/`monitor` views, and a `mock`
//! command that runs the in-memory variable service.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plcdash_core::config::{ApiStyle, ConfigHandlers, DashboardSettings};

mod commands;
mod output;
mod storage;

use storage::FileConfigStorage;

/// Dashboard for PLC variables exposed over HTTP
#[derive(Parser)]
#[command(name = "plcdash")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Service base URL, including the /api prefix
    #[arg(long, global = true, env = "PLCDASH_URL")]
    url: Option<String>,

    /// URL convention spoken by the service (rpc or rest)
    #[arg(long, global = true)]
    style: Option<ApiStyle>,

    /// Configuration directory (default ~/.plcdash)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read one variable, or every catalog variable when none is given
    Read {
        /// Variable name, or KIND:ADDRESS such as int:40001
        variable: Option<String>,
    },

    /// Write a value and show the verified result
    Write {
        /// Variable name, or KIND:ADDRESS
        variable: String,

        /// ON/OFF/true/false/1/0 for coils, a number otherwise
        value: String,
    },

    /// Invert a coil
    Toggle {
        /// Variable name, or bool:ADDRESS
        variable: String,
    },

    /// Poll every variable and redraw the table until interrupted
    Watch,

    /// Live temperature reading, chart and statistics
    Monitor {
        /// Number of history points on the chart
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Request an analysis of the recent temperature history
    Analyze,

    /// Print the temperature report
    Report {
        /// Trailing window in hours
        #[arg(long)]
        hours: Option<u32>,
    },

    /// Point the service at another device
    Device {
        ip: String,

        #[arg(default_value_t = 502)]
        port: u16,
    },

    /// Show the service's link state
    Status,

    /// Print the effective settings
    Config {
        /// Persist --url and --style
        #[arg(long)]
        save: bool,
    },

    /// Increment the PLC heartbeat register periodically
    Watchdog {
        /// INT holding register (default 40004)
        #[arg(long)]
        address: Option<u32>,

        /// Period in milliseconds (default 500)
        #[arg(long)]
        period_ms: Option<u64>,
    },

    /// Run the mock variable service
    Mock {
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: SocketAddr,

        /// Drift the temperature register
        #[arg(long)]
        simulate: bool,

        /// Temperature sampling period in seconds
        #[arg(long, default_value_t = 5)]
        interval: u64,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,plcdash_client=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let storage = match &cli.config_dir {
        Some(dir) => FileConfigStorage::new(dir),
        None => FileConfigStorage::in_home()?,
    };
    let overrides = DashboardSettings {
        service_url: cli.url.clone(),
        api_style: cli.style,
        ..Default::default()
    };
    let settings = ConfigHandlers::get_settings(&storage)?.merge(overrides);
    let ctx = commands::Context { settings, storage };

    match cli.command {
        Commands::Read { variable } => commands::read(&ctx, variable.as_deref()).await,
        Commands::Write { variable, value } => commands::write(&ctx, &variable, &value).await,
        Commands::Toggle { variable } => commands::toggle(&ctx, &variable).await,
        Commands::Watch => commands::watch(&ctx).await,
        Commands::Monitor { limit } => commands::monitor(&ctx, limit).await,
        Commands::Analyze => commands::analyze(&ctx).await,
        Commands::Report { hours } => commands::report(&ctx, hours).await,
        Commands::Device { ip, port } => commands::device(&ctx, ip, port).await,
        Commands::Status => commands::status(&ctx).await,
        Commands::Watchdog { address, period_ms } => {
            commands::watchdog(&ctx, address, period_ms).await
        }
        Commands::Config { save } => commands::config(&ctx, save),
        Commands::Mock {
            bind,
            simulate,
            interval,
        } => commands::mock(bind, simulate, interval).await,
    }
}
