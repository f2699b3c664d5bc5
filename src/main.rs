//! Load Collector - System Load Telemetry Binary
//!
//! Serves the load collector over HTTP or runs a single query and prints the
//! result as JSON.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use load_collector::{
    meta, start_web_server, CollectorConfig, CpuStrategy, LoadCollector, MetricType, Namespace,
    PluginConfig, WebConfig, DEFAULT_WEB_PORT,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter, Level, Subscriber};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "load_collector")]
#[command(about = "System load telemetry collector")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Samples load averages and scheduling counts and exposes them as namespaced metrics")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Root of the procfs mount holding loadavg
    #[arg(long, default_value = "/proc")]
    proc_path: PathBuf,

    /// How to determine the number of logical CPUs
    #[arg(long, value_enum)]
    cpu_strategy: Option<CpuStrategyArg>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the plugin endpoints over HTTP (default)
    Serve(ServeArgs),

    /// List every available metric
    Metrics,

    /// Collect the given metrics once and exit
    Collect(CollectArgs),

    /// Show the recognized configuration options
    Policy,

    /// Show plugin metadata
    Meta,
}

#[derive(Args)]
struct ServeArgs {
    /// Web server bind address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Web server port
    #[arg(short, long, default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Enable permissive CORS headers
    #[arg(long)]
    cors: bool,
}

#[derive(Args)]
struct CollectArgs {
    /// Metric namespaces, e.g. /intel/procfs/load/min1
    #[arg(required = true)]
    namespaces: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum CpuStrategyArg {
    Lscpu,
    Kernel,
}

impl From<CpuStrategyArg> for CpuStrategy {
    fn from(arg: CpuStrategyArg) -> Self {
        match arg {
            CpuStrategyArg::Lscpu => CpuStrategy::Lscpu,
            CpuStrategyArg::Kernel => CpuStrategy::Kernel,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let mut config = CollectorConfig::default().with_proc_path(&cli.proc_path);
    if let Some(strategy) = cli.cpu_strategy {
        config = config.with_cpu_strategy(strategy.into());
    }

    match &cli.command {
        Some(Commands::Serve(args)) => serve_command(&config, args).await?,
        Some(Commands::Metrics) => {
            let mut collector = build_collector(&config)?;
            print_json(&collector.get_metric_types(&PluginConfig::new())?)?;
        }
        Some(Commands::Collect(args)) => collect_command(&config, args)?,
        Some(Commands::Policy) => {
            let collector = build_collector(&config)?;
            print_json(&collector.get_config_policy())?;
        }
        Some(Commands::Meta) => print_json(&meta())?,
        None => {
            let serve_args = ServeArgs {
                host: "127.0.0.1".to_string(),
                port: DEFAULT_WEB_PORT,
                cors: false,
            };
            serve_command(&config, &serve_args).await?;
        }
    }

    Ok(())
}

fn log_level(cli: &Cli) -> Level {
    if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    }
}

/// `RUST_LOG` directives refine the flag-selected level; they do not replace it.
fn build_subscriber(level: Level) -> impl Subscriber + Send + Sync + 'static {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    // Logs go to stderr so JSON output on stdout stays parseable.
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish()
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    tracing::subscriber::set_global_default(build_subscriber(log_level(cli)))?;
    Ok(())
}

fn build_collector(config: &CollectorConfig) -> anyhow::Result<LoadCollector> {
    LoadCollector::new(config).context("Failed to initialize load collector")
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn serve_command(config: &CollectorConfig, args: &ServeArgs) -> anyhow::Result<()> {
    let collector = build_collector(config)?;
    info!("Load collector initialized ({} CPUs)", collector.cpu_count());

    let web_config = WebConfig::new(&args.host, args.port).with_cors(args.cors);
    info!("  - Plugin endpoints: {}", web_config.endpoint_url());
    info!("  - CORS enabled: {}", web_config.enable_cors);

    start_web_server(web_config, collector).await?;
    Ok(())
}

fn collect_command(config: &CollectorConfig, args: &CollectArgs) -> anyhow::Result<()> {
    let requested = args
        .namespaces
        .iter()
        .map(|ns| ns.parse::<Namespace>().map(MetricType::new))
        .collect::<Result<Vec<_>, _>>()?;

    let mut collector = build_collector(config)?;
    print_json(&collector.collect_metrics(&requested)?)
}
