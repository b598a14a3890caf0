use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info};
use random_waypoints::config::{parse_launch_args, NodeConfig, NODE_NAME};
use random_waypoints::perception::SimulatedOdometry;
use random_waypoints::transport::{LogTransport, TeeTransport};
use random_waypoints::{ExitStatus, Pose, PublicationScheduler, RunReport};
use std::path::PathBuf;
use tokio::sync::watch;

/// Exit code for configuration errors; no tick has run
const CONFIG_ERROR_EXIT: i32 = 2;

/// Publishes random waypoints toward (finalX, finalY)
#[derive(Parser, Debug)]
#[command(name = NODE_NAME, version, about)]
struct Args {
    /// YAML parameter file (flat or ROS 2 ros__parameters layout)
    #[arg(long)]
    params_file: Option<PathBuf>,

    /// Final target X; overrides the parameter file and launch overrides
    #[arg(long, allow_negative_numbers = true)]
    final_x: Option<f64>,

    /// Final target Y; overrides the parameter file and launch overrides
    #[arg(long, allow_negative_numbers = true)]
    final_y: Option<f64>,

    /// Seed for a reproducible waypoint stream
    #[arg(long)]
    seed: Option<u64>,

    /// Topic name the waypoints are logged under
    #[arg(long, default_value = "/waypoints")]
    topic: String,

    /// Launch overrides of the form name:=value (e.g. finalX:=12.0)
    params: Vec<String>,
}

fn build_config(args: &Args) -> Result<NodeConfig> {
    let mut config = match &args.params_file {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };

    let (overrides, rest) = parse_launch_args(&args.params);
    if !rest.is_empty() {
        bail!("Unexpected arguments: {}", rest.join(" "));
    }
    config
        .apply_overrides(&overrides)
        .context("Invalid launch parameter")?;

    if let Some(x) = args.final_x {
        config.final_x = x;
    }
    if let Some(y) = args.final_y {
        config.final_y = y;
    }
    if let Some(seed) = args.seed {
        config.rng_seed = Some(seed);
    }
    Ok(config)
}

async fn run_node(config: NodeConfig, topic: &str) -> Result<RunReport> {
    let odometry = SimulatedOdometry::new(Pose::new(config.start_x, config.start_y), config.robot_speed);
    let transport = TeeTransport::new(LogTransport::new(topic), odometry.follower());

    let mut scheduler = PublicationScheduler::from_config(&config, odometry, transport)
        .context("Failed to initialize waypoint publisher")?;

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C");
            let _ = stop_tx.send(true);
        }
    });

    info!("{} running, publishing on {}", NODE_NAME, topic);
    Ok(scheduler.run(stop_rx).await)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(CONFIG_ERROR_EXIT);
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;

    let report = match runtime.block_on(run_node(config, &args.topic)) {
        Ok(report) => report,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(CONFIG_ERROR_EXIT);
        }
    };

    match report.status {
        ExitStatus::Arrived => info!(
            "Target reached after {} ticks, {} waypoints published",
            report.ticks, report.published
        ),
        ExitStatus::Failed => error!(
            "Stopped after {} ticks: {}",
            report.ticks,
            report
                .last_error
                .as_ref()
                .map_or_else(|| "unknown error".to_string(), |e| e.to_string())
        ),
        ExitStatus::Cancelled => info!("Cancelled after {} ticks", report.ticks),
    }

    drop(runtime);
    std::process::exit(report.exit_code());
}
