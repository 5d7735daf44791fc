//! SarathiNav - reactive navigation controller
//!
//! Runs the sarathi decision core in a single-threaded loop: frame in,
//! sector classification, debounced avoidance, marker tracking,
//! arbitration, and one discrete command out to the motor controller.
//!
//! Without a depth camera driver the loop runs against a simulated scene.
//! A stdin thread provides operator keys; Ctrl-C stops the loop and the
//! robot is always sent STOP before exit.

mod config;
mod control;
mod error;
mod input;
mod logging;
mod manual;
mod scene;

use clap::{Parser, ValueEnum};
use config::{ActuatorConfig, NavConfig};
use control::{ControlLoop, LoopSettings};
use error::Result;
use sarathi_core::{
    ActuatorLink, CommandDispatcher, MockLink, Navigator, OperatorOverride, SerialLink,
    ZoneBoundaries,
};
use scene::{ScriptedMarker, SimulatedScene};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Instant;
use tracing::info;

/// Reactive navigation controller
#[derive(Parser, Debug)]
#[command(name = "sarathi-nav", version, about)]
struct Args {
    /// Configuration file (default: sarathi.toml in the working directory, if present)
    config: Option<PathBuf>,

    /// Serial port of the motor controller
    #[arg(long)]
    port: Option<String>,

    /// Initial operating mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Drive the actuator by hand from stdin instead of running the loop
    #[arg(long)]
    manual: bool,

    /// Stop after this many cycles
    #[arg(long)]
    max_cycles: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    /// Avoidance with marker tracking when the path is clear
    Hybrid,
    /// Obstacle avoidance only
    Avoidance,
    /// Marker tracking only, obstacles ignored
    Tracking,
}

impl ModeArg {
    fn into_override(self) -> Option<OperatorOverride> {
        match self {
            Self::Hybrid => None,
            Self::Avoidance => Some(OperatorOverride::AvoidanceOnly),
            Self::Tracking => Some(OperatorOverride::TrackingOnly),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = NavConfig::resolve_path(args.config.as_deref());
    let mut config = NavConfig::load_or_default(config_path.as_deref())?;

    // Command line overrides
    if let Some(port) = args.port {
        config.actuator.port = port;
    }
    if let Some(mode) = args.mode {
        config.control.initial_override = mode.into_override();
    }
    if args.max_cycles.is_some() {
        config.control.max_cycles = args.max_cycles;
    }

    let log_path = logging::init(&config.logging)?;

    info!("SarathiNav v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Loaded configuration from {:?}", path),
        None => info!("Using default configuration"),
    }
    if let Some(path) = log_path {
        info!("Logging to {:?}", path);
    }
    config.validate()?;

    let mut dispatcher = CommandDispatcher::new(open_link(&config.actuator));

    if args.manual {
        let accepted = manual::run(std::io::stdin().lock(), &mut dispatcher)?;
        dispatcher.shutdown();
        info!("Manual mode finished after {} commands", accepted);
        return Ok(());
    }

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let (tx, rx) = mpsc::channel();
    input::spawn_stdin_reader(tx)?;
    info!("Keys (then Enter): [1] avoidance only  [2] tracking only  [3] hybrid  [e/space] emergency stop  [q] quit");

    let now = Instant::now();
    let navigator = Navigator::new(
        config.sensor.intrinsics(),
        &config.sectors,
        &config.avoidance,
        &config.tracking,
        now,
    );
    let source = SimulatedScene::new(
        config.sensor.width,
        config.sensor.height,
        &config.simulation,
        now,
    );
    let detector = ScriptedMarker::new(&config.simulation.marker);
    let settings = LoopSettings {
        cycle_period: config.control.cycle_period(),
        reconnect_interval: config
            .actuator
            .enabled
            .then(|| config.control.reconnect_interval())
            .flatten(),
        max_cycles: config.control.max_cycles,
    };

    let mut control = ControlLoop::new(
        navigator,
        dispatcher,
        source,
        detector,
        ZoneBoundaries::from_config(config.sensor.width, &config.tracking),
        config.tracking.sample_radius,
        config.control.initial_override,
        settings,
        now,
    );

    info!(
        "Starting in {} mode, actuator {}",
        control
            .operator_override()
            .map_or("HYBRID", |m| m.as_str()),
        if control.dispatcher().is_connected() {
            "connected"
        } else {
            "simulated"
        }
    );

    control.run(&running, &rx);

    if let Some(command) = control.last_command() {
        info!("Last command before shutdown: {}", command);
    }
    control.shutdown();

    info!("SarathiNav finished");
    Ok(())
}

/// Serial link to the motor controller, or a simulated one when disabled
fn open_link(config: &ActuatorConfig) -> Box<dyn ActuatorLink> {
    if config.enabled {
        Box::new(SerialLink::open(config.serial_settings()))
    } else {
        info!("Actuator disabled, commands are simulated");
        let mut link = MockLink::disconnected();
        link.set_reconnect_ok(false);
        Box::new(link)
    }
}
