use anyhow::Result;
use clap::Parser;
use psvr_config::{AppConfig, OutputMode};
use psvr_imu::hid::HidSource;
use psvr_imu::types::Orientation;
use psvr_imu::{ImuTracker, TrackerSettings};
use tracing::{debug, info, warn};
use vridge_client::{TrackingFrame, VridgeClient};

/// The headset is stationary in space; only rotation is tracked.
const POSITION: [f32; 3] = [0.0, 0.0, 0.0];

#[derive(Parser, Debug)]
#[command(name = "psvr-bridge")]
#[command(about = "Read the PSVR inertial stream and drive VRidge head tracking")]
struct Args {
    /// Send orientation as Euler angles rather than a quaternion
    #[arg(short = 'A', long)]
    angle: bool,

    /// Simulate the PSVR with a synthetic rotation
    #[arg(short = 'S', long)]
    sim: bool,

    /// Enable gyro compensation (keep the headset stationary at startup)
    #[arg(short = 'c', long)]
    comp: bool,

    /// VRidge server host
    #[arg(short = 's', long)]
    server: Option<String>,

    /// Output extra debug messages
    #[arg(short = 'D', long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug {
        "psvr_bridge=debug,psvr_imu=debug,vridge_client=debug"
    } else {
        "psvr_bridge=info,psvr_imu=info,vridge_client=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Command line wins over the config file.
    if let Some(server) = args.server {
        config.server = server;
    }
    if args.angle {
        config.output.mode = OutputMode::Angles;
    }
    if args.comp {
        config.imu.gyro_compensation = true;
    }

    info!(server = %config.server, mode = ?config.output.mode, "PSVR bridge starting");

    // The sink must be reachable before the sensor loop spins up; a
    // handshake failure ends the run here.
    let mut client = VridgeClient::connect(&config.server).await?;

    let settings = TrackerSettings {
        beta: config.imu.madgwick_beta,
        calibration_secs: config
            .imu
            .gyro_compensation
            .then_some(config.imu.calibration_secs),
    };

    let tracker = if args.sim {
        info!("Simulating the PSVR");
        ImuTracker::simulated(settings)
    } else {
        let source = HidSource::open()?;
        ImuTracker::start(source, settings)
    };

    run_bridge(&mut client, &tracker, config.output.mode).await?;

    client.close().await;
    info!("PSVR bridge stopped");
    Ok(())
}

/// Forward each new orientation to the server, one frame per update, one
/// acknowledged reply per frame.
async fn run_bridge(
    client: &mut VridgeClient,
    tracker: &ImuTracker,
    mode: OutputMode,
) -> Result<()> {
    let mut orientation_rx = tracker.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                return Ok(());
            }
            changed = orientation_rx.changed() => {
                if changed.is_err() {
                    warn!("Sensor stream ended");
                    return Ok(());
                }
                let orientation = *orientation_rx.borrow_and_update();

                let (yaw, pitch, roll) = orientation.yaw_pitch_roll();
                debug!(yaw, pitch, roll, quat = ?orientation.quaternion, "Pose");

                client.send(&tracking_frame(mode, orientation)).await?;
            }
        }
    }
}

fn tracking_frame(mode: OutputMode, orientation: Orientation) -> TrackingFrame {
    match mode {
        OutputMode::Angles => {
            let (yaw, pitch, roll) = orientation.yaw_pitch_roll();
            TrackingFrame::Angles {
                pitch: pitch as f32,
                yaw: yaw as f32,
                roll: roll as f32,
                position: POSITION,
            }
        }
        OutputMode::Quaternion => TrackingFrame::Quaternion {
            quaternion: orientation.quaternion.as_quat(),
            position: POSITION,
        },
        OutputMode::Position => TrackingFrame::Position { position: POSITION },
    }
}
