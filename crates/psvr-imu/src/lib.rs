pub mod calibration;
pub mod clock;
pub mod fusion;
pub mod hid;
pub mod packet;
pub mod types;

use anyhow::Result;
use clock::DEFAULT_SAMPLE_INTERVAL;
use fusion::SensorFusion;
use glam::DVec3;
use packet::{decode_packet, RawPacket};
use std::time::Duration;
use tokio::sync::watch;
use types::Orientation;

/// Synthetic rotation used in simulation: looking right while pitching up.
const SIM_GYRO: DVec3 = DVec3::new(0.0, 1.0, 0.0);
const SIM_ACCEL: DVec3 = DVec3::new(0.0, 1.0, 0.0);

/// Yields raw sensor reports from wherever they come from.
///
/// `Ok(None)` means "no data yet" — the caller retries; it is never
/// end-of-stream. An error ends the run.
pub trait PacketSource: Send {
    fn read_packet(&mut self) -> Result<Option<RawPacket>>;
}

/// Tuning for the tracking pipeline.
#[derive(Debug, Clone, Copy)]
pub struct TrackerSettings {
    /// Madgwick filter gain.
    pub beta: f64,
    /// Gyro-bias observation window, or `None` to skip calibration.
    pub calibration_secs: Option<f64>,
}

/// Head tracker for the PSVR sensor stream.
///
/// Spawns a background task that reads raw reports, decodes them, reconciles
/// timestamps, optionally calibrates, runs sensor fusion, and publishes the
/// latest orientation. The handoff is a single-slot latest-wins channel:
/// consumers always see the freshest estimate and never buffer a backlog.
pub struct ImuTracker {
    orientation_rx: watch::Receiver<Orientation>,
    _task: tokio::task::JoinHandle<()>,
}

impl ImuTracker {
    /// Start tracking from a real packet source.
    ///
    /// Reads block briefly inside the source, so the loop runs on the
    /// blocking pool rather than an async worker thread.
    pub fn start(source: impl PacketSource + 'static, settings: TrackerSettings) -> Self {
        let (orientation_tx, orientation_rx) = watch::channel(Orientation::default());
        let task =
            tokio::task::spawn_blocking(move || read_loop(source, orientation_tx, settings));
        Self {
            orientation_rx,
            _task: task,
        }
    }

    /// Start a simulated tracker that spins a fixed synthetic rotation at
    /// the nominal sample interval — no device required.
    pub fn simulated(settings: TrackerSettings) -> Self {
        let (orientation_tx, orientation_rx) = watch::channel(Orientation::default());
        let task = tokio::spawn(sim_loop(orientation_tx, settings.beta));
        Self {
            orientation_rx,
            _task: task,
        }
    }

    /// A receiver that can await orientation updates. It reports closed when
    /// the tracking task ends.
    pub fn subscribe(&self) -> watch::Receiver<Orientation> {
        self.orientation_rx.clone()
    }
}

/// Blocking loop: read → decode → (calibrate | fuse) → publish.
fn read_loop(
    mut source: impl PacketSource,
    orientation_tx: watch::Sender<Orientation>,
    settings: TrackerSettings,
) {
    let mut fusion = SensorFusion::new(settings.beta, settings.calibration_secs);
    let mut packet_count: u64 = 0;

    if let Some(secs) = settings.calibration_secs {
        tracing::info!(secs, "Calibrating gyro — keep the headset stationary");
    }

    loop {
        let raw = match source.read_packet() {
            Ok(Some(raw)) => raw,
            // Transient empty read; poll again.
            Ok(None) => continue,
            Err(e) => {
                tracing::error!(?e, "Sensor read failed, stopping tracker");
                break;
            }
        };

        let samples = match decode_packet(&raw) {
            Ok(samples) => samples,
            Err(e) => {
                tracing::trace!(?e, "Discarding undecodable report");
                continue;
            }
        };

        if let Some(orientation) = fusion.ingest(&samples) {
            if orientation_tx.send(orientation).is_err() {
                tracing::debug!("Orientation receiver dropped, stopping tracker");
                break;
            }
        }

        packet_count += 1;
        if packet_count % 1000 == 0 {
            tracing::debug!(packet_count, "Sensor packets processed");
        }
    }
}

/// Async loop feeding the filter a constant synthetic rotation.
async fn sim_loop(orientation_tx: watch::Sender<Orientation>, beta: f64) {
    let mut fusion = SensorFusion::new(beta, None);
    let mut ticker = tokio::time::interval(Duration::from_micros(500));

    loop {
        ticker.tick().await;
        let orientation = fusion.update_raw(SIM_GYRO, SIM_ACCEL, DEFAULT_SAMPLE_INTERVAL);
        if orientation_tx.send(orientation).is_err() {
            break;
        }
    }
}
