use crate::types::GYRO_FACTOR;
use glam::DVec3;

/// Default stationary-observation window, in accumulated sensor seconds.
pub const DEFAULT_CALIBRATION_SECS: f64 = 5.0;

/// Accumulates stationary gyro readings to estimate the per-axis bias.
///
/// Fed every sub-frame until the accumulated sensor time passes the window,
/// then consumed once for its bias. The bias carries the counts→radians
/// factor baked in and is subtracted from raw counts upstream of that same
/// conversion, matching the consumer this sensor path was built against.
#[derive(Debug)]
pub struct GyroCalibrator {
    summed_counts: DVec3,
    elapsed: f64,
    window: f64,
}

impl GyroCalibrator {
    pub fn new(window_secs: f64) -> Self {
        Self {
            summed_counts: DVec3::ZERO,
            elapsed: 0.0,
            window: window_secs,
        }
    }

    /// Record one sub-frame's raw gyro counts and its reconciled interval.
    pub fn record(&mut self, gyro_counts: DVec3, dt: f64) {
        self.summed_counts += gyro_counts;
        self.elapsed += dt;
    }

    /// Whether the observation window has been filled.
    pub fn is_complete(&self) -> bool {
        self.elapsed > self.window
    }

    /// Seconds of sensor time observed so far.
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed
    }

    /// Per-axis bias: (summed counts × per-axis factor) / elapsed seconds.
    pub fn bias(&self) -> DVec3 {
        self.summed_counts * GYRO_FACTOR / self.elapsed
    }
}
