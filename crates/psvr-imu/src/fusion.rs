use crate::calibration::GyroCalibrator;
use crate::clock::SampleClock;
use crate::types::{ImuSample, Orientation, ACCEL_FACTOR, GYRO_FACTOR};
use glam::{DQuat, DVec3};

/// Strategy seam for the orientation estimator, so the gradient-descent
/// filter can be swapped for a complementary or Kalman variant without
/// touching packet decode or framing.
pub trait OrientationFilter {
    /// Advance the estimate by one observation. `gyro` in rad/s, `accel` in
    /// any consistent unit (only its direction is used), `dt` in seconds.
    fn update(&mut self, gyro: DVec3, accel: DVec3, dt: f64);

    /// Current estimate as a unit quaternion.
    fn quaternion(&self) -> DQuat;
}

/// Gradient-descent IMU fusion (Madgwick's algorithm).
///
/// Integrates the gyro rate and corrects the result toward the measured
/// gravity direction, weighted by `beta`. Higher beta converges faster but
/// follows accelerometer noise more.
pub struct Madgwick {
    q0: f64,
    q1: f64,
    q2: f64,
    q3: f64,
    beta: f64,
}

impl Madgwick {
    pub fn new(beta: f64) -> Self {
        Self {
            q0: 1.0,
            q1: 0.0,
            q2: 0.0,
            q3: 0.0,
            beta,
        }
    }
}

impl OrientationFilter for Madgwick {
    fn update(&mut self, gyro: DVec3, accel: DVec3, dt: f64) {
        // A non-positive interval carries no rotation; integrating it would
        // at best do nothing and at worst divide by zero downstream.
        if dt <= 0.0 {
            return;
        }

        let (q0, q1, q2, q3) = (self.q0, self.q1, self.q2, self.q3);
        let (gx, gy, gz) = (gyro.x, gyro.y, gyro.z);

        // Rate of change of the quaternion from the gyroscope.
        let mut qd0 = 0.5 * (-q1 * gx - q2 * gy - q3 * gz);
        let mut qd1 = 0.5 * (q0 * gx + q2 * gz - q3 * gy);
        let mut qd2 = 0.5 * (q0 * gy - q1 * gz + q3 * gx);
        let mut qd3 = 0.5 * (q0 * gz + q1 * gy - q2 * gx);

        // Accelerometer correction, skipped when the measurement is
        // degenerate (free fall or a dead axis) — gyro-only integration
        // keeps the state finite.
        let norm_sq = accel.length_squared();
        if norm_sq > f64::EPSILON {
            let a = accel / norm_sq.sqrt();

            // Objective function: error between predicted and measured
            // gravity direction.
            let f1 = 2.0 * (q1 * q3 - q0 * q2) - a.x;
            let f2 = 2.0 * (q0 * q1 + q2 * q3) - a.y;
            let f3 = 2.0 * (0.5 - q1 * q1 - q2 * q2) - a.z;

            // Gradient (Jacobian transpose times the error).
            let s0 = -2.0 * q2 * f1 + 2.0 * q1 * f2;
            let s1 = 2.0 * q3 * f1 + 2.0 * q0 * f2 - 4.0 * q1 * f3;
            let s2 = -2.0 * q0 * f1 + 2.0 * q3 * f2 - 4.0 * q2 * f3;
            let s3 = 2.0 * q1 * f1 + 2.0 * q2 * f2;

            let s_norm = (s0 * s0 + s1 * s1 + s2 * s2 + s3 * s3).sqrt();
            if s_norm > f64::EPSILON {
                qd0 -= self.beta * s0 / s_norm;
                qd1 -= self.beta * s1 / s_norm;
                qd2 -= self.beta * s2 / s_norm;
                qd3 -= self.beta * s3 / s_norm;
            }
        }

        // Integrate and re-normalize.
        let q0 = q0 + qd0 * dt;
        let q1 = q1 + qd1 * dt;
        let q2 = q2 + qd2 * dt;
        let q3 = q3 + qd3 * dt;

        let norm = (q0 * q0 + q1 * q1 + q2 * q2 + q3 * q3).sqrt();
        self.q0 = q0 / norm;
        self.q1 = q1 / norm;
        self.q2 = q2 / norm;
        self.q3 = q3 / norm;
    }

    fn quaternion(&self) -> DQuat {
        DQuat::from_xyzw(self.q1, self.q2, self.q3, self.q0)
    }
}

enum Phase {
    Calibrating(GyroCalibrator),
    Running,
}

/// The sensor-fusion pipeline stage.
///
/// Owns the rolling clock, the bias estimate, and the filter; consumes
/// decoded packets and yields orientations once past calibration. Exactly
/// one of these exists per run.
pub struct SensorFusion<F = Madgwick> {
    filter: F,
    clock: SampleClock,
    bias: DVec3,
    phase: Phase,
}

impl SensorFusion<Madgwick> {
    /// `calibration_secs`: observation window for gyro-bias compensation, or
    /// `None` to start running immediately with a zero bias.
    pub fn new(beta: f64, calibration_secs: Option<f64>) -> Self {
        Self::with_filter(Madgwick::new(beta), calibration_secs)
    }
}

impl<F: OrientationFilter> SensorFusion<F> {
    pub fn with_filter(filter: F, calibration_secs: Option<f64>) -> Self {
        let phase = match calibration_secs {
            Some(secs) => Phase::Calibrating(GyroCalibrator::new(secs)),
            None => Phase::Running,
        };
        Self {
            filter,
            clock: SampleClock::new(),
            bias: DVec3::ZERO,
            phase,
        }
    }

    pub fn is_calibrating(&self) -> bool {
        matches!(self.phase, Phase::Calibrating(_))
    }

    /// Gyro bias in effect; zero until (and unless) calibration completes.
    pub fn bias(&self) -> DVec3 {
        self.bias
    }

    /// Feed one decoded packet: two sub-frames, two chained reconciliations.
    ///
    /// Returns the updated orientation once running, `None` while the
    /// calibration window is still filling (including the packet that
    /// completes it).
    pub fn ingest(&mut self, samples: &[ImuSample; 2]) -> Option<Orientation> {
        match &mut self.phase {
            Phase::Calibrating(cal) => {
                for sample in samples {
                    let dt = self.clock.delta_seconds(sample.timestamp);
                    cal.record(sample.gyro_counts(), dt);
                }
                if cal.is_complete() {
                    self.bias = cal.bias();
                    let observed_secs = cal.elapsed_seconds();
                    self.phase = Phase::Running;
                    // The fusion phase restarts timekeeping from scratch; the
                    // first fused sample falls back to the default interval.
                    self.clock.reset();
                    tracing::info!(
                        bias_x = self.bias.x,
                        bias_y = self.bias.y,
                        bias_z = self.bias.z,
                        observed_secs,
                        "Gyro calibration complete"
                    );
                }
                None
            }
            Phase::Running => {
                for sample in samples {
                    let dt = self.clock.delta_seconds(sample.timestamp);
                    let gyro = (sample.gyro_counts() - self.bias) * GYRO_FACTOR;
                    let accel = sample.accel_counts() * ACCEL_FACTOR;
                    self.filter.update(gyro, accel, dt);
                }
                Some(Orientation {
                    quaternion: self.filter.quaternion(),
                })
            }
        }
    }

    /// Drive the filter directly, bypassing decode and timestamping. Used by
    /// the simulated producer.
    pub fn update_raw(&mut self, gyro: DVec3, accel: DVec3, dt: f64) -> Orientation {
        self.filter.update(gyro, accel, dt);
        Orientation {
            quaternion: self.filter.quaternion(),
        }
    }
}
