use glam::{DQuat, DVec3};

/// Nominal gyroscope range: ±250 °/s mapped across the signed 16-bit span.
pub const GYRO_RANGE_DEG_S: f64 = 250.0;

/// Gyro counts → rad/s.
pub const GYRO_SCALE_RAD: f64 =
    (GYRO_RANGE_DEG_S / 32768.0) * (std::f64::consts::PI / 180.0);

/// Per-axis gyro conversion. Axis conventions:
/// 0 = yaw (positive turning right-hand forward), 1 = pitch (positive looking
/// up), 2 = roll (positive right-hand down, hence the sign flip).
pub const GYRO_FACTOR: DVec3 = DVec3::new(GYRO_SCALE_RAD, GYRO_SCALE_RAD, -GYRO_SCALE_RAD);

/// Per-axis accelerometer polarity. Axis conventions:
/// 0 = head up positive, 1 = right positive, 2 = front positive.
pub const ACCEL_FACTOR: DVec3 = DVec3::new(1.0, 1.0, -1.0);

/// One decoded inertial sub-frame.
///
/// `timestamp` is the sensor's rolling microsecond counter (24 bits
/// significant). Angular rate and acceleration are raw signed counts; the
/// acceleration counts already have the 4-bit shift applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImuSample {
    pub timestamp: u32,
    pub gyro: [i16; 3],
    pub accel: [i16; 3],
}

impl ImuSample {
    pub fn gyro_counts(&self) -> DVec3 {
        DVec3::new(
            f64::from(self.gyro[0]),
            f64::from(self.gyro[1]),
            f64::from(self.gyro[2]),
        )
    }

    pub fn accel_counts(&self) -> DVec3 {
        DVec3::new(
            f64::from(self.accel[0]),
            f64::from(self.accel[1]),
            f64::from(self.accel[2]),
        )
    }
}

/// Fused head orientation.
#[derive(Debug, Clone, Copy)]
pub struct Orientation {
    /// Absolute orientation as a unit quaternion.
    pub quaternion: DQuat,
}

impl Default for Orientation {
    fn default() -> Self {
        Self {
            quaternion: DQuat::IDENTITY,
        }
    }
}

impl Orientation {
    /// Euler angles (yaw, pitch, roll) in radians, intrinsic Z-Y'-X''.
    ///
    /// Derived from the same quaternion state, so the two representations
    /// never disagree.
    pub fn yaw_pitch_roll(&self) -> (f64, f64, f64) {
        let q = self.quaternion;
        let (w, x, y, z) = (q.w, q.x, q.y, q.z);

        let yaw = (2.0 * (w * z - x * y)).atan2(1.0 - 2.0 * (y * y + z * z));
        let pitch = (2.0 * (w * y + z * x)).clamp(-1.0, 1.0).asin();
        let roll = (2.0 * (w * x - y * z)).atan2(1.0 - 2.0 * (x * x + y * y));

        (yaw, pitch, roll)
    }
}
