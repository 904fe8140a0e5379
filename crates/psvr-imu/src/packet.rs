use crate::types::ImuSample;
use thiserror::Error;

/// Size of one raw HID input report from the sensor.
pub const RAW_PACKET_LEN: usize = 64;

/// A raw sensor report, exactly as read from the device.
pub type RawPacket = [u8; RAW_PACKET_LEN];

/// Byte offsets of the two inertial sub-frames within a report.
const SUBFRAME_OFFSETS: [usize; 2] = [16, 32];
/// Each sub-frame: u32 timestamp + 3 x i16 gyro + 3 x i16 accel.
const SUBFRAME_LEN: usize = 16;

/// The accelerometer reports only the top 12 bits of each 16-bit field.
const ACCEL_SHIFT: u32 = 4;

#[derive(Debug, Error)]
pub enum PacketError {
    #[error("Sensor report too short ({len} bytes, need {RAW_PACKET_LEN})")]
    Truncated { len: usize },
}

/// Decode a raw report into its two timestamped sub-frames.
///
/// A short block is a transient condition on this device; callers are
/// expected to discard and re-poll rather than abort.
pub fn decode_packet(raw: &[u8]) -> Result<[ImuSample; 2], PacketError> {
    if raw.len() < RAW_PACKET_LEN {
        return Err(PacketError::Truncated { len: raw.len() });
    }

    Ok(SUBFRAME_OFFSETS.map(|off| decode_subframe(&raw[off..off + SUBFRAME_LEN])))
}

fn decode_subframe(bytes: &[u8]) -> ImuSample {
    let u32_at = |off: usize| -> u32 {
        u32::from_le_bytes(bytes[off..off + 4].try_into().unwrap())
    };
    let i16_at = |off: usize| -> i16 {
        i16::from_le_bytes(bytes[off..off + 2].try_into().unwrap())
    };

    ImuSample {
        timestamp: u32_at(0),
        gyro: [i16_at(4), i16_at(6), i16_at(8)],
        // Arithmetic shift keeps the sign of negative readings.
        accel: [
            i16_at(10) >> ACCEL_SHIFT,
            i16_at(12) >> ACCEL_SHIFT,
            i16_at(14) >> ACCEL_SHIFT,
        ],
    }
}
