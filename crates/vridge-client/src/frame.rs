use glam::Quat;

/// Head-tracking protocol version.
const PROTOCOL_VERSION: u32 = 2;

/// Declared payload length, identical for every task type.
const DATA_LENGTH: u32 = 24;

/// version + type + length tags.
const HEADER_LEN: usize = 12;
/// Fixed zero-padded data area following the tags.
const DATA_AREA_LEN: usize = 64;

/// Total size of one tracking frame on the wire.
pub const FRAME_LEN: usize = HEADER_LEN + DATA_AREA_LEN;

/// One head-tracking update, in the layout the server consumes.
///
/// Three task types share the tag + padded-data shape and differ only in
/// payload arity, so a single encoder dispatches on the variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackingFrame {
    /// SendRadRotationAndPosition: Euler angles in radians.
    Angles {
        pitch: f32,
        yaw: f32,
        roll: f32,
        position: [f32; 3],
    },
    /// SendQuaternionRotationAndPosition. Encoded parameter order is
    /// (y, z, x, w) — the server's convention, not the internal one.
    Quaternion { quaternion: Quat, position: [f32; 3] },
    /// SendPosition: position only.
    Position { position: [f32; 3] },
}

impl TrackingFrame {
    fn task_type(&self) -> u32 {
        match self {
            TrackingFrame::Angles { .. } => 3,
            TrackingFrame::Quaternion { .. } => 4,
            TrackingFrame::Position { .. } => 5,
        }
    }

    fn payload(&self) -> ([f32; 7], usize) {
        let mut values = [0.0f32; 7];
        let count = match *self {
            TrackingFrame::Angles {
                pitch,
                yaw,
                roll,
                position,
            } => {
                values[..3].copy_from_slice(&[pitch, yaw, roll]);
                values[3..6].copy_from_slice(&position);
                6
            }
            TrackingFrame::Quaternion {
                quaternion,
                position,
            } => {
                values[..4].copy_from_slice(&[
                    quaternion.y,
                    quaternion.z,
                    quaternion.x,
                    quaternion.w,
                ]);
                values[4..7].copy_from_slice(&position);
                7
            }
            TrackingFrame::Position { position } => {
                values[..3].copy_from_slice(&position);
                3
            }
        };
        (values, count)
    }

    /// Serialize to the fixed wire layout: little-endian tags, then the
    /// payload floats, then zeroes through the end of the data area.
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut out = [0u8; FRAME_LEN];
        out[0..4].copy_from_slice(&PROTOCOL_VERSION.to_le_bytes());
        out[4..8].copy_from_slice(&self.task_type().to_le_bytes());
        out[8..12].copy_from_slice(&DATA_LENGTH.to_le_bytes());

        let (values, count) = self.payload();
        for (i, value) in values[..count].iter().enumerate() {
            let off = HEADER_LEN + i * 4;
            out[off..off + 4].copy_from_slice(&value.to_le_bytes());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_at(frame: &[u8], index: usize) -> f32 {
        let off = HEADER_LEN + index * 4;
        f32::from_le_bytes(frame[off..off + 4].try_into().unwrap())
    }

    fn tags(frame: &[u8]) -> (u32, u32, u32) {
        (
            u32::from_le_bytes(frame[0..4].try_into().unwrap()),
            u32::from_le_bytes(frame[4..8].try_into().unwrap()),
            u32::from_le_bytes(frame[8..12].try_into().unwrap()),
        )
    }

    #[test]
    fn angles_frame_layout() {
        let frame = TrackingFrame::Angles {
            pitch: 0.25,
            yaw: -1.5,
            roll: 3.0,
            position: [1.0, 2.0, 3.0],
        }
        .encode();

        assert_eq!(frame.len(), 76);
        assert_eq!(tags(&frame), (2, 3, 24));
        for (i, expected) in [0.25f32, -1.5, 3.0, 1.0, 2.0, 3.0].iter().enumerate() {
            assert_eq!(f32_at(&frame, i), *expected);
        }
        assert!(frame[HEADER_LEN + 24..].iter().all(|b| *b == 0));
    }

    #[test]
    fn quaternion_frame_reorders_components() {
        let frame = TrackingFrame::Quaternion {
            quaternion: Quat::from_xyzw(0.1, 0.2, 0.3, 0.4),
            position: [7.0, 8.0, 9.0],
        }
        .encode();

        assert_eq!(tags(&frame), (2, 4, 24));
        // Wire order: y, z, x, w.
        for (i, expected) in [0.2f32, 0.3, 0.1, 0.4, 7.0, 8.0, 9.0].iter().enumerate() {
            assert_eq!(f32_at(&frame, i), *expected);
        }
        assert!(frame[HEADER_LEN + 28..].iter().all(|b| *b == 0));
    }

    #[test]
    fn position_frame_layout() {
        let frame = TrackingFrame::Position {
            position: [0.5, -0.5, 2.0],
        }
        .encode();

        assert_eq!(tags(&frame), (2, 5, 24));
        for (i, expected) in [0.5f32, -0.5, 2.0].iter().enumerate() {
            assert_eq!(f32_at(&frame, i), *expected);
        }
        assert!(frame[HEADER_LEN + 12..].iter().all(|b| *b == 0));
    }
}
