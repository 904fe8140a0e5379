//! End-to-end checks of the decode → reconcile → calibrate → fuse pipeline
//! over synthetic sensor reports.

use psvr_imu::fusion::SensorFusion;
use psvr_imu::packet::{decode_packet, RawPacket, RAW_PACKET_LEN};

/// Build a 64-byte report carrying two sub-frames.
fn make_report(frames: [(u32, [i16; 3], [i16; 3]); 2]) -> RawPacket {
    let mut raw = [0u8; RAW_PACKET_LEN];
    for (i, (ts, gyro, accel)) in frames.into_iter().enumerate() {
        let base = 16 + i * 16;
        raw[base..base + 4].copy_from_slice(&ts.to_le_bytes());
        for (axis, v) in gyro.into_iter().enumerate() {
            let off = base + 4 + axis * 2;
            raw[off..off + 2].copy_from_slice(&v.to_le_bytes());
        }
        for (axis, v) in accel.into_iter().enumerate() {
            // Pre-shift so the decoded value comes back as written.
            let off = base + 10 + axis * 2;
            raw[off..off + 2].copy_from_slice(&(v << 4).to_le_bytes());
        }
    }
    raw
}

/// A stream of reports with 500 µs sub-frame spacing, wrapping the 24-bit
/// counter like the hardware does.
struct ReportStream {
    next_timestamp: u32,
    gyro: [i16; 3],
    accel: [i16; 3],
}

impl ReportStream {
    fn new(gyro: [i16; 3], accel: [i16; 3]) -> Self {
        Self {
            next_timestamp: 0,
            gyro,
            accel,
        }
    }

    fn next(&mut self) -> RawPacket {
        let t1 = self.next_timestamp;
        let t2 = (t1 + 500) % (1 << 24);
        self.next_timestamp = (t2 + 500) % (1 << 24);
        make_report([(t1, self.gyro, self.accel), (t2, self.gyro, self.accel)])
    }
}

fn quat_norm(o: psvr_imu::types::Orientation) -> f64 {
    let q = o.quaternion;
    (q.w * q.w + q.x * q.x + q.y * q.y + q.z * q.z).sqrt()
}

#[test]
fn uncalibrated_pipeline_yields_orientation_immediately() {
    let mut stream = ReportStream::new([0, 0, 0], [0, 0, 64]);
    let mut fusion = SensorFusion::new(0.1, None);

    let samples = decode_packet(&stream.next()).unwrap();
    let orientation = fusion.ingest(&samples).expect("running from the first packet");
    assert!((quat_norm(orientation) - 1.0).abs() < 1e-9);
}

#[test]
fn calibration_holds_fusion_until_the_window_fills() {
    // Each report advances sensor time by ~1 ms; 5 s needs 5000 of them.
    let mut stream = ReportStream::new([40, -12, 7], [0, 0, 64]);
    let mut fusion = SensorFusion::new(0.1, Some(5.0));

    let mut completed_at = None;
    for i in 0..5_100 {
        let samples = decode_packet(&stream.next()).unwrap();
        let out = fusion.ingest(&samples);
        if fusion.is_calibrating() {
            assert!(out.is_none(), "no orientation during calibration (packet {i})");
        } else if completed_at.is_none() {
            completed_at = Some(i);
        }
    }

    let completed_at = completed_at.expect("calibration should have completed");
    // Each packet accumulates 1 ms of sensor time, so the window is passed
    // around the 5001st packet (give or take float accumulation).
    assert!((4_999..=5_001).contains(&completed_at));

    // The observed constant rate became the bias, per-axis signs applied.
    let bias = fusion.bias();
    assert!(bias.x > 0.0 && bias.y < 0.0 && bias.z < 0.0);

    // And the next packet fuses.
    let samples = decode_packet(&stream.next()).unwrap();
    assert!(fusion.ingest(&samples).is_some());
}

#[test]
fn calibrated_bias_nulls_a_constant_rotation_rate() {
    let gyro = [120, -60, 30];
    let mut stream = ReportStream::new(gyro, [0, 0, 64]);

    let mut fusion = SensorFusion::new(0.0, Some(5.0));
    for _ in 0..5_100 {
        let samples = decode_packet(&stream.next()).unwrap();
        fusion.ingest(&samples);
    }
    assert!(!fusion.is_calibrating());

    // With beta = 0 (no accelerometer pull) and the bias subtracted, the
    // same constant rate should integrate to almost no rotation.
    let mut last = None;
    for _ in 0..1_000 {
        let samples = decode_packet(&stream.next()).unwrap();
        last = fusion.ingest(&samples);
    }
    let q = last.unwrap().quaternion;
    assert!((q.w.abs() - 1.0).abs() < 1e-4, "drifted: {q:?}");
}

#[test]
fn pipeline_survives_the_timestamp_wrap() {
    let mut stream = ReportStream::new([0, 0, 0], [0, 0, 64]);
    // Park the stream just below the 24-bit boundary.
    stream.next_timestamp = (1 << 24) - 700;

    let mut fusion = SensorFusion::new(0.1, None);
    let mut last = None;
    for _ in 0..10 {
        let samples = decode_packet(&stream.next()).unwrap();
        last = fusion.ingest(&samples);
    }

    let q = last.unwrap().quaternion;
    for c in [q.w, q.x, q.y, q.z] {
        assert!(c.is_finite());
    }
    assert!((quat_norm(psvr_imu::types::Orientation { quaternion: q }) - 1.0).abs() < 1e-9);
}
