use crate::packet::{RawPacket, RAW_PACKET_LEN};
use crate::PacketSource;
use anyhow::{Context, Result};
use hidapi::{HidApi, HidDevice};

/// PSVR USB identifiers (Sony / PlayStation VR headset).
pub const PSVR_VID: u16 = 0x054c;
pub const PSVR_PID: u16 = 0x09af;

/// How long one read waits before reporting "no data yet".
const READ_TIMEOUT_MS: i32 = 4;

/// Sensor reports from the first HID interface of the PSVR.
pub struct HidSource {
    device: HidDevice,
}

impl HidSource {
    /// Open the first matching HID interface.
    pub fn open() -> Result<Self> {
        let api = HidApi::new().context("Failed to initialize HID backend")?;
        let device = api.open(PSVR_VID, PSVR_PID).with_context(|| {
            format!(
                "PSVR not found on USB (VID {:04x} PID {:04x}) — is the headset powered?",
                PSVR_VID, PSVR_PID
            )
        })?;

        if let Ok(Some(product)) = device.get_product_string() {
            tracing::info!(product, "Opened PSVR sensor interface");
        } else {
            tracing::info!("Opened PSVR sensor interface");
        }

        Ok(Self { device })
    }
}

impl PacketSource for HidSource {
    fn read_packet(&mut self) -> Result<Option<RawPacket>> {
        let mut buf = [0u8; RAW_PACKET_LEN];
        let n = self
            .device
            .read_timeout(&mut buf, READ_TIMEOUT_MS)
            .context("HID read failed")?;

        // Empty and short reads are routine on this device; the caller
        // re-polls on the next tick.
        if n < RAW_PACKET_LEN {
            return Ok(None);
        }
        Ok(Some(buf))
    }
}
