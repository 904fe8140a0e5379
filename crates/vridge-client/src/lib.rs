pub mod control;
pub mod frame;

pub use frame::TrackingFrame;

use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use control::{endpoint_port, ControlRequest, ControlResponse, HEAD_TRACKING_ENDPOINT};
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

/// Port of the server's control channel.
pub const CONTROL_PORT: u16 = 38219;

/// Client for the VRidge head-tracking API.
///
/// Connects to the control channel, negotiates the head-tracking data
/// endpoint, and then streams tracking frames over a dedicated
/// request/reply channel — one reply awaited per frame sent.
pub struct VridgeClient {
    control: ReqSocket,
    tracking: ReqSocket,
}

impl VridgeClient {
    /// Perform the two-step handshake and open the tracking channel.
    ///
    /// Any failure here is fatal to the run; there is no retry policy at
    /// this layer.
    pub async fn connect(server: &str) -> Result<Self> {
        let control_addr = format!("tcp://{server}:{CONTROL_PORT}");
        tracing::info!(%control_addr, "Connecting to VRidge control channel");

        let mut control = ReqSocket::new();
        control
            .connect(&control_addr)
            .await
            .with_context(|| format!("Failed to connect to {control_addr}"))?;

        let status = request(&mut control, &ControlRequest::api_status()).await?;
        tracing::debug!(?status, "Control channel status");

        let answer = request(
            &mut control,
            &ControlRequest::request_endpoint(HEAD_TRACKING_ENDPOINT),
        )
        .await?;
        tracing::debug!(?answer, "Endpoint negotiation answer");

        let endpoint = answer
            .endpoint_address
            .clone()
            .ok_or_else(|| anyhow!("Server refused the head-tracking endpoint: {answer:?}"))?;
        let tracking_addr = format!("tcp://{server}:{}", endpoint_port(&endpoint)?);

        let mut tracking = ReqSocket::new();
        tracking
            .connect(&tracking_addr)
            .await
            .with_context(|| format!("Failed to connect to {tracking_addr}"))?;
        tracing::info!(%tracking_addr, "Head-tracking channel open");

        Ok(Self { control, tracking })
    }

    /// Send one tracking frame and wait for the server's acknowledgement.
    /// The reply body is not interpreted.
    pub async fn send(&mut self, frame: &TrackingFrame) -> Result<()> {
        let payload = Bytes::copy_from_slice(&frame.encode());
        self.tracking
            .send(ZmqMessage::from(payload))
            .await
            .context("Failed to send tracking frame")?;
        let reply = self
            .tracking
            .recv()
            .await
            .context("No reply to tracking frame")?;
        tracing::trace!(parts = reply.len(), "Tracking frame acknowledged");
        Ok(())
    }

    /// Release both channels.
    pub async fn close(self) {
        self.tracking.close().await;
        self.control.close().await;
    }
}

/// One request/reply round trip on the control channel.
async fn request(socket: &mut ReqSocket, req: &ControlRequest<'_>) -> Result<ControlResponse> {
    let body = serde_json::to_string(req).context("Failed to encode control request")?;
    socket
        .send(ZmqMessage::from(body))
        .await
        .context("Failed to send control request")?;

    let reply = socket.recv().await.context("Control channel closed")?;
    let bytes = reply
        .get(0)
        .ok_or_else(|| anyhow!("Empty control reply"))?;
    serde_json::from_slice(bytes).context("Malformed control reply")
}
