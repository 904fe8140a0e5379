use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Control-channel protocol version.
const CONTROL_PROTOCOL_VERSION: u32 = 1;

/// Request codes understood by the control channel.
const CODE_REQUEST_ENDPOINT: u32 = 1;
const CODE_API_STATUS: u32 = 2;

/// The data channel this client asks the server to expose.
pub const HEAD_TRACKING_ENDPOINT: &str = "HeadTracking";

/// A control-channel request. Field names are the wire contract.
#[derive(Debug, Serialize)]
pub struct ControlRequest<'a> {
    #[serde(rename = "RequestedEndpointName", skip_serializing_if = "Option::is_none")]
    pub requested_endpoint_name: Option<&'a str>,
    #[serde(rename = "ProtocolVersion")]
    pub protocol_version: u32,
    #[serde(rename = "Code")]
    pub code: u32,
}

impl ControlRequest<'static> {
    /// Opening query: server status, no endpoint requested.
    pub fn api_status() -> Self {
        Self {
            requested_endpoint_name: None,
            protocol_version: CONTROL_PROTOCOL_VERSION,
            code: CODE_API_STATUS,
        }
    }
}

impl<'a> ControlRequest<'a> {
    /// Ask the server to expose a named data endpoint.
    pub fn request_endpoint(name: &'a str) -> Self {
        Self {
            requested_endpoint_name: Some(name),
            protocol_version: CONTROL_PROTOCOL_VERSION,
            code: CODE_REQUEST_ENDPOINT,
        }
    }
}

/// A control-channel reply. Servers vary in which fields they fill in, so
/// everything is optional and unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct ControlResponse {
    #[serde(rename = "ProtocolVersion")]
    pub protocol_version: Option<u32>,
    #[serde(rename = "Code")]
    pub code: Option<i32>,
    #[serde(rename = "EndpointAddress")]
    pub endpoint_address: Option<String>,
}

/// Extract the port from an endpoint address such as `tcp://*:38220`.
///
/// The host part is not routable from here (the server may bind a wildcard),
/// so only the port is taken; the caller reuses the host it already knows.
pub fn endpoint_port(endpoint: &str) -> Result<u16> {
    let port = endpoint
        .rsplit(':')
        .next()
        .ok_or_else(|| anyhow!("Endpoint address has no port: {endpoint:?}"))?;
    port.parse()
        .with_context(|| format!("Endpoint address has a malformed port: {endpoint:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_request_matches_the_wire_shape() {
        let value = serde_json::to_value(ControlRequest::api_status()).unwrap();
        assert_eq!(value, json!({ "ProtocolVersion": 1, "Code": 2 }));
    }

    #[test]
    fn endpoint_request_matches_the_wire_shape() {
        let value =
            serde_json::to_value(ControlRequest::request_endpoint(HEAD_TRACKING_ENDPOINT))
                .unwrap();
        assert_eq!(
            value,
            json!({
                "RequestedEndpointName": "HeadTracking",
                "ProtocolVersion": 1,
                "Code": 1,
            })
        );
    }

    #[test]
    fn response_tolerates_missing_and_unknown_fields() {
        let r: ControlResponse =
            serde_json::from_str(r#"{"Code":0,"InUseBy":"nobody"}"#).unwrap();
        assert_eq!(r.code, Some(0));
        assert!(r.endpoint_address.is_none());
        assert!(r.protocol_version.is_none());
    }

    #[test]
    fn port_is_taken_from_the_last_colon() {
        assert_eq!(endpoint_port("tcp://*:38220").unwrap(), 38220);
        assert_eq!(endpoint_port("tcp://192.168.0.10:40123").unwrap(), 40123);
        assert!(endpoint_port("tcp://no-port").is_err());
    }
}
