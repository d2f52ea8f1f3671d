//! Data-URI helpers.
//!
//! Generated images travel as base64 PNG payloads and avatars arrive
//! embedded in character cards as `data:` URIs; these helpers convert
//! between the two without touching disk.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::BridgeError;

/// Mime type assumed when a data URI omits one.
const DEFAULT_MIME: &str = "image/png";

/// Wrap a raw base64 PNG payload (as returned by the diffusion
/// backend) into a data URI.
pub fn png_data_uri(payload: &str) -> String {
    format!("data:image/png;base64,{payload}")
}

/// Encode raw image bytes into a PNG data URI.
pub fn encode_png(bytes: &[u8]) -> String {
    png_data_uri(&STANDARD.encode(bytes))
}

/// Decode a base64 `data:` URI into its mime type and raw bytes.
pub fn decode(uri: &str) -> Result<(String, Vec<u8>), BridgeError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| BridgeError::DataUri("missing data: prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| BridgeError::DataUri("missing payload separator".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| BridgeError::DataUri("payload is not base64-encoded".to_string()))?;
    let mime = if mime.is_empty() { DEFAULT_MIME } else { mime };

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| BridgeError::DataUri(format!("invalid base64 payload: {e}")))?;

    Ok((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn encode_decode_round_trip() {
        let bytes = vec![0x89, 0x50, 0x4e, 0x47];
        let uri = encode_png(&bytes);
        assert!(uri.starts_with("data:image/png;base64,"));
        let (mime, decoded) = decode(&uri).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn decode_picks_up_the_declared_mime() {
        let uri = "data:image/webp;base64,AAAA";
        let (mime, _) = decode(uri).unwrap();
        assert_eq!(mime, "image/webp");
    }

    #[test]
    fn decode_defaults_mime_when_absent() {
        let uri = "data:;base64,AAAA";
        let (mime, _) = decode(uri).unwrap();
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn rejects_non_data_uri() {
        assert_matches!(
            decode("https://example.com/a.png"),
            Err(BridgeError::DataUri(_))
        );
    }

    #[test]
    fn rejects_non_base64_encoding() {
        assert_matches!(
            decode("data:text/plain,hello"),
            Err(BridgeError::DataUri(_))
        );
    }

    #[test]
    fn rejects_bad_base64_payload() {
        assert_matches!(
            decode("data:image/png;base64,!!!"),
            Err(BridgeError::DataUri(_))
        );
    }
}
