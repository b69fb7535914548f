//! Projection of a verified envelope into the application-facing
//! [`FrameData`].

use frameproof_types::{Body, FrameCastId, FrameData};

use crate::verify::VerifiedMessage;

/// How byte-to-text fields (`url`, `input_text`, `state`) are decoded.
///
/// These are opaque application payloads, not protocol-critical fields, so
/// lenient decoding is the historical behavior; but `state` is round-tripped
/// application data, so the choice is explicit rather than silently lossy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Utf8Mode {
    /// Best-effort: invalid sequences become replacement characters.
    #[default]
    Lossy,
    /// Reject payloads whose text fields are not valid UTF-8.
    Strict,
}

/// Failure to project a verified envelope.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// The envelope is validly signed but carries some other body kind.
    /// Not an attack; the caller decides how to route it.
    #[error("message body is not a frame action (kind {tag})")]
    WrongBodyType { tag: u8 },
    /// A text field was not valid UTF-8 under [`Utf8Mode::Strict`].
    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },
}

/// Project a verified frame action into [`FrameData`].
///
/// Deterministic and pure: the same verified envelope always projects to the
/// same output. Hex fields are lowercase with no prefix. `button_index` is
/// passed through raw; zero-versus-absent is a caller convention.
pub fn project(verified: &VerifiedMessage, utf8: Utf8Mode) -> Result<FrameData, ProjectError> {
    let message = verified.message();
    let body = match &message.data.body {
        Body::FrameAction(body) => body,
        Body::Unrecognized { tag, .. } => {
            return Err(ProjectError::WrongBodyType { tag: *tag })
        }
    };

    Ok(FrameData {
        fid: message.data.fid,
        message_hash: hex::encode(&message.hash),
        network: message.data.network,
        timestamp: message.data.timestamp,
        url: decode_text(&body.url, utf8, "url")?,
        button_index: body.button_index,
        input_text: decode_text(&body.input_text, utf8, "input_text")?,
        state: decode_text(&body.state, utf8, "state")?,
        cast_id: FrameCastId {
            fid: body.cast_id.fid,
            hash: hex::encode(&body.cast_id.hash),
        },
        address: body.address.as_ref().map(hex::encode),
        transaction_id: body.transaction_id.as_ref().map(hex::encode),
    })
}

fn decode_text(
    bytes: &[u8],
    utf8: Utf8Mode,
    field: &'static str,
) -> Result<String, ProjectError> {
    match utf8 {
        Utf8Mode::Lossy => Ok(String::from_utf8_lossy(bytes).into_owned()),
        Utf8Mode::Strict => std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| ProjectError::InvalidUtf8 { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::verify_signature;
    use commonware_cryptography::ed25519;
    use commonware_cryptography::Signer;
    use frameproof_types::{CastId, FrameActionBody, Message, MessageData, Network};

    fn verified_fixture(body: Body) -> VerifiedMessage {
        let private = ed25519::PrivateKey::from_seed(1);
        let data = MessageData {
            fid: 2,
            timestamp: 90_000_000,
            network: Network::Mainnet,
            body,
        };
        verify_signature(Message::sign(&private, data)).expect("fixture verifies")
    }

    fn frame_action(input_text: Vec<u8>) -> Body {
        Body::FrameAction(FrameActionBody {
            url: b"https://example.com".to_vec(),
            button_index: 1,
            cast_id: CastId {
                fid: 2,
                hash: vec![0u8; 20],
            },
            input_text,
            state: Vec::new(),
            address: Some(vec![0xDE, 0xAD, 0xBE, 0xEF]),
            transaction_id: None,
        })
    }

    #[test]
    fn projects_frame_action_fields() {
        let verified = verified_fixture(frame_action(b"gm".to_vec()));
        let frame = project(&verified, Utf8Mode::default()).expect("projects");

        assert_eq!(frame.fid, 2);
        assert_eq!(frame.network, Network::Mainnet);
        assert_eq!(frame.timestamp, 90_000_000);
        assert_eq!(frame.url, "https://example.com");
        assert_eq!(frame.button_index, 1);
        assert_eq!(frame.input_text, "gm");
        assert_eq!(frame.state, "");
        assert_eq!(frame.cast_id.fid, 2);
        assert_eq!(frame.cast_id.hash, "00".repeat(20));
        assert_eq!(frame.message_hash, hex::encode(&verified.message().hash));
        assert_eq!(frame.address.as_deref(), Some("deadbeef"));
        assert_eq!(frame.transaction_id, None);
    }

    #[test]
    fn projection_is_idempotent() {
        let verified = verified_fixture(frame_action(b"gm".to_vec()));
        let first = project(&verified, Utf8Mode::Lossy).expect("projects");
        let second = project(&verified, Utf8Mode::Lossy).expect("projects");
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_other_body_kinds() {
        let verified = verified_fixture(Body::Unrecognized {
            tag: 1,
            raw: vec![0xAA],
        });
        assert!(matches!(
            project(&verified, Utf8Mode::Lossy),
            Err(ProjectError::WrongBodyType { tag: 1 })
        ));
    }

    #[test]
    fn lossy_mode_tolerates_invalid_utf8() {
        let verified = verified_fixture(frame_action(vec![0xFF, 0xFE]));
        let frame = project(&verified, Utf8Mode::Lossy).expect("lossy projection succeeds");
        assert_eq!(frame.input_text, "\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn strict_mode_rejects_invalid_utf8() {
        let verified = verified_fixture(frame_action(vec![0xFF, 0xFE]));
        assert!(matches!(
            project(&verified, Utf8Mode::Strict),
            Err(ProjectError::InvalidUtf8 {
                field: "input_text"
            })
        ));
    }
}
