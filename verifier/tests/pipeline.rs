//! End-to-end pipeline scenarios: raw bytes in, `FrameData` or a typed
//! failure out.

use commonware_codec::Encode;
use commonware_cryptography::{ed25519, Signer};
use frameproof_types::{
    Body, CastId, DecodeError, FrameActionBody, Message, MessageData, Network,
};
use frameproof_verifier::{
    verify_frame_action, FrameError, StaticSignerSet, VerifyError,
};

fn frame_action_message(private: &ed25519::PrivateKey) -> Message {
    let data = MessageData {
        fid: 2,
        timestamp: 90_000_000,
        network: Network::Mainnet,
        body: Body::FrameAction(FrameActionBody {
            url: b"https://example.com".to_vec(),
            button_index: 1,
            cast_id: CastId {
                fid: 2,
                hash: vec![0u8; 21],
            },
            input_text: Vec::new(),
            state: Vec::new(),
            address: None,
            transaction_id: None,
        }),
    };
    Message::sign(private, data)
}

#[tokio::test]
async fn accepts_well_signed_frame_action() {
    let private = ed25519::PrivateKey::from_seed(42);
    let encoded = frame_action_message(&private).encode();

    let frame = verify_frame_action(encoded.as_ref(), None)
        .await
        .expect("valid frame action verifies");

    assert_eq!(frame.fid, 2);
    assert_eq!(frame.button_index, 1);
    assert_eq!(frame.url, "https://example.com");
    assert_eq!(frame.network, Network::Mainnet);
    assert_eq!(frame.cast_id.fid, 2);
    assert_eq!(frame.cast_id.hash, "00".repeat(21));
    assert_eq!(frame.input_text, "");
    assert_eq!(frame.state, "");
    assert_eq!(frame.address, None);
    assert_eq!(frame.transaction_id, None);
}

#[tokio::test]
async fn verified_output_serializes_to_json() {
    let private = ed25519::PrivateKey::from_seed(42);
    let encoded = frame_action_message(&private).encode();

    let frame = verify_frame_action(encoded.as_ref(), None)
        .await
        .expect("valid frame action verifies");

    let json = serde_json::to_value(&frame).expect("serializable");
    assert_eq!(json["fid"], 2);
    assert_eq!(json["button_index"], 1);
    assert_eq!(json["url"], "https://example.com");
    assert_eq!(json["network"], 1);
    assert_eq!(json["cast_id"]["hash"], "00".repeat(21));
}

#[tokio::test]
async fn rejects_empty_buffer() {
    assert!(matches!(
        verify_frame_action(&[], None).await,
        Err(FrameError::Decode(DecodeError::Truncated))
    ));
}

#[tokio::test]
async fn rejects_every_payload_bit_flip_after_signing() {
    let private = ed25519::PrivateKey::from_seed(42);
    let message = frame_action_message(&private);

    // Flipping any bit of the signed payload must fail closed. Sample every
    // byte rather than every bit to keep the sweep quick.
    for index in 0..message.data_bytes.len() {
        let mut tampered = message.clone();
        tampered.data_bytes[index] ^= 0x01;
        let result = verify_frame_action(tampered.encode().as_ref(), None).await;
        assert!(
            matches!(
                result,
                Err(FrameError::Verify(
                    VerifyError::HashMismatch | VerifyError::BadSignature
                )) | Err(FrameError::Decode(_)),
            ),
            "tampered payload byte {index} must not verify"
        );
    }
}

#[tokio::test]
async fn rejects_wrong_key_signature() {
    let signing = ed25519::PrivateKey::from_seed(42);
    let claimed = ed25519::PrivateKey::from_seed(43);

    let mut message = frame_action_message(&signing);
    message.signer = claimed.public_key().encode().to_vec();

    assert!(matches!(
        verify_frame_action(message.encode().as_ref(), None).await,
        Err(FrameError::Verify(VerifyError::BadSignature))
    ));
}

#[tokio::test]
async fn rejects_unregistered_signer() {
    let private = ed25519::PrivateKey::from_seed(42);
    let encoded = frame_action_message(&private).encode();

    // Correctly signed, but the policy has never seen this key.
    let policy = StaticSignerSet::new();
    assert!(matches!(
        verify_frame_action(encoded.as_ref(), Some(&policy)).await,
        Err(FrameError::Verify(VerifyError::UntrustedSigner))
    ));
}

#[tokio::test]
async fn accepts_registered_signer() {
    let private = ed25519::PrivateKey::from_seed(42);
    let message = frame_action_message(&private);

    let mut policy = StaticSignerSet::new();
    policy.authorize(2, message.signer.clone());

    let frame = verify_frame_action(message.encode().as_ref(), Some(&policy))
        .await
        .expect("registered signer verifies");
    assert_eq!(frame.fid, 2);
}

#[tokio::test]
async fn projection_is_deterministic_across_calls() {
    let private = ed25519::PrivateKey::from_seed(42);
    let encoded = frame_action_message(&private).encode();

    let first = verify_frame_action(encoded.as_ref(), None).await.expect("verifies");
    let second = verify_frame_action(encoded.as_ref(), None).await.expect("verifies");
    assert_eq!(first, second);
}

#[tokio::test]
async fn routes_other_message_kinds_to_wrong_body_type() {
    let private = ed25519::PrivateKey::from_seed(42);
    let data = MessageData {
        fid: 2,
        timestamp: 90_000_000,
        network: Network::Mainnet,
        body: Body::Unrecognized {
            tag: 1,
            raw: vec![0x01, 0x02, 0x03],
        },
    };
    let encoded = Message::sign(&private, data).encode();

    assert!(matches!(
        verify_frame_action(encoded.as_ref(), None).await,
        Err(FrameError::Project(_))
    ));
}
