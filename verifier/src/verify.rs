//! Cryptographic verification of a decoded envelope.
//!
//! Three checks, earliest failure wins: the payload digest must match the
//! envelope hash (constant-time comparison), the signature must verify over
//! that hash under the embedded signer key, and, when the caller supplies a
//! trust policy, the signer key must be authorized for the claimed fid.
//! Success is witnessed by a [`VerifiedMessage`], which cannot be
//! constructed any other way.

use commonware_codec::DecodeExt;
use commonware_cryptography::{ed25519, Verifier as _};
use frameproof_types::{message_digest, HashScheme, Message, SignatureScheme};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::policy::{PolicyError, SignerPolicy};

/// Failure to verify an envelope. All variants are terminal.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The envelope names a hash scheme this verifier does not implement.
    #[error("unsupported hash scheme {0:?}")]
    UnsupportedHashScheme(HashScheme),
    /// The envelope hash is not the digest of its payload.
    #[error("hash does not match payload digest")]
    HashMismatch,
    /// The envelope names a signature scheme this verifier does not
    /// implement.
    #[error("unsupported signature scheme {0:?}")]
    UnsupportedSignatureScheme(SignatureScheme),
    /// The signature does not verify under the embedded signer key.
    #[error("signature verification failed")]
    BadSignature,
    /// The signer key is not authorized for the claimed fid. Definitive; do
    /// not retry.
    #[error("signer not authorized for fid")]
    UntrustedSigner,
    /// Signer authorization could not be determined. Transient; the caller
    /// may retry.
    #[error(transparent)]
    TrustLookupFailed(#[from] PolicyError),
}

/// An envelope that passed verification.
///
/// Only the verify functions construct one: holding a `VerifiedMessage`
/// proves the digest, signature, and (if a policy was supplied) signer
/// authorization checks all passed. Carries the message unchanged.
#[derive(Clone, Debug)]
pub struct VerifiedMessage {
    message: Message,
}

impl VerifiedMessage {
    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn into_inner(self) -> Message {
        self.message
    }
}

/// Run the synchronous cryptographic checks (digest and signature).
///
/// Signer authorization is not checked; see [`verify`] for the full
/// pipeline including the injected trust policy.
pub fn verify_signature(message: Message) -> Result<VerifiedMessage, VerifyError> {
    // Recompute the digest of the payload as sent. The hash is the canonical
    // message identifier, so it must be self-consistent even though the
    // signature also covers the same payload indirectly.
    let digest = match message.hash_scheme {
        HashScheme::Blake3 => message_digest(&message.data_bytes),
        scheme => {
            warn!(?scheme, "rejected message with unsupported hash scheme");
            return Err(VerifyError::UnsupportedHashScheme(scheme));
        }
    };
    if !bool::from(digest.as_slice().ct_eq(message.hash.as_slice())) {
        warn!(fid = message.data.fid, "rejected message with mismatched hash");
        return Err(VerifyError::HashMismatch);
    }

    // The signature covers the digest, not the raw payload.
    match message.signature_scheme {
        SignatureScheme::Ed25519 => {
            let Ok(public) = ed25519::PublicKey::decode(message.signer.as_slice()) else {
                warn!(fid = message.data.fid, "rejected message with invalid signer key");
                return Err(VerifyError::BadSignature);
            };
            let Ok(signature) = ed25519::Signature::decode(message.signature.as_slice()) else {
                warn!(fid = message.data.fid, "rejected message with invalid signature bytes");
                return Err(VerifyError::BadSignature);
            };
            if !public.verify(&[], &message.hash, &signature) {
                warn!(fid = message.data.fid, "rejected message with bad signature");
                return Err(VerifyError::BadSignature);
            }
        }
        scheme => {
            warn!(?scheme, "rejected message with unsupported signature scheme");
            return Err(VerifyError::UnsupportedSignatureScheme(scheme));
        }
    }

    debug!(fid = message.data.fid, "message signature verified");
    Ok(VerifiedMessage { message })
}

/// Verify an envelope: digest, signature, and (when `policy` is supplied)
/// signer authorization.
///
/// The policy lookup is the pipeline's only await point; everything else is
/// pure computation on resident bytes.
pub async fn verify<P>(message: Message, policy: Option<&P>) -> Result<VerifiedMessage, VerifyError>
where
    P: SignerPolicy + ?Sized,
{
    let verified = verify_signature(message)?;

    if let Some(policy) = policy {
        let message = verified.message();
        let authorized = policy
            .is_known_signer(message.data.fid, &message.signer, message.data.timestamp)
            .await?;
        if !authorized {
            warn!(fid = message.data.fid, "rejected message from unauthorized signer");
            return Err(VerifyError::UntrustedSigner);
        }
    }

    Ok(verified)
}
