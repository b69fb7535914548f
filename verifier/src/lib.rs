//! Verification pipeline for signed frame action messages.
//!
//! `raw bytes → decode → verify → project`, each stage failing closed: a
//! failure anywhere aborts the pipeline with a typed error and no partial
//! output. The pipeline is stateless; arbitrarily many verifications may run
//! concurrently, and the only await point is the caller-injected
//! [`SignerPolicy`] lookup.

pub mod policy;
pub mod project;
pub mod verify;

pub use policy::{PolicyError, SignerPolicy, StaticSignerSet};
pub use project::{project, ProjectError, Utf8Mode};
pub use verify::{verify, verify_signature, VerifiedMessage, VerifyError};

use frameproof_types::{DecodeError, FrameData, Message};

/// Any failure along the verification pipeline, tagged by stage.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The bytes did not conform to the message schema (client bug or junk;
    /// reject, no retry).
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The message failed cryptographic or trust checks (worth logging
    /// distinctly: may indicate tampering or a downgrade attempt).
    #[error(transparent)]
    Verify(#[from] VerifyError),
    /// The message is valid but is not a frame action, or its text fields
    /// failed the configured UTF-8 mode.
    #[error(transparent)]
    Project(#[from] ProjectError),
}

/// Decode, verify, and project one frame action message.
///
/// The one-call form of the pipeline, using [`Utf8Mode::Lossy`] for text
/// fields. Pass a [`SignerPolicy`] to additionally require that the signer
/// key is registered for the claimed fid; with `None`, only the
/// cryptographic checks run. Callers needing strict UTF-8 handling compose
/// the staged functions ([`Message::decode`], [`verify`], [`project`])
/// directly.
pub async fn verify_frame_action(
    raw: &[u8],
    policy: Option<&dyn SignerPolicy>,
) -> Result<FrameData, FrameError> {
    let message = Message::decode(raw)?;
    let verified = verify::verify(message, policy).await?;
    let frame = project::project(&verified, Utf8Mode::Lossy)?;
    Ok(frame)
}
