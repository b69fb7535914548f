//! Injected trust policy: is a signing key actually registered to a fid?
//!
//! Key custody is an external, time-varying fact (an onchain registry, an
//! indexer, a cache) that the verifier must not hard-code or look up on its
//! own. Callers inject a [`SignerPolicy`]; the verifier awaits it and maps
//! its outcomes onto the error taxonomy (`false` is a definitive rejection,
//! an error is a transient lookup failure).

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

/// A signer authorization lookup failed or timed out.
///
/// Transient by contract: callers may retry the whole verification, unlike a
/// definitive "signer not authorized" answer.
#[derive(Clone, Debug, thiserror::Error)]
#[error("signer lookup failed: {0}")]
pub struct PolicyError(String);

impl PolicyError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Decides whether `signer` was an authorized signing key for `fid` at
/// `timestamp` (seconds since the protocol epoch).
///
/// Implementations may perform I/O; the verifier awaits the lookup without
/// blocking concurrent verifications. Retry policy belongs to the
/// implementation or its caller, never to the verifier.
#[async_trait]
pub trait SignerPolicy: Send + Sync {
    async fn is_known_signer(
        &self,
        fid: u64,
        signer: &[u8],
        timestamp: u32,
    ) -> Result<bool, PolicyError>;
}

/// In-memory signer registry keyed by fid.
///
/// Suitable for tests and single-tenant deployments where the authorized key
/// set is known up front. Registration times are not tracked: a key is either
/// authorized for a fid or it is not. Time-varying registries implement
/// [`SignerPolicy`] directly.
#[derive(Clone, Debug, Default)]
pub struct StaticSignerSet {
    signers: HashMap<u64, HashSet<Vec<u8>>>,
}

impl StaticSignerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authorize `signer` for `fid`.
    pub fn authorize(&mut self, fid: u64, signer: impl Into<Vec<u8>>) {
        self.signers.entry(fid).or_default().insert(signer.into());
    }
}

#[async_trait]
impl SignerPolicy for StaticSignerSet {
    async fn is_known_signer(
        &self,
        fid: u64,
        signer: &[u8],
        _timestamp: u32,
    ) -> Result<bool, PolicyError> {
        Ok(self
            .signers
            .get(&fid)
            .is_some_and(|keys| keys.contains(signer)))
    }
}
