//! Application-facing view of a verified frame action.

use serde::{Deserialize, Serialize};

use crate::message::Network;

/// Cast reference as surfaced to applications: hash rendered as lowercase,
/// unprefixed hex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCastId {
    pub fid: u64,
    pub hash: String,
}

/// The flattened, JSON-friendly result of verifying and projecting a frame
/// action message. The only artifact exposed past the verification boundary.
///
/// All hex fields are lowercase with no prefix; presentation layers may add
/// `0x`. Text fields decode per the projector's UTF-8 mode; `input_text` and
/// `state` are empty strings when the frame carried none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameData {
    pub fid: u64,
    /// Hex of the envelope hash, the canonical message identifier.
    pub message_hash: String,
    pub network: Network,
    /// Seconds since the protocol epoch.
    pub timestamp: u32,
    pub url: String,
    pub button_index: u32,
    pub input_text: String,
    pub state: String,
    pub cast_id: FrameCastId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}
