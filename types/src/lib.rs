pub mod frame;
pub mod message;

pub use frame::{FrameCastId, FrameData};
pub use message::{
    message_digest, Body, CastId, DecodeError, FrameActionBody, HashScheme, Message, MessageData,
    Network, SignatureScheme, DIGEST_LENGTH,
};

/// Unix timestamp (seconds) of the protocol epoch (2021-01-01T00:00:00Z).
/// Message timestamps count seconds from this instant.
pub const EPOCH_UNIX_SECS: u64 = 1_609_459_200;

/// Convert a Unix timestamp in seconds to an epoch-relative message timestamp.
///
/// Returns `None` for instants before the protocol epoch or beyond the range
/// of a `u32` timestamp.
pub fn protocol_timestamp(unix_secs: u64) -> Option<u32> {
    let elapsed = unix_secs.checked_sub(EPOCH_UNIX_SECS)?;
    u32::try_from(elapsed).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_timestamp_rejects_pre_epoch_instants() {
        assert_eq!(protocol_timestamp(0), None);
        assert_eq!(protocol_timestamp(EPOCH_UNIX_SECS - 1), None);
    }

    #[test]
    fn protocol_timestamp_is_epoch_relative() {
        assert_eq!(protocol_timestamp(EPOCH_UNIX_SECS), Some(0));
        assert_eq!(protocol_timestamp(EPOCH_UNIX_SECS + 12_345), Some(12_345));
    }
}
