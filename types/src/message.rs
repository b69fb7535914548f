//! Signed message envelope and its binary codec.
//!
//! A message travels as a self-describing envelope: the canonical payload
//! bytes, their digest, and a signature over that digest by the embedded
//! signer key. The payload bytes are retained verbatim on the decoded
//! envelope because re-serialization is not guaranteed to be byte-identical,
//! and the digest and signature cover the bytes as sent.
//!
//! Nothing here is trusted: decoding only establishes shape. Whether the
//! digest matches the payload and the signature matches the signer is
//! established by the verifier.

use bytes::{Buf, BufMut};
use commonware_codec::{
    varint::UInt, Encode, EncodeSize, Error, FixedSize, RangeCfg, Read, ReadExt, ReadRangeExt,
    Write,
};
use commonware_cryptography::{ed25519, Signer};

/// Length in bytes of the canonical message digest.
pub const DIGEST_LENGTH: usize = 20;

/// Maximum accepted length for the envelope hash field.
pub const MAX_HASH_LENGTH: usize = 64;

/// Maximum accepted length for the envelope signature field.
pub const MAX_SIGNATURE_LENGTH: usize = 96;

/// Maximum accepted length for the embedded signer key.
pub const MAX_SIGNER_LENGTH: usize = 64;

/// Maximum accepted length for the canonical payload.
pub const MAX_PAYLOAD_LENGTH: usize = 8192;

/// Maximum length of a frame action target URL.
pub const MAX_URL_LENGTH: usize = 1024;

/// Maximum length of free-text input attached to a frame action.
pub const MAX_INPUT_TEXT_LENGTH: usize = 256;

/// Maximum length of the opaque state blob round-tripped through a frame.
pub const MAX_STATE_LENGTH: usize = 4096;

/// Maximum length of a referenced cast hash.
pub const MAX_CAST_HASH_LENGTH: usize = 32;

/// Maximum length of a connected account address.
pub const MAX_ADDRESS_LENGTH: usize = 64;

/// Maximum length of an onchain transaction reference.
pub const MAX_TRANSACTION_ID_LENGTH: usize = 32;

/// Canonical digest of a message payload: blake3, truncated to
/// [`DIGEST_LENGTH`] bytes.
pub fn message_digest(data: &[u8]) -> [u8; DIGEST_LENGTH] {
    let mut digest = [0u8; DIGEST_LENGTH];
    digest.copy_from_slice(&blake3::hash(data).as_bytes()[..DIGEST_LENGTH]);
    digest
}

/// Failure to decode an envelope from untrusted bytes.
///
/// Every variant is terminal: no partially decoded envelope is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The buffer ended mid-field.
    #[error("message truncated")]
    Truncated,
    /// A field's declared length does not match what its scheme requires.
    #[error("invalid {field} length: expected {expected}, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A hash or signature scheme tag this implementation does not recognize.
    ///
    /// Distinct from an unrecognized body kind (which decodes, see
    /// [`Body::Unrecognized`]): scheme understanding is required to verify.
    #[error("unrecognized scheme tag {tag}")]
    UnknownScheme { tag: u8 },
    /// Any other field-level codec failure.
    #[error("malformed message: {0}")]
    Malformed(Error),
}

impl From<Error> for DecodeError {
    fn from(err: Error) -> Self {
        match err {
            Error::EndOfBuffer => Self::Truncated,
            Error::InvalidEnum(tag) => Self::UnknownScheme { tag },
            err => Self::Malformed(err),
        }
    }
}

/// Digest algorithm named by an envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum HashScheme {
    /// No digest. Decodes, but the verifier rejects it.
    None = 0,
    /// blake3 truncated to [`DIGEST_LENGTH`] bytes.
    Blake3 = 1,
}

impl TryFrom<u8> for HashScheme {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Blake3),
            tag => Err(tag),
        }
    }
}

impl Write for HashScheme {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for HashScheme {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let tag = u8::read(reader)?;
        Self::try_from(tag).map_err(Error::InvalidEnum)
    }
}

impl FixedSize for HashScheme {
    const SIZE: usize = u8::SIZE;
}

/// Signature algorithm named by an envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SignatureScheme {
    /// No signature. Decodes, but the verifier rejects it.
    None = 0,
    /// Ed25519 over the message digest.
    Ed25519 = 1,
    /// Typed-data signature by a connected account. Recognized on the wire
    /// but not implemented by the verifier.
    Eip712 = 2,
}

impl TryFrom<u8> for SignatureScheme {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Ed25519),
            2 => Ok(Self::Eip712),
            tag => Err(tag),
        }
    }
}

impl Write for SignatureScheme {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for SignatureScheme {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let tag = u8::read(reader)?;
        Self::try_from(tag).map_err(Error::InvalidEnum)
    }
}

impl FixedSize for SignatureScheme {
    const SIZE: usize = u8::SIZE;
}

/// Logical network a message is valid on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Network {
    None = 0,
    Mainnet = 1,
    Testnet = 2,
    Devnet = 3,
}

impl TryFrom<u8> for Network {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Mainnet),
            2 => Ok(Self::Testnet),
            3 => Ok(Self::Devnet),
            tag => Err(tag),
        }
    }
}

impl Write for Network {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Network {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let tag = u8::read(reader)?;
        // A message's network gates where it is valid; unlike body kinds
        // there is no forward-compatible meaning for an unknown network.
        Self::try_from(tag).map_err(|_| Error::Invalid("Network", "unrecognized network"))
    }
}

impl FixedSize for Network {
    const SIZE: usize = u8::SIZE;
}

impl serde::Serialize for Network {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> serde::Deserialize<'de> for Network {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = u8::deserialize(deserializer)?;
        Self::try_from(tag).map_err(|tag| serde::de::Error::custom(format!("unrecognized network {tag}")))
    }
}

/// Identifies a cast a frame action was performed against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastId {
    pub fid: u64,
    /// Opaque reference bytes. Rendered as hex, never interpreted.
    pub hash: Vec<u8>,
}

impl Write for CastId {
    fn write(&self, writer: &mut impl BufMut) {
        UInt(self.fid).write(writer);
        self.hash.write(writer);
    }
}

impl Read for CastId {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let fid = UInt::read(reader)?.into();
        let hash = Vec::<u8>::read_range(reader, 0..=MAX_CAST_HASH_LENGTH)?;
        Ok(Self { fid, hash })
    }
}

impl EncodeSize for CastId {
    fn encode_size(&self) -> usize {
        UInt(self.fid).encode_size() + self.hash.encode_size()
    }
}

/// A user interaction with an interactive frame embedded in a feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameActionBody {
    /// Target the action was performed against.
    pub url: Vec<u8>,
    /// 1-based index of the pressed button. Zero means no button context;
    /// the distinction belongs to the caller, this layer passes it through.
    pub button_index: u32,
    /// Cast the frame was embedded in.
    pub cast_id: CastId,
    /// Free-text input, empty when the frame has no input field.
    pub input_text: Vec<u8>,
    /// Opaque state previously issued by the frame and expected back
    /// unchanged. Never interpreted here.
    pub state: Vec<u8>,
    /// Connected external account, when the action involved one.
    pub address: Option<Vec<u8>>,
    /// Onchain transaction the action may have triggered.
    pub transaction_id: Option<Vec<u8>>,
}

impl Write for FrameActionBody {
    fn write(&self, writer: &mut impl BufMut) {
        self.url.write(writer);
        self.button_index.write(writer);
        self.cast_id.write(writer);
        self.input_text.write(writer);
        self.state.write(writer);
        self.address.write(writer);
        self.transaction_id.write(writer);
    }
}

impl Read for FrameActionBody {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let url = Vec::<u8>::read_range(reader, 0..=MAX_URL_LENGTH)?;
        let button_index = u32::read(reader)?;
        let cast_id = CastId::read(reader)?;
        let input_text = Vec::<u8>::read_range(reader, 0..=MAX_INPUT_TEXT_LENGTH)?;
        let state = Vec::<u8>::read_range(reader, 0..=MAX_STATE_LENGTH)?;
        let address =
            Option::<Vec<u8>>::read_cfg(reader, &(RangeCfg::from(0..=MAX_ADDRESS_LENGTH), ()))?;
        let transaction_id = Option::<Vec<u8>>::read_cfg(
            reader,
            &(RangeCfg::from(0..=MAX_TRANSACTION_ID_LENGTH), ()),
        )?;
        Ok(Self {
            url,
            button_index,
            cast_id,
            input_text,
            state,
            address,
            transaction_id,
        })
    }
}

impl EncodeSize for FrameActionBody {
    fn encode_size(&self) -> usize {
        self.url.encode_size()
            + u32::SIZE
            + self.cast_id.encode_size()
            + self.input_text.encode_size()
            + self.state.encode_size()
            + self.address.encode_size()
            + self.transaction_id.encode_size()
    }
}

/// Payload body, tagged by kind.
///
/// Only frame actions (kind 13) are interpreted here. Other kinds decode into
/// [`Body::Unrecognized`] so envelopes of other message types still pass
/// through envelope decoding and verification; the projector rejects them
/// when asked for a frame action specifically.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    /// Frame action (kind 13).
    FrameAction(FrameActionBody),
    /// Any other kind, preserved verbatim.
    Unrecognized { tag: u8, raw: Vec<u8> },
}

impl Body {
    /// The kind tag this body carries on the wire.
    pub fn tag(&self) -> u8 {
        match self {
            Self::FrameAction(_) => 13,
            Self::Unrecognized { tag, .. } => *tag,
        }
    }
}

impl Write for Body {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::FrameAction(body) => {
                13u8.write(writer);
                body.write(writer);
            }
            Self::Unrecognized { tag, raw } => {
                tag.write(writer);
                writer.put_slice(raw);
            }
        }
    }
}

impl Read for Body {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let tag = u8::read(reader)?;
        match tag {
            13 => Ok(Self::FrameAction(FrameActionBody::read(reader)?)),
            tag => {
                // The body is the final field of the payload: everything that
                // remains belongs to it.
                let mut raw = vec![0u8; reader.remaining()];
                reader.copy_to_slice(&mut raw);
                Ok(Self::Unrecognized { tag, raw })
            }
        }
    }
}

impl EncodeSize for Body {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::FrameAction(body) => body.encode_size(),
                Self::Unrecognized { raw, .. } => raw.len(),
            }
    }
}

/// Decoded canonical payload of a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageData {
    /// Numeric identity of the signing account.
    pub fid: u64,
    /// Seconds since the protocol epoch.
    pub timestamp: u32,
    pub network: Network,
    pub body: Body,
}

impl Write for MessageData {
    fn write(&self, writer: &mut impl BufMut) {
        UInt(self.fid).write(writer);
        self.timestamp.write(writer);
        self.network.write(writer);
        self.body.write(writer);
    }
}

impl Read for MessageData {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let fid = UInt::read(reader)?.into();
        let timestamp = u32::read(reader)?;
        let network = Network::read(reader)?;
        let body = Body::read(reader)?;
        Ok(Self {
            fid,
            timestamp,
            network,
            body,
        })
    }
}

impl EncodeSize for MessageData {
    fn encode_size(&self) -> usize {
        UInt(self.fid).encode_size() + u32::SIZE + Network::SIZE + self.body.encode_size()
    }
}

/// A signed message envelope, as received over the wire.
///
/// `data` is the decoded view of `data_bytes`; the raw bytes are what the
/// digest and signature actually cover and are kept verbatim. Nothing about
/// an envelope is trustworthy until it has passed verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub data: MessageData,
    /// Digest of `data_bytes` under `hash_scheme`. Claimed, not checked.
    pub hash: Vec<u8>,
    pub hash_scheme: HashScheme,
    /// Signature over `hash` under `signature_scheme`. Claimed, not checked.
    pub signature: Vec<u8>,
    pub signature_scheme: SignatureScheme,
    /// Public key the signature claims to be from.
    pub signer: Vec<u8>,
    /// The canonical payload exactly as signed.
    pub data_bytes: Vec<u8>,
}

impl Message {
    /// Decode one envelope from untrusted bytes.
    ///
    /// Pure function of the input; never panics. Trailing bytes after the
    /// envelope are rejected.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        if raw.is_empty() {
            return Err(DecodeError::Truncated);
        }
        let mut reader = raw;
        let message = Self::read(&mut reader)?;
        if !reader.is_empty() {
            return Err(DecodeError::Malformed(Error::Invalid(
                "Message",
                "trailing bytes",
            )));
        }
        message.validate_lengths()?;
        Ok(message)
    }

    /// Construct and sign an envelope over `data`.
    ///
    /// This is the client side of the protocol: encode the payload once,
    /// digest it, and sign the digest. The encoded bytes are retained so the
    /// envelope round-trips byte-identically.
    pub fn sign(private: &ed25519::PrivateKey, data: MessageData) -> Self {
        let data_bytes = data.encode().to_vec();
        let hash = message_digest(&data_bytes);
        let signature = private.sign(&[], &hash);

        Self {
            data,
            hash: hash.to_vec(),
            hash_scheme: HashScheme::Blake3,
            signature: signature.encode().to_vec(),
            signature_scheme: SignatureScheme::Ed25519,
            signer: private.public_key().encode().to_vec(),
            data_bytes,
        }
    }

    /// Check that field lengths match what the declared schemes require.
    ///
    /// Schemes the verifier will reject anyway (`None`, `Eip712`) impose no
    /// length requirement here.
    fn validate_lengths(&self) -> Result<(), DecodeError> {
        if self.hash_scheme == HashScheme::Blake3 && self.hash.len() != DIGEST_LENGTH {
            return Err(DecodeError::InvalidLength {
                field: "hash",
                expected: DIGEST_LENGTH,
                actual: self.hash.len(),
            });
        }
        if self.signature_scheme == SignatureScheme::Ed25519 {
            if self.signature.len() != ed25519::Signature::SIZE {
                return Err(DecodeError::InvalidLength {
                    field: "signature",
                    expected: ed25519::Signature::SIZE,
                    actual: self.signature.len(),
                });
            }
            if self.signer.len() != ed25519::PublicKey::SIZE {
                return Err(DecodeError::InvalidLength {
                    field: "signer",
                    expected: ed25519::PublicKey::SIZE,
                    actual: self.signer.len(),
                });
            }
        }
        Ok(())
    }
}

impl Write for Message {
    fn write(&self, writer: &mut impl BufMut) {
        self.hash.write(writer);
        self.hash_scheme.write(writer);
        self.signature.write(writer);
        self.signature_scheme.write(writer);
        self.signer.write(writer);
        self.data_bytes.write(writer);
    }
}

impl Read for Message {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let hash = Vec::<u8>::read_range(reader, 0..=MAX_HASH_LENGTH)?;
        let hash_scheme = HashScheme::read(reader)?;
        let signature = Vec::<u8>::read_range(reader, 0..=MAX_SIGNATURE_LENGTH)?;
        let signature_scheme = SignatureScheme::read(reader)?;
        let signer = Vec::<u8>::read_range(reader, 0..=MAX_SIGNER_LENGTH)?;
        let data_bytes = Vec::<u8>::read_range(reader, 0..=MAX_PAYLOAD_LENGTH)?;

        // Decode the payload from the retained bytes; it must consume them
        // exactly.
        let mut payload = data_bytes.as_slice();
        let data = MessageData::read(&mut payload)?;
        if !payload.is_empty() {
            return Err(Error::Invalid("MessageData", "trailing bytes"));
        }

        Ok(Self {
            data,
            hash,
            hash_scheme,
            signature,
            signature_scheme,
            signer,
            data_bytes,
        })
    }
}

impl EncodeSize for Message {
    fn encode_size(&self) -> usize {
        self.hash.encode_size()
            + HashScheme::SIZE
            + self.signature.encode_size()
            + SignatureScheme::SIZE
            + self.signer.encode_size()
            + self.data_bytes.encode_size()
    }
}
