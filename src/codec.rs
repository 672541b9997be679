// Iridium SBD Information Element codec - separates wire parsing/encoding
// from the message assembly logic.
//
// Every IE on the wire starts with a 3-byte element header (1 ID byte plus a
// big-endian u16 length that excludes the header itself). Each variant
// implements the Encodable/Decodable traits rather than having all parsing
// logic in a monolithic message parser.

use crate::datatypes::IeId;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use thiserror::Error;

/// SBD Information Element header (3 bytes, common to all IEs)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IeHeader {
    pub id: IeId,
    /// Declared length of the element body (excludes this 3-byte header).
    pub length: u16,
}

impl IeHeader {
    pub const SIZE: usize = 3;

    /// Decode an IE header from the buffer.
    ///
    /// An ID byte that matches no known variant is a hard error: the IE set
    /// is closed and the containing message must be discarded whole.
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::Incomplete);
        }

        let id_raw = buf.get_u8();
        let id = IeId::try_from(id_raw).map_err(|_| CodecError::UnknownIe(id_raw))?;
        let length = buf.get_u16();

        Ok(IeHeader { id, length })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.id as u8);
        buf.put_u16(self.length);
    }

    /// Stated length of the whole element: declared body length plus header.
    pub fn stated_len(&self) -> usize {
        self.length as usize + Self::SIZE
    }
}

/// Trait for IE variants that can be encoded to their wire form
pub trait Encodable {
    /// Encode this element (header included) into the buffer.
    ///
    /// Decode-only variants fail with [`CodecError::EncodeUnsupported`]
    /// rather than emitting placeholder bytes.
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Total encoded size, header included.
    fn encoded_len(&self) -> usize;

    /// Convert this element to bytes (convenience method).
    fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

/// Trait for IE variants that can be decoded from their wire form
pub trait Decodable: Sized {
    /// Decode the element body from the buffer, after the header.
    fn decode(header: IeHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError>;

    /// The ID byte this variant answers to.
    fn ie_id() -> IeId;

    /// Validate the header is appropriate for this variant.
    fn validate_header(header: &IeHeader) -> Result<(), CodecError> {
        if header.id != Self::ie_id() {
            return Err(CodecError::MalformedIe {
                field: "id",
                expected: Self::ie_id() as u64,
                actual: header.id as u64,
            });
        }
        Ok(())
    }
}

/// Codec errors with the expected-vs-actual context the logs need
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("incomplete element: need more data")]
    Incomplete,

    #[error("protocol revision number should be 1 and is {0:#04x}")]
    BadRevision(u8),

    #[error("unknown IE id: {0:#04x}")]
    UnknownIe(u8),

    #[error("IE body length {declared} is bigger than the remaining data count ({available})")]
    TruncatedIe { declared: usize, available: usize },

    #[error("malformed IE: {field} should be {expected} and is {actual}")]
    MalformedIe {
        field: &'static str,
        expected: u64,
        actual: u64,
    },

    #[error("invalid session status: {0:#04x}")]
    InvalidSessionStatus(u8),

    #[error("invalid confirmation status: {0:#04x}")]
    InvalidConfirmationStatus(u8),

    #[error("{0} trailing bytes after a complete message")]
    TrailingData(usize),

    #[error("encoding is not supported for the {ie} IE")]
    EncodeUnsupported { ie: &'static str },
}

/// Check a fixed-size variant's declared length against its wire constant.
///
/// Both sides are reported as stated lengths (header included), matching how
/// the Iridium gateway documentation tabulates them.
pub(crate) fn expect_stated_len(header: &IeHeader, stated: usize) -> Result<(), CodecError> {
    if header.stated_len() != stated {
        return Err(CodecError::MalformedIe {
            field: "stated length",
            expected: stated as u64,
            actual: header.stated_len() as u64,
        });
    }
    Ok(())
}

/// Decode a single byte
pub fn decode_u8(buf: &mut Cursor<&[u8]>) -> Result<u8, CodecError> {
    if buf.remaining() < 1 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u8())
}

/// Decode a 16-bit big-endian integer
pub fn decode_u16(buf: &mut Cursor<&[u8]>) -> Result<u16, CodecError> {
    if buf.remaining() < 2 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u16())
}

/// Decode a 32-bit big-endian integer
pub fn decode_u32(buf: &mut Cursor<&[u8]>) -> Result<u32, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u32())
}

/// Generic element type over the closed set of SBD IE variants.
///
/// Dispatch is a plain `match` on the tag byte: the variant set is fixed by
/// the gateway specification, so an exhaustive sum type keeps decode
/// compiler-checked and makes an unknown ID an error instead of an opaque
/// pass-through.
#[derive(Debug, Clone, PartialEq)]
pub enum InformationElement {
    MoHeader(crate::datatypes::MoHeader),
    MoPayload(crate::datatypes::MoPayload),
    MoLocation(crate::datatypes::MoLocation),
    MoConfirmation(crate::datatypes::MoConfirmation),
    MtHeader(crate::datatypes::MtHeader),
    MtPayload(crate::datatypes::MtPayload),
    MtConfirmation(crate::datatypes::MtConfirmation),
    MtPriority(crate::datatypes::MtPriority),
}

impl InformationElement {
    /// Decode one complete element from `raw`.
    ///
    /// Validates, in order: the ID byte names a known variant, the declared
    /// length agrees with the variant's fixed size where it has one, and the
    /// supplied buffer is exactly header + declared length. Any mismatch
    /// invalidates the whole containing message.
    pub fn decode(raw: &[u8]) -> Result<Self, CodecError> {
        let mut buf = Cursor::new(raw);
        let header = IeHeader::decode(&mut buf)?;

        if buf.remaining() != header.length as usize {
            return Err(CodecError::MalformedIe {
                field: "actual length",
                expected: header.stated_len() as u64,
                actual: raw.len() as u64,
            });
        }

        use crate::datatypes::*;
        let element = match header.id {
            IeId::MoHeader => Self::MoHeader(MoHeader::decode(header, &mut buf)?),
            IeId::MoPayload => Self::MoPayload(MoPayload::decode(header, &mut buf)?),
            IeId::MoLocation => Self::MoLocation(MoLocation::decode(header, &mut buf)?),
            IeId::MoConfirmation => Self::MoConfirmation(MoConfirmation::decode(header, &mut buf)?),
            IeId::MtHeader => Self::MtHeader(MtHeader::decode(header, &mut buf)?),
            IeId::MtPayload => Self::MtPayload(MtPayload::decode(header, &mut buf)?),
            IeId::MtConfirmation => Self::MtConfirmation(MtConfirmation::decode(header, &mut buf)?),
            IeId::MtPriority => Self::MtPriority(MtPriority::decode(header, &mut buf)?),
        };

        Ok(element)
    }

    /// Get the ID byte for this element
    pub fn ie_id(&self) -> IeId {
        match self {
            Self::MoHeader(_) => IeId::MoHeader,
            Self::MoPayload(_) => IeId::MoPayload,
            Self::MoLocation(_) => IeId::MoLocation,
            Self::MoConfirmation(_) => IeId::MoConfirmation,
            Self::MtHeader(_) => IeId::MtHeader,
            Self::MtPayload(_) => IeId::MtPayload,
            Self::MtConfirmation(_) => IeId::MtConfirmation,
            Self::MtPriority(_) => IeId::MtPriority,
        }
    }
}

impl Encodable for InformationElement {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        match self {
            Self::MoHeader(ie) => ie.encode(buf),
            Self::MoPayload(ie) => ie.encode(buf),
            Self::MoLocation(ie) => ie.encode(buf),
            Self::MoConfirmation(ie) => ie.encode(buf),
            Self::MtHeader(ie) => ie.encode(buf),
            Self::MtPayload(ie) => ie.encode(buf),
            Self::MtConfirmation(ie) => ie.encode(buf),
            Self::MtPriority(ie) => ie.encode(buf),
        }
    }

    fn encoded_len(&self) -> usize {
        match self {
            Self::MoHeader(ie) => ie.encoded_len(),
            Self::MoPayload(ie) => ie.encoded_len(),
            Self::MoLocation(ie) => ie.encoded_len(),
            Self::MoConfirmation(ie) => ie.encoded_len(),
            Self::MtHeader(ie) => ie.encoded_len(),
            Self::MtPayload(ie) => ie.encoded_len(),
            Self::MtConfirmation(ie) => ie.encoded_len(),
            Self::MtPriority(ie) => ie.encoded_len(),
        }
    }
}
