use crate::codec::{CodecError, Decodable, Encodable, IeHeader};
use crate::datatypes::IeId;
use bytes::{Buf, Bytes, BytesMut};
use std::io::Cursor;

/// MO Payload IE (0x02) - the opaque mobile-originated burst content.
///
/// The relay never interprets these bytes; downstream consumers decode them
/// as MAVLink or whatever else the flight software packed in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoPayload {
    pub payload: Bytes,
}

impl MoPayload {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

impl Decodable for MoPayload {
    fn ie_id() -> IeId {
        IeId::MoPayload
    }

    fn decode(header: IeHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        if buf.remaining() < header.length as usize {
            return Err(CodecError::Incomplete);
        }
        let payload = buf.copy_to_bytes(header.length as usize);

        Ok(MoPayload { payload })
    }
}

impl Encodable for MoPayload {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = IeHeader {
            id: IeId::MoPayload,
            length: self.payload.len() as u16,
        };
        header.encode(buf);
        buf.extend_from_slice(&self.payload);

        Ok(())
    }

    fn encoded_len(&self) -> usize {
        IeHeader::SIZE + self.payload.len()
    }
}
