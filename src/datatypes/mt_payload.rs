use crate::codec::{CodecError, Decodable, Encodable, IeHeader};
use crate::datatypes::IeId;
use bytes::{Buf, Bytes, BytesMut};
use std::io::Cursor;

/// MT Payload IE (0x42) - opaque ground-to-air content, mirror of MO Payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MtPayload {
    pub payload: Bytes,
}

impl MtPayload {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

impl Decodable for MtPayload {
    fn ie_id() -> IeId {
        IeId::MtPayload
    }

    fn decode(header: IeHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        if buf.remaining() < header.length as usize {
            return Err(CodecError::Incomplete);
        }
        let payload = buf.copy_to_bytes(header.length as usize);

        Ok(MtPayload { payload })
    }
}

impl Encodable for MtPayload {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = IeHeader {
            id: IeId::MtPayload,
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
