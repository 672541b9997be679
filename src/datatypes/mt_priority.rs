use crate::codec::{CodecError, Decodable, Encodable, IeHeader, decode_u16, expect_stated_len};
use crate::datatypes::IeId;
use bytes::{BufMut, BytesMut};
use std::io::Cursor;

/// MT Priority IE (0x46) - queue placement hint for an MT message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MtPriority {
    pub priority: u16,
}

impl MtPriority {
    pub const STATED_LEN: usize = 5;

    pub fn new(priority: u16) -> Self {
        Self { priority }
    }
}

impl Decodable for MtPriority {
    fn ie_id() -> IeId {
        IeId::MtPriority
    }

    fn decode(header: IeHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        expect_stated_len(&header, Self::STATED_LEN)?;

        let priority = decode_u16(buf)?;

        Ok(MtPriority { priority })
    }
}

impl Encodable for MtPriority {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = IeHeader {
            id: IeId::MtPriority,
            length: (Self::STATED_LEN - IeHeader::SIZE) as u16,
        };
        header.encode(buf);
        buf.put_u16(self.priority);

        Ok(())
    }

    fn encoded_len(&self) -> usize {
        Self::STATED_LEN
    }
}
