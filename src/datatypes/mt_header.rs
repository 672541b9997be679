use crate::codec::{
    CodecError, Decodable, Encodable, IeHeader, decode_u16, decode_u32, expect_stated_len,
};
use crate::datatypes::{Imei, IeId};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// MT Header IE (0x41) - addresses a mobile-terminated message to one unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MtHeader {
    /// Sender-chosen correlation id, echoed back in the MT confirmation.
    pub msg_id: u32,
    pub imei: Imei,
    pub disposition_flags: u16,
}

impl MtHeader {
    pub const STATED_LEN: usize = 24;

    pub fn new(msg_id: u32, imei: Imei) -> Self {
        Self {
            msg_id,
            imei,
            disposition_flags: 0,
        }
    }
}

impl Decodable for MtHeader {
    fn ie_id() -> IeId {
        IeId::MtHeader
    }

    fn decode(header: IeHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        expect_stated_len(&header, Self::STATED_LEN)?;

        let msg_id = decode_u32(buf)?;

        if buf.remaining() < Imei::LEN {
            return Err(CodecError::Incomplete);
        }
        let imei = Imei::try_from(buf.copy_to_bytes(Imei::LEN).as_ref())?;

        let disposition_flags = decode_u16(buf)?;

        Ok(MtHeader {
            msg_id,
            imei,
            disposition_flags,
        })
    }
}

impl Encodable for MtHeader {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = IeHeader {
            id: IeId::MtHeader,
            length: (Self::STATED_LEN - IeHeader::SIZE) as u16,
        };
        header.encode(buf);

        buf.put_u32(self.msg_id);
        buf.put_slice(self.imei.as_bytes());
        buf.put_u16(self.disposition_flags);

        Ok(())
    }

    fn encoded_len(&self) -> usize {
        Self::STATED_LEN
    }
}
