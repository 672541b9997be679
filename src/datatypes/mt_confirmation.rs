use crate::codec::{
    CodecError, Decodable, Encodable, IeHeader, decode_u16, decode_u32, expect_stated_len,
};
use crate::datatypes::{Imei, IeId};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// MT Confirmation IE (0x44) - gateway receipt for a queued MT message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MtConfirmation {
    pub msg_id: u32,
    pub imei: Imei,
    /// Id assigned by the gateway queue, shared with the MO header space.
    pub auto_id: u32,
    pub msg_status: u16,
}

impl MtConfirmation {
    pub const STATED_LEN: usize = 28;
}

impl Decodable for MtConfirmation {
    fn ie_id() -> IeId {
        IeId::MtConfirmation
    }

    fn decode(header: IeHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        expect_stated_len(&header, Self::STATED_LEN)?;

        let msg_id = decode_u32(buf)?;

        if buf.remaining() < Imei::LEN {
            return Err(CodecError::Incomplete);
        }
        let imei = Imei::try_from(buf.copy_to_bytes(Imei::LEN).as_ref())?;

        let auto_id = decode_u32(buf)?;
        let msg_status = decode_u16(buf)?;

        Ok(MtConfirmation {
            msg_id,
            imei,
            auto_id,
            msg_status,
        })
    }
}

impl Encodable for MtConfirmation {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = IeHeader {
            id: IeId::MtConfirmation,
            length: (Self::STATED_LEN - IeHeader::SIZE) as u16,
        };
        header.encode(buf);

        buf.put_u32(self.msg_id);
        buf.put_slice(self.imei.as_bytes());
        buf.put_u32(self.auto_id);
        buf.put_u16(self.msg_status);

        Ok(())
    }

    fn encoded_len(&self) -> usize {
        Self::STATED_LEN
    }
}
