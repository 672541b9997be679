use crate::codec::{CodecError, Decodable, Encodable, IeHeader, decode_u8, expect_stated_len};
use crate::datatypes::IeId;
use bytes::{BufMut, BytesMut};
use num_enum::TryFromPrimitive;
use std::io::Cursor;

/// Gateway verdict on an MO hand-off.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Failure = 0,
    Success = 1,
}

/// MO Confirmation IE (0x05) - single-status acknowledgement element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoConfirmation {
    pub status: ConfirmationStatus,
}

impl MoConfirmation {
    pub const STATED_LEN: usize = 4;

    pub fn new(status: ConfirmationStatus) -> Self {
        Self { status }
    }
}

impl Decodable for MoConfirmation {
    fn ie_id() -> IeId {
        IeId::MoConfirmation
    }

    fn decode(header: IeHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        expect_stated_len(&header, Self::STATED_LEN)?;

        let status_raw = decode_u8(buf)?;
        let status = ConfirmationStatus::try_from(status_raw)
            .map_err(|_| CodecError::InvalidConfirmationStatus(status_raw))?;

        Ok(MoConfirmation { status })
    }
}

impl Encodable for MoConfirmation {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = IeHeader {
            id: IeId::MoConfirmation,
            length: (Self::STATED_LEN - IeHeader::SIZE) as u16,
        };
        header.encode(buf);
        buf.put_u8(self.status as u8);

        Ok(())
    }

    fn encoded_len(&self) -> usize {
        Self::STATED_LEN
    }
}
