use crate::codec::{
    CodecError, Decodable, Encodable, IeHeader, decode_u8, decode_u16, decode_u32,
    expect_stated_len,
};
use crate::datatypes::{Imei, IeId, SessionStatus};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// MO Header IE (0x01) - leads every mobile-originated message.
///
/// Carries the gateway-assigned auto id, the originating unit's IMEI, the
/// session outcome, both message sequence numbers and the session timestamp
/// (unix epoch seconds).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoHeader {
    pub auto_id: u32,
    pub imei: Imei,
    pub session_status: SessionStatus,
    pub momsn: u16,
    pub mtmsn: u16,
    pub time_of_session: u32,
}

impl MoHeader {
    /// Whole-element size, header included.
    pub const STATED_LEN: usize = 31;
}

impl Decodable for MoHeader {
    fn ie_id() -> IeId {
        IeId::MoHeader
    }

    fn decode(header: IeHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        expect_stated_len(&header, Self::STATED_LEN)?;

        let auto_id = decode_u32(buf)?;

        if buf.remaining() < Imei::LEN {
            return Err(CodecError::Incomplete);
        }
        let imei = Imei::try_from(buf.copy_to_bytes(Imei::LEN).as_ref())?;

        let status_raw = decode_u8(buf)?;
        let session_status = SessionStatus::try_from(status_raw)
            .map_err(|_| CodecError::InvalidSessionStatus(status_raw))?;

        let momsn = decode_u16(buf)?;
        let mtmsn = decode_u16(buf)?;
        let time_of_session = decode_u32(buf)?;

        Ok(MoHeader {
            auto_id,
            imei,
            session_status,
            momsn,
            mtmsn,
            time_of_session,
        })
    }
}

impl Encodable for MoHeader {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = IeHeader {
            id: IeId::MoHeader,
            length: (Self::STATED_LEN - IeHeader::SIZE) as u16,
        };
        header.encode(buf);

        buf.put_u32(self.auto_id);
        buf.put_slice(self.imei.as_bytes());
        buf.put_u8(self.session_status as u8);
        buf.put_u16(self.momsn);
        buf.put_u16(self.mtmsn);
        buf.put_u32(self.time_of_session);

        Ok(())
    }

    fn encoded_len(&self) -> usize {
        Self::STATED_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MoHeader {
        MoHeader {
            auto_id: 0xDEAD_BEEF,
            imei: "300234060392630".parse().unwrap(),
            session_status: SessionStatus::RfLinkLoss,
            momsn: 17,
            mtmsn: 3,
            time_of_session: 1_234_567_890,
        }
    }

    #[test]
    fn mo_header_roundtrip() {
        let original = sample();

        let mut buf = BytesMut::new();
        original.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), MoHeader::STATED_LEN);

        let mut cursor = Cursor::new(buf.as_ref());
        let header = IeHeader::decode(&mut cursor).unwrap();
        let decoded = MoHeader::decode(header, &mut cursor).unwrap();

        assert_eq!(original, decoded);
    }

    #[test]
    fn mo_header_known_vector() {
        // 01 00 1C | auto id | imei | status | momsn | mtmsn | time
        let mut raw = vec![0x01, 0x00, 0x1C];
        raw.extend_from_slice(&[0x00, 0x00, 0x30, 0x39]); // auto id 12345
        raw.extend_from_slice(b"300234060392630");
        raw.push(0x00); // SUCCESSFUL
        raw.extend_from_slice(&[0x00, 0x2A]); // momsn 42
        raw.extend_from_slice(&[0x00, 0x07]); // mtmsn 7
        raw.extend_from_slice(&[0x49, 0x96, 0x02, 0xD2]); // 1234567890
        assert_eq!(raw.len(), 31);

        let mut cursor = Cursor::new(&raw[..]);
        let header = IeHeader::decode(&mut cursor).unwrap();
        assert_eq!(header.stated_len(), 31);

        let decoded = MoHeader::decode(header, &mut cursor).unwrap();
        assert_eq!(decoded.auto_id, 12345);
        assert_eq!(decoded.imei.to_string(), "300234060392630");
        assert_eq!(decoded.session_status, SessionStatus::Successful);
        assert_eq!(decoded.momsn, 42);
        assert_eq!(decoded.mtmsn, 7);
        assert_eq!(decoded.time_of_session, 1_234_567_890);
    }

    #[test]
    fn mo_header_rejects_wrong_stated_length() {
        let header = IeHeader {
            id: IeId::MoHeader,
            length: 27, // stated 30, one byte short
        };
        let body = [0u8; 27];
        let mut cursor = Cursor::new(&body[..]);

        let result = MoHeader::decode(header, &mut cursor);
        assert!(matches!(
            result,
            Err(CodecError::MalformedIe {
                field: "stated length",
                expected: 31,
                actual: 30,
            })
        ));
    }

    #[test]
    fn mo_header_rejects_unknown_status() {
        let mut buf = BytesMut::new();
        sample().encode(&mut buf).unwrap();
        buf[22] = 0x07; // reserved status value

        let mut cursor = Cursor::new(buf.as_ref());
        let header = IeHeader::decode(&mut cursor).unwrap();

        let result = MoHeader::decode(header, &mut cursor);
        assert!(matches!(result, Err(CodecError::InvalidSessionStatus(0x07))));
    }
}
