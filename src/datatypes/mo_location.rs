use crate::codec::{
    CodecError, Decodable, Encodable, IeHeader, decode_u8, decode_u16, decode_u32,
    expect_stated_len,
};
use crate::datatypes::IeId;
use bytes::BytesMut;
use std::io::Cursor;

/// MO Location IE (0x03) - gateway-computed position estimate.
///
/// Decode-only: nothing on the outbound path ever produces one, so `encode`
/// fails loudly instead of fabricating a wire image.
///
/// The wire layout packs each coordinate as whole degrees plus thousandths
/// of minutes, with both hemisphere signs folded into one leading byte
/// (bit 1 = latitude, bit 0 = longitude; set means north/east).
#[derive(Clone, Debug, PartialEq)]
pub struct MoLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Circular error probable of the estimate, in kilometers.
    pub cep: u32,
}

impl MoLocation {
    pub const STATED_LEN: usize = 14;
}

impl Decodable for MoLocation {
    fn ie_id() -> IeId {
        IeId::MoLocation
    }

    fn decode(header: IeHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;
        expect_stated_len(&header, Self::STATED_LEN)?;

        let sign = decode_u8(buf)?;

        let lat_sign = f64::from(i32::from(sign & 0b10) - 1);
        let lat_deg = f64::from(decode_u8(buf)?);
        let lat_min = f64::from(decode_u16(buf)?) / 1000.0;
        let latitude = lat_sign * (lat_deg + lat_min / 60.0);

        let lon_sign = f64::from(i32::from(sign & 0b01) * 2 - 1);
        let lon_deg = f64::from(decode_u8(buf)?);
        let lon_min = f64::from(decode_u16(buf)?) / 1000.0;
        let longitude = lon_sign * (lon_deg + lon_min / 60.0);

        let cep = decode_u32(buf)?;

        Ok(MoLocation {
            latitude,
            longitude,
            cep,
        })
    }
}

impl Encodable for MoLocation {
    fn encode(&self, _buf: &mut BytesMut) -> Result<(), CodecError> {
        Err(CodecError::EncodeUnsupported { ie: "MO Location" })
    }

    fn encoded_len(&self) -> usize {
        Self::STATED_LEN
    }
}
