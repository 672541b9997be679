use crate::codec::CodecError;
use std::fmt;
use std::str::FromStr;

/// Fixed 15-byte equipment identity carried in the MO/MT header IEs.
///
/// The wire format stores the IMEI as 15 raw bytes (ASCII digits on every
/// unit seen in the field, but nothing in the protocol enforces that), so
/// the type keeps the bytes verbatim and only goes through UTF-8 for
/// display purposes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Imei([u8; 15]);

impl Imei {
    pub const LEN: usize = 15;

    pub fn new(bytes: [u8; 15]) -> Self {
        Imei(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 15] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Imei {
    type Error = CodecError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; 15] = value.try_into().map_err(|_| CodecError::MalformedIe {
            field: "imei length",
            expected: Self::LEN as u64,
            actual: value.len() as u64,
        })?;
        Ok(Imei(bytes))
    }
}

impl FromStr for Imei {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Imei::try_from(s.as_bytes())
    }
}

impl fmt::Display for Imei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Imei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Imei({})", self)
    }
}
