//! SBD message assembly: a 3-byte message header followed by a sequence of
//! Information Elements.
//!
//! Two entry points mirror the two ways bytes arrive: [`MessageReader`] is a
//! push parser fed one byte at a time from a stream, [`IridiumMessage::decode`]
//! consumes a complete buffer. Serialization is the exact inverse.

use crate::codec::{CodecError, Encodable, IeHeader, InformationElement};
use crate::datatypes::{Imei, MoHeader, MoPayload, MtHeader, MtPayload};
use bytes::{BufMut, Bytes, BytesMut};

/// A complete SBD message: protocol revision, declared length, ordered IE list.
///
/// The message owns its elements exclusively; elements carry no back-reference.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct IridiumMessage {
    pub elements: Vec<InformationElement>,
}

impl IridiumMessage {
    pub const PROTOCOL_REVISION: u8 = 1;
    pub const HEADER_LEN: usize = 3;

    pub fn new(elements: Vec<InformationElement>) -> Self {
        Self { elements }
    }

    /// Assemble the standard mobile-originated message pair: header + payload.
    pub fn mo(header: MoHeader, payload: impl Into<Bytes>) -> Self {
        Self::new(vec![
            InformationElement::MoHeader(header),
            InformationElement::MoPayload(MoPayload::new(payload)),
        ])
    }

    /// Assemble the standard mobile-terminated message pair: header + payload.
    pub fn mt(msg_id: u32, imei: Imei, payload: impl Into<Bytes>) -> Self {
        Self::new(vec![
            InformationElement::MtHeader(MtHeader::new(msg_id, imei)),
            InformationElement::MtPayload(MtPayload::new(payload)),
        ])
    }

    /// Parse one message from a complete buffer.
    ///
    /// The buffer must hold exactly one message: a short buffer fails with
    /// [`CodecError::Incomplete`], leftover bytes with
    /// [`CodecError::TrailingData`].
    pub fn decode(raw: &[u8]) -> Result<Self, CodecError> {
        let mut reader = MessageReader::new();

        for (consumed, &byte) in raw.iter().enumerate() {
            if let Some(message) = reader.feed(byte)? {
                let trailing = raw.len() - consumed - 1;
                if trailing != 0 {
                    return Err(CodecError::TrailingData(trailing));
                }
                return Ok(message);
            }
        }

        Err(CodecError::Incomplete)
    }

    /// Serialize to the wire form: revision byte, big-endian u16 length of
    /// the element section, then each element in order.
    ///
    /// An empty element list is valid and yields the 3-byte header alone.
    pub fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut body = BytesMut::new();
        for element in &self.elements {
            element.encode(&mut body)?;
        }

        if body.len() > u16::MAX as usize {
            return Err(CodecError::MalformedIe {
                field: "message length",
                expected: u16::MAX as u64,
                actual: body.len() as u64,
            });
        }

        let mut buf = BytesMut::with_capacity(Self::HEADER_LEN + body.len());
        buf.put_u8(Self::PROTOCOL_REVISION);
        buf.put_u16(body.len() as u16);
        buf.extend_from_slice(&body);

        Ok(buf.freeze())
    }

    /// Payload bytes of every MT Payload element, in wire order.
    pub fn mt_payloads(&self) -> impl Iterator<Item = &Bytes> {
        self.elements.iter().filter_map(|element| match element {
            InformationElement::MtPayload(ie) => Some(&ie.payload),
            _ => None,
        })
    }

    /// Payload bytes of every MO Payload element, in wire order.
    pub fn mo_payloads(&self) -> impl Iterator<Item = &Bytes> {
        self.elements.iter().filter_map(|element| match element {
            InformationElement::MoPayload(ie) => Some(&ie.payload),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    AwaitingRevision,
    AwaitingLength { high: Option<u8> },
    Accumulating,
}

/// Push parser assembling messages from a byte stream.
///
/// Feed bytes as they arrive; the reader buffers until the declared total
/// length has been consumed, then splits the element section. Any error
/// resets the reader so one corrupt message never poisons the stream - the
/// caller logs, discards, and keeps feeding.
#[derive(Debug)]
pub struct MessageReader {
    state: ReadState,
    raw: BytesMut,
    total_len: usize,
}

impl MessageReader {
    pub fn new() -> Self {
        Self {
            state: ReadState::AwaitingRevision,
            raw: BytesMut::new(),
            total_len: 0,
        }
    }

    /// Consume one byte.
    ///
    /// Returns `Ok(Some(message))` when the byte completes a message,
    /// `Ok(None)` when more bytes are needed.
    pub fn feed(&mut self, byte: u8) -> Result<Option<IridiumMessage>, CodecError> {
        match self.step(byte) {
            Ok(result) => Ok(result),
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    fn step(&mut self, byte: u8) -> Result<Option<IridiumMessage>, CodecError> {
        self.raw.put_u8(byte);

        match self.state {
            ReadState::AwaitingRevision => {
                if byte != IridiumMessage::PROTOCOL_REVISION {
                    return Err(CodecError::BadRevision(byte));
                }
                self.state = ReadState::AwaitingLength { high: None };
                Ok(None)
            }
            ReadState::AwaitingLength { high: None } => {
                self.state = ReadState::AwaitingLength { high: Some(byte) };
                Ok(None)
            }
            ReadState::AwaitingLength { high: Some(high) } => {
                self.total_len =
                    u16::from_be_bytes([high, byte]) as usize + IridiumMessage::HEADER_LEN;
                self.state = ReadState::Accumulating;
                self.try_complete()
            }
            ReadState::Accumulating => self.try_complete(),
        }
    }

    fn try_complete(&mut self) -> Result<Option<IridiumMessage>, CodecError> {
        if self.raw.len() < self.total_len {
            return Ok(None);
        }

        let raw = self.raw.split().freeze();
        let total = self.total_len;
        self.reset();

        let elements = split_elements(&raw, total)?;
        Ok(Some(IridiumMessage { elements }))
    }

    fn reset(&mut self) {
        self.state = ReadState::AwaitingRevision;
        self.raw.clear();
        self.total_len = 0;
    }
}

impl Default for MessageReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a complete message buffer into elements by walking each element's
/// own header.
fn split_elements(raw: &[u8], total: usize) -> Result<Vec<InformationElement>, CodecError> {
    let mut elements = Vec::new();
    let mut idx = IridiumMessage::HEADER_LEN;

    while idx < total {
        if total - idx < IeHeader::SIZE {
            return Err(CodecError::MalformedIe {
                field: "element header",
                expected: IeHeader::SIZE as u64,
                actual: (total - idx) as u64,
            });
        }

        let declared = u16::from_be_bytes([raw[idx + 1], raw[idx + 2]]) as usize;
        let end = idx + IeHeader::SIZE + declared;
        if end > total {
            return Err(CodecError::TruncatedIe {
                declared,
                available: total - idx - IeHeader::SIZE,
            });
        }

        elements.push(InformationElement::decode(&raw[idx..end])?);
        idx = end;
    }

    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{MoLocation, SessionStatus};

    fn mo_header_ie() -> Bytes {
        let header = MoHeader {
            auto_id: 12345,
            imei: "300234060392630".parse().unwrap(),
            session_status: SessionStatus::Successful,
            momsn: 42,
            mtmsn: 7,
            time_of_session: 1_234_567_890,
        };
        InformationElement::MoHeader(header).to_bytes().unwrap()
    }

    #[test]
    fn empty_message_is_three_header_bytes() {
        let message = IridiumMessage::default();
        let raw = message.to_bytes().unwrap();
        assert_eq!(raw.as_ref(), &[0x01, 0x00, 0x00]);

        let decoded = IridiumMessage::decode(&raw).unwrap();
        assert!(decoded.elements.is_empty());
    }

    #[test]
    fn single_header_message_parses_with_no_remainder() {
        // 01 00 1F followed by the 31-byte MO Header IE, 34 bytes total.
        let ie = mo_header_ie();
        let mut raw = vec![0x01, 0x00, 0x1F];
        raw.extend_from_slice(&ie);
        assert_eq!(raw.len(), 34);

        let message = IridiumMessage::decode(&raw).unwrap();
        assert_eq!(message.elements.len(), 1);
        assert!(matches!(
            message.elements[0],
            InformationElement::MoHeader(_)
        ));
    }

    #[test]
    fn message_roundtrip() {
        let original = IridiumMessage::mt(
            1234,
            "300234060392630".parse().unwrap(),
            &b"\xFE\x09\x00\x01\x01\x00"[..],
        );

        let raw = original.to_bytes().unwrap();
        let decoded = IridiumMessage::decode(&raw).unwrap();

        assert_eq!(original, decoded);
        assert_eq!(
            decoded.mt_payloads().next().unwrap().as_ref(),
            b"\xFE\x09\x00\x01\x01\x00"
        );
    }

    #[test]
    fn streaming_reader_yields_message_on_final_byte() {
        let raw = IridiumMessage::mo(
            MoHeader {
                auto_id: 1,
                imei: "300234060392630".parse().unwrap(),
                session_status: SessionStatus::Successful,
                momsn: 1,
                mtmsn: 0,
                time_of_session: 0,
            },
            &b"ping"[..],
        )
        .to_bytes()
        .unwrap();

        let mut reader = MessageReader::new();
        for &byte in &raw[..raw.len() - 1] {
            assert!(reader.feed(byte).unwrap().is_none());
        }
        let message = reader.feed(raw[raw.len() - 1]).unwrap().unwrap();
        assert_eq!(message.elements.len(), 2);
    }

    #[test]
    fn bad_revision_resets_the_reader() {
        let mut reader = MessageReader::new();
        assert!(matches!(
            reader.feed(0x02),
            Err(CodecError::BadRevision(0x02))
        ));

        // The stream recovers on the next well-formed message.
        let raw = IridiumMessage::default().to_bytes().unwrap();
        let mut result = None;
        for &byte in raw.iter() {
            result = reader.feed(byte).unwrap();
        }
        assert!(result.is_some());
    }

    #[test]
    fn unknown_ie_discards_whole_message() {
        let mut raw = vec![0x01, 0x00, 0x07];
        raw.extend_from_slice(&[0x99, 0x00, 0x04, 0xDE, 0xAD, 0xBE, 0xEF]);

        let mut reader = MessageReader::new();
        let mut outcome = Ok(None);
        for &byte in raw.iter() {
            outcome = reader.feed(byte);
        }
        assert!(matches!(outcome, Err(CodecError::UnknownIe(0x99))));

        // Subsequent byte-stream parsing is unaffected.
        let next = IridiumMessage::default().to_bytes().unwrap();
        let mut result = None;
        for &byte in next.iter() {
            result = reader.feed(byte).unwrap();
        }
        assert!(result.is_some());
    }

    #[test]
    fn overlong_element_is_truncated() {
        // Element declares a 10-byte body but the message only carries 2.
        let mut raw = vec![0x01, 0x00, 0x05];
        raw.extend_from_slice(&[0x02, 0x00, 0x0A, 0xAA, 0xBB]);

        let result = IridiumMessage::decode(&raw);
        assert!(matches!(
            result,
            Err(CodecError::TruncatedIe {
                declared: 10,
                available: 2,
            })
        ));
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut raw = IridiumMessage::default().to_bytes().unwrap().to_vec();
        raw.push(0xFF);

        let result = IridiumMessage::decode(&raw);
        assert!(matches!(result, Err(CodecError::TrailingData(1))));
    }

    #[test]
    fn decode_rejects_short_buffer() {
        let result = IridiumMessage::decode(&[0x01, 0x00]);
        assert!(matches!(result, Err(CodecError::Incomplete)));
    }

    #[test]
    fn location_bearing_message_refuses_to_serialize() {
        let message = IridiumMessage::new(vec![InformationElement::MoLocation(MoLocation {
            latitude: 52.2,
            longitude: 13.4,
            cep: 1,
        })]);

        let result = message.to_bytes();
        assert!(matches!(
            result,
            Err(CodecError::EncodeUnsupported { ie: "MO Location" })
        ));
    }
}
