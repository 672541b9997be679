use num_enum::TryFromPrimitive;

/// Information Element identifier byte.
///
/// MO elements occupy the low range, MT elements are offset by 0x40.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IeId {
    MoHeader = 0x01,
    MoPayload = 0x02,
    MoLocation = 0x03,
    // Reserved 0x04
    MoConfirmation = 0x05,
    MtHeader = 0x41,
    MtPayload = 0x42,
    // Reserved 0x43
    MtConfirmation = 0x44,
    // Reserved 0x45
    MtPriority = 0x46,
}
