use num_enum::TryFromPrimitive;

/// Outcome of an MO SBD session as reported by the gateway (tab. 6-5).
///
/// Values 0-2 indicate the session completed with decreasing link quality;
/// the rest are failure causes.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Successful = 0,
    MtTooBig = 1,
    LowQuality = 2,
    // Reserved 3 - 9
    SessionTimeout = 10,
    // Reserved 11
    MoTooBig = 12,
    RfLinkLoss = 13,
    ProtocolError = 14,
    ImeiProhibited = 15,
}
