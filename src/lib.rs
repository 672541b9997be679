pub mod codec;
pub mod connection;
pub mod datatypes;
pub mod gateway;
pub mod message;
pub mod modem;
pub mod relay;


// Re-export codec types for direct access
pub use codec::{CodecError, Decodable, Encodable, IeHeader, InformationElement};

// Re-export the message assembler
pub use message::{IridiumMessage, MessageReader};

// Re-export the emulator and coordinator APIs for easy access
pub use gateway::{GatewayClient, GatewayCredentials, GatewayError};
pub use modem::{AtState, LinkQuality, ModemConfig, ModemEmulator};
pub use relay::{
    Broker, BrokerChannel, BrokerError, Confirmation, Delivery, DeliveryCoordinator,
    InboundOutcome, RelayConfig, handle_mo_post,
};

/// Error returned by most functions.
///
/// When writing a real application, one might want to consider a specialized
/// error handling crate or defining an error type as an `enum` of causes.
/// However, for our example, using a boxed `std::error::Error` is sufficient.
///
/// For performance reasons, boxing is avoided in any hot path. For example,
/// in the byte-stream parser, a custom error `enum` is defined. This is
/// because the error is hit and handled during normal execution when a
/// malformed message is received on a socket. `std::error::Error` is
/// implemented for `CodecError` which allows it to be converted to
/// `Box<dyn std::error::Error>`.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// A specialized `Result` type for SBD relay operations.
///
/// This is defined as a convenience.
///
/// # Examples
///
/// ## Running the modem emulator over a socket
///
/// Flight software connects to a TCP port that stands in for the modem's
/// serial line; MT messages arrive through the channel handed to `run`:
///
/// ```rust,no_run
/// use sbd::connection::SerialConnection;
/// use sbd::gateway::{GatewayClient, GatewayError};
/// use sbd::modem::{ModemConfig, ModemEmulator};
/// use tokio::sync::mpsc;
///
/// struct HttpGateway;
///
/// impl GatewayClient for HttpGateway {
///     async fn send(&mut self, message: &[u8]) -> Result<(), GatewayError> {
///         // POST gateway::encode_form(None, message) to the relay here.
///         Ok(())
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     let listener = tokio::net::TcpListener::bind("127.0.0.1:10800").await?;
///     let (socket, _) = listener.accept().await?;
///
///     let config = ModemConfig::new("300234060392630".parse()?);
///     let emulator = ModemEmulator::new(config, HttpGateway);
///
///     let (_mt_tx, mt_rx) = mpsc::unbounded_channel();
///     emulator.run(SerialConnection::new(socket), mt_rx).await
/// }
/// ```
///
/// ## Assembling and parsing a message
///
/// ```rust
/// use sbd::message::IridiumMessage;
///
/// let message = IridiumMessage::mt(
///     1234,
///     "300234060392630".parse().unwrap(),
///     &b"\xFE\x09\x00\x01\x01\x00"[..],
/// );
///
/// let raw = message.to_bytes().unwrap();
/// let parsed = IridiumMessage::decode(&raw).unwrap();
/// assert_eq!(message, parsed);
/// ```
pub type Result<T> = std::result::Result<T, Error>;
