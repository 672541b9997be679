//! Delivery coordinator.
//!
//! Sits between the message broker and the Iridium gateway's HTTP endpoint
//! and provides at-least-once delivery in both directions: outbound by
//! withholding the consumer ack until the gateway accepted the message,
//! inbound by withholding the HTTP response until the broker confirmed the
//! publish. Transport failures never escalate; they feed fixed-delay
//! retry/reconnect paths.

pub mod broker;
pub mod coordinator;
pub mod error;

pub use broker::{Broker, BrokerChannel, Confirmation, Delivery};
pub use coordinator::{DeliveryCoordinator, InboundOutcome, RelayConfig, handle_mo_post};
pub use error::{BrokerError, RelayError};
