// Message-broker boundary traits.
//
// The broker itself (wire protocol, durable MO/MT queues, fan-out exchanges)
// lives outside this crate; these traits pin down exactly the semantics the
// coordinator relies on. The expected topology: one durable queue per
// direction bound to a fan-out distribution point, consumer prefetch of 1 so
// a failure can only ever implicate the single in-flight message.

use crate::relay::error::BrokerError;
use bytes::Bytes;

/// One message handed to the consumer, identified by its delivery tag until
/// it is acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub tag: u64,
    pub payload: Bytes,
}

/// Publisher-confirm verdict from the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The broker durably accepted the publish.
    Ack,
    /// The broker refused it; the producer must retry.
    Nack,
}

/// An open channel to the broker.
///
/// All four operations map one-to-one onto standard broker primitives:
/// consume, consumer-ack, publish-with-confirm, and recover (redeliver every
/// unacknowledged message on the channel).
pub trait BrokerChannel {
    /// Wait for the next delivery on the consuming queue.
    async fn next_delivery(&mut self) -> Result<Delivery, BrokerError>;

    /// Acknowledge a delivery, removing it from the queue permanently.
    async fn ack(&mut self, tag: u64) -> Result<(), BrokerError>;

    /// Publish to the producing queue and wait for the broker's confirm.
    async fn publish_confirmed(&mut self, payload: Bytes) -> Result<Confirmation, BrokerError>;

    /// Ask the broker to redeliver all unacknowledged messages on this
    /// channel. Note this is channel-wide, not per-message: every unacked
    /// delivery comes back, which can amplify work under partial failure.
    async fn recover(&mut self) -> Result<(), BrokerError>;
}

/// A broker connection factory: the reconnect seam.
pub trait Broker {
    type Channel: BrokerChannel;

    /// Open a fresh channel, connecting first if necessary.
    async fn channel(&mut self) -> Result<Self::Channel, BrokerError>;
}
