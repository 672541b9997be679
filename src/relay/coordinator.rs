// Delivery coordinator: at-least-once relaying between the broker and the
// HTTP gateway.
//
// Outbound, each broker delivery is posted to the gateway and only
// acknowledged once the gateway accepted it; a failed post leaves the
// message unacked and asks the broker to redeliver after a fixed delay.
// Inbound, a gateway POST is published with a confirm and the HTTP response
// is held until the broker's verdict arrives.

use crate::gateway::{self, GatewayClient};
use crate::relay::broker::{Broker, BrokerChannel, Confirmation};
use crate::relay::error::BrokerError;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time;
use tracing::{debug, info, warn};

/// Coordinator timing knobs.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Wait before asking the broker to redeliver after a failed send.
    pub redelivery_delay: Duration,
    /// Backoff between broker reconnect attempts.
    pub reconnect_delay: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            redelivery_delay: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(3),
        }
    }
}

/// In-flight outbound sends, keyed by delivery tag.
///
/// An entry is created when the send is issued and removed only on a
/// definitive outcome: the gateway accepting it (ack) or the failure that
/// schedules its redelivery.
#[derive(Debug, Default)]
struct PendingDeliveries {
    inflight: HashMap<u64, Bytes>,
}

impl PendingDeliveries {
    fn begin(&mut self, tag: u64, payload: Bytes) {
        self.inflight.insert(tag, payload);
    }

    fn settle(&mut self, tag: u64) -> Option<Bytes> {
        self.inflight.remove(&tag)
    }

    fn len(&self) -> usize {
        self.inflight.len()
    }
}

/// Bridges the broker's MT queue to the gateway with at-least-once
/// semantics.
pub struct DeliveryCoordinator<B, G> {
    config: RelayConfig,
    broker: B,
    gateway: G,
    pending: PendingDeliveries,
}

impl<B: Broker, G: GatewayClient> DeliveryCoordinator<B, G> {
    pub fn new(config: RelayConfig, broker: B, gateway: G) -> Self {
        Self {
            config,
            broker,
            gateway,
            pending: PendingDeliveries::default(),
        }
    }

    /// Number of sends awaiting a definitive outcome.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Consume deliveries until the process stops.
    ///
    /// Any channel-level failure tears the channel down and reconnects after
    /// the fixed backoff; nothing here ever escalates to a crash.
    pub async fn run_outbound(&mut self) {
        loop {
            match self.broker.channel().await {
                Ok(mut channel) => {
                    info!("broker channel open, consuming deliveries");
                    loop {
                        if let Err(e) = self.process_next(&mut channel).await {
                            warn!(error = %e, "broker channel failed, reconnecting");
                            break;
                        }
                    }
                }
                Err(e) => warn!(error = %e, "broker connect failed, retrying"),
            }

            time::sleep(self.config.reconnect_delay).await;
        }
    }

    /// Relay one delivery end to end.
    ///
    /// On gateway success the delivery is acknowledged and gone for good. On
    /// gateway failure (timeouts included, they are the same error class)
    /// the delivery stays unacknowledged and, after the redelivery delay,
    /// the broker is asked to recover - which redelivers every unacked
    /// message on the channel, not just this one. That resubmission strategy
    /// permits unbounded retries of an unsendable message; the queue is
    /// consumed with prefetch 1, so at most one message is ever implicated.
    pub async fn process_next(&mut self, channel: &mut B::Channel) -> Result<(), BrokerError> {
        let delivery = channel.next_delivery().await?;
        debug!(
            tag = delivery.tag,
            len = delivery.payload.len(),
            "relaying delivery to the gateway"
        );

        self.pending.begin(delivery.tag, delivery.payload.clone());

        match self.gateway.send(&delivery.payload).await {
            Ok(()) => {
                channel.ack(delivery.tag).await?;
                self.pending.settle(delivery.tag);
                info!(tag = delivery.tag, "delivery acknowledged");
            }
            Err(e) => {
                warn!(
                    tag = delivery.tag,
                    error = %e,
                    "gateway send failed, scheduling broker redelivery"
                );
                self.pending.settle(delivery.tag);
                time::sleep(self.config.redelivery_delay).await;
                channel.recover().await?;
            }
        }

        Ok(())
    }
}

/// Verdict for an inbound gateway POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Published and confirmed; answer 200.
    Accepted,
    /// Undecodable body or broker refusal; answer 400 so the gateway
    /// retries delivery itself.
    Rejected,
}

impl InboundOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            InboundOutcome::Accepted => 200,
            InboundOutcome::Rejected => 400,
        }
    }
}

/// Handle one MO POST from the gateway.
///
/// The caller (the HTTP server boundary) keeps the request open across this
/// await and maps the outcome straight to a status code. A body that fails
/// to decode is rejected before the broker is involved at all.
pub async fn handle_mo_post<C: BrokerChannel>(channel: &mut C, body: &str) -> InboundOutcome {
    let payload = match gateway::decode_form(body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "failed to decode inbound MO body");
            return InboundOutcome::Rejected;
        }
    };

    match channel.publish_confirmed(payload).await {
        Ok(Confirmation::Ack) => InboundOutcome::Accepted,
        Ok(Confirmation::Nack) => {
            warn!("broker nacked the MO publish");
            InboundOutcome::Rejected
        }
        Err(e) => {
            warn!(error = %e, "MO publish failed");
            InboundOutcome::Rejected
        }
    }
}
