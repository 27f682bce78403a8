//! Best-effort publication of committed events.

use tracing::{debug, warn};

use crate::bus::EventBus;
use crate::envelope::EventEnvelope;

/// Publish envelopes in order, logging (never propagating) failures.
///
/// Returns how many envelopes were handed to the bus successfully.
pub fn publish_best_effort<B>(bus: &B, envelopes: Vec<EventEnvelope>) -> usize
where
    B: EventBus<EventEnvelope> + ?Sized,
{
    let mut published = 0;
    for envelope in envelopes {
        let event_type = envelope.event_type().to_string();
        let tenant_id = envelope.tenant_id();
        match bus.publish(envelope) {
            Ok(()) => {
                published += 1;
                debug!(%tenant_id, %event_type, "event published");
            }
            Err(error) => {
                warn!(%tenant_id, %event_type, ?error, "failed to publish event");
            }
        }
    }
    published
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Subscription;
    use crate::in_memory_bus::InMemoryEventBus;
    use chrono::Utc;
    use serde_json::Value;
    use tallyforge_core::TenantId;
    use uuid::Uuid;

    struct BrokenBus;

    impl EventBus<EventEnvelope> for BrokenBus {
        type Error = &'static str;

        fn publish(&self, _message: EventEnvelope) -> Result<(), Self::Error> {
            Err("broker unavailable")
        }

        fn subscribe(&self) -> Subscription<EventEnvelope> {
            Subscription::new(std::sync::mpsc::channel().1)
        }
    }

    fn envelope(event_type: &str) -> EventEnvelope {
        EventEnvelope::new(Uuid::now_v7(), event_type, TenantId::new(), Utc::now(), Value::Null)
    }

    #[test]
    fn failures_are_swallowed() {
        let published = publish_best_effort(&BrokenBus, vec![envelope("a.b"), envelope("c.d")]);
        assert_eq!(published, 0);
    }

    #[test]
    fn order_is_preserved() {
        let bus = InMemoryEventBus::new();
        let sub = bus.subscribe();
        publish_best_effort(&bus, vec![envelope("first.x"), envelope("second.x")]);

        let types: Vec<String> = sub.drain().iter().map(|e| e.event_type().to_string()).collect();
        assert_eq!(types, vec!["first.x", "second.x"]);
    }
}
