use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use tallyforge_core::{TenantId, UserId};

use crate::event::Event;

/// Free-form envelope metadata (actor, correlation ids, ...).
pub type Metadata = Map<String, Value>;

/// Envelope for a published event.
///
/// Notes:
/// - **Multi-tenancy** is enforced here via `tenant_id`.
/// - `payload` is the event serialized to JSON, so consumers need no
///   knowledge of the producing crate's types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    event_id: Uuid,
    event_type: String,
    version: u32,
    tenant_id: TenantId,
    #[serde(rename = "timestamp")]
    occurred_at: DateTime<Utc>,
    payload: Value,
    #[serde(default)]
    metadata: Metadata,
}

impl EventEnvelope {
    pub fn new(
        event_id: Uuid,
        event_type: impl Into<String>,
        tenant_id: TenantId,
        occurred_at: DateTime<Utc>,
        payload: Value,
    ) -> Self {
        Self {
            event_id,
            event_type: event_type.into(),
            version: 1,
            tenant_id,
            occurred_at,
            payload,
            metadata: Metadata::new(),
        }
    }

    /// Wrap a typed domain event, serializing it as the payload.
    pub fn wrap<E: Event>(tenant_id: TenantId, event: &E) -> Result<Self, serde_json::Error> {
        let payload = serde_json::to_value(event)?;
        let mut envelope = Self::new(
            Uuid::now_v7(),
            event.event_type(),
            tenant_id,
            event.occurred_at(),
            payload,
        );
        envelope.version = event.version();
        Ok(envelope)
    }

    /// Record the acting user in metadata.
    pub fn with_actor(mut self, actor: Option<UserId>) -> Self {
        if let Some(actor) = actor {
            self.metadata
                .insert("actor_id".to_string(), Value::String(actor.to_string()));
        }
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Pub/sub channel name for this event (`events:<type>`).
    pub fn channel(&self) -> String {
        format!("events:{}", self.event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, Serialize)]
    struct Pinged {
        count: u32,
        #[serde(skip)]
        at: DateTime<Utc>,
    }

    impl Event for Pinged {
        fn event_type(&self) -> &'static str {
            "test.pinged"
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    #[test]
    fn wrap_serializes_payload_and_copies_type() {
        let at = Utc.with_ymd_and_hms(2024, 4, 1, 9, 30, 0).unwrap();
        let tenant_id = TenantId::new();
        let envelope = EventEnvelope::wrap(tenant_id, &Pinged { count: 3, at }).unwrap();

        assert_eq!(envelope.event_type(), "test.pinged");
        assert_eq!(envelope.tenant_id(), tenant_id);
        assert_eq!(envelope.occurred_at(), at);
        assert_eq!(envelope.payload()["count"], 3);
        assert_eq!(envelope.channel(), "events:test.pinged");
    }

    #[test]
    fn actor_lands_in_metadata() {
        let actor = UserId::new();
        let envelope = EventEnvelope::new(
            Uuid::now_v7(),
            "test.pinged",
            TenantId::new(),
            Utc::now(),
            Value::Null,
        )
        .with_actor(Some(actor));

        assert_eq!(
            envelope.metadata().get("actor_id"),
            Some(&Value::String(actor.to_string()))
        );
    }

    #[test]
    fn json_uses_timestamp_field_name() {
        let envelope = EventEnvelope::new(
            Uuid::now_v7(),
            "test.pinged",
            TenantId::new(),
            Utc::now(),
            Value::Null,
        );
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("timestamp").is_some());
        assert!(json.get("occurred_at").is_none());
    }
}
