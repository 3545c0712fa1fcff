use async_trait::async_trait;
use serde::Serialize;

use crate::CoreError;

/// Outbound domain events (Kafka in production)
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), CoreError>;
}

/// Serializes and publishes an event. Failures are logged and swallowed:
/// events never decide the outcome of the request that raised them.
pub async fn publish_best_effort<T: Serialize>(sink: &dyn EventSink, topic: &str, key: &str, event: &T) {
    let payload = match serde_json::to_string(event) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Failed to serialize {} event {}: {}", topic, key, e);
            return;
        }
    };

    if let Err(e) = sink.publish(topic, key, &payload).await {
        tracing::warn!("Failed to publish {} event {}: {}", topic, key, e);
    }
}

/// Sink for deployments without an event bus
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn publish(&self, topic: &str, key: &str, _payload: &str) -> Result<(), CoreError> {
        tracing::debug!("Dropping {} event {} (no event bus configured)", topic, key);
        Ok(())
    }
}
