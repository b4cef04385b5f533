use async_trait::async_trait;

use super::lead::Lead;

/// Destination for accepted leads (CRM, mailbox, queue).
///
/// Deliveries may be retried, so implementations should tolerate seeing the
/// same lead id more than once.
#[async_trait]
pub trait LeadSink: Send + Sync {
    /// Sink name for logs and metrics.
    fn name(&self) -> &str;

    /// Deliver one lead.
    async fn deliver(&self, lead: &Lead) -> anyhow::Result<()>;
}
