use async_trait::async_trait;
use std::fmt::Write;
use tracing::info;

use crate::domain::money::format_currency;

use super::lead::Lead;
use super::traits::LeadSink;

/// Notification subject line for a new lead.
pub fn notification_subject(lead: &Lead) -> String {
    format!("New Reverse Mortgage Inquiry - {}", lead.full_name())
}

/// Plain-text notification body for a new lead.
pub fn notification_body(lead: &Lead) -> String {
    let mut body = String::from("New reverse mortgage calculator lead:\n\n");

    let _ = writeln!(body, "Lead ID: {}", lead.id);
    let _ = writeln!(body, "Name: {}", lead.full_name());
    let _ = writeln!(body, "Email: {}", lead.email);
    let _ = writeln!(body, "Phone: {}", lead.phone.as_deref().unwrap_or("Not provided"));
    let _ = writeln!(body, "Postcode: {}", lead.postcode.as_deref().unwrap_or("Not provided"));

    if let Some(value) = lead.property_value {
        let _ = writeln!(body, "Property Value: {}", format_currency(value));
    }
    if let Some(age) = lead.age_primary {
        let _ = writeln!(body, "Age (Primary): {}", age);
    }
    if let Some(age) = lead.age_partner {
        let _ = writeln!(body, "Age (Partner): {}", age);
    }
    if let Some(purpose) = &lead.loan_purpose {
        let _ = writeln!(body, "Loan Purpose: {}", purpose);
    }
    if let Some(amount) = lead.estimated_amount {
        let _ = writeln!(body, "Estimated Amount: {}", format_currency(amount));
    }

    let _ = writeln!(body, "Submitted: {}", lead.submitted_at.to_rfc3339());
    body
}

/// Writes a staff notification for every lead to the log.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    recipient: String,
}

impl LogNotifier {
    pub fn new(recipient: impl Into<String>) -> Self {
        LogNotifier {
            recipient: recipient.into(),
        }
    }
}

#[async_trait]
impl LeadSink for LogNotifier {
    fn name(&self) -> &str {
        "log_notifier"
    }

    async fn deliver(&self, lead: &Lead) -> anyhow::Result<()> {
        info!(
            to = %self.recipient,
            lead_id = %lead.id,
            subject = %notification_subject(lead),
            body = %notification_body(lead),
            "Lead notification"
        );
        Ok(())
    }
}
