//! Lead capture and follow-up delivery.

pub mod dispatcher;
pub mod lead;
pub mod memory;
pub mod notify;
pub mod traits;

pub use dispatcher::{DeliveryOutcome, FollowUpDispatcher, RetryPolicy};
pub use lead::{Lead, LeadSubmission};
pub use memory::MemoryLeadSink;
pub use notify::LogNotifier;
pub use traits::LeadSink;
