//! Token model: record types plus pure filter/sort/expiry projections.

pub mod filter;
pub mod record;

// Re-export the most commonly used items.
pub use filter::{expiring_within, filter_tokens, sort_tokens, SortDirection, SortField, TokenFilter};
pub use record::{Token, TokenDraft, TokenLocation, TokenPatch, TokenPriority, TokenStatus};
