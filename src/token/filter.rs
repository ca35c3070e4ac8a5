//! Pure filtering, sorting, and expiry projections over the token list.
//!
//! Nothing here touches storage or crypto: every function is a
//! synchronous projection over in-memory tokens, so the CLI and the
//! vault container can compose them freely.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::errors::{Result, TokenVaultError};

use super::record::{Token, TokenPriority, TokenStatus};

/// Filter criteria applied to the in-memory token list.
#[derive(Debug, Clone, Default)]
pub struct TokenFilter {
    /// Case-insensitive substring match across service name, token
    /// type, usage notes, and tags.
    pub search: Option<String>,
    pub status: Option<TokenStatus>,
    pub priority: Option<TokenPriority>,
}

impl TokenFilter {
    pub fn matches(&self, token: &Token) -> bool {
        if let Some(status) = self.status {
            if token.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if token.priority != priority {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let in_tags = token
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(&needle));
            if !token.service_name.to_lowercase().contains(&needle)
                && !token.token_type.to_lowercase().contains(&needle)
                && !token.usage_notes.to_lowercase().contains(&needle)
                && !in_tags
            {
                return false;
            }
        }
        true
    }
}

/// Field a token listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    ServiceName,
    CreatedAt,
    LastUpdated,
    ExpirationDate,
    Priority,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ServiceName => "service-name",
            Self::CreatedAt => "created",
            Self::LastUpdated => "updated",
            Self::ExpirationDate => "expiration",
            Self::Priority => "priority",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = TokenVaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "service-name" => Ok(Self::ServiceName),
            "created" => Ok(Self::CreatedAt),
            "updated" => Ok(Self::LastUpdated),
            "expiration" => Ok(Self::ExpirationDate),
            "priority" => Ok(Self::Priority),
            other => Err(TokenVaultError::ValidationFailed(format!(
                "unknown sort field '{other}' (expected service-name, created, updated, expiration, or priority)"
            ))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Filter `tokens`, returning references to the matches in input order.
pub fn filter_tokens<'a>(tokens: &'a [Token], filter: &TokenFilter) -> Vec<&'a Token> {
    tokens.iter().filter(|t| filter.matches(t)).collect()
}

/// Sort `tokens` in place by `field` and `direction`.
///
/// Descending is the exact reverse of ascending (ties aside).  Tokens
/// without an expiration date sort after dated ones when ascending by
/// expiration.
pub fn sort_tokens(tokens: &mut [Token], field: SortField, direction: SortDirection) {
    tokens.sort_by(|a, b| {
        let ordering = match field {
            SortField::ServiceName => a
                .service_name
                .to_lowercase()
                .cmp(&b.service_name.to_lowercase()),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::LastUpdated => a.last_updated.cmp(&b.last_updated),
            SortField::ExpirationDate => match (a.expiration_date, b.expiration_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            },
            SortField::Priority => a.priority.rank().cmp(&b.priority.rank()),
        };
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// Active tokens whose expiration date falls between `now` and
/// `now + days` (inclusive).
///
/// Non-active tokens are excluded even when their date qualifies.
pub fn expiring_within<'a>(tokens: &'a [Token], days: i64, now: DateTime<Utc>) -> Vec<&'a Token> {
    tokens
        .iter()
        .filter(|t| t.status == TokenStatus::Active && t.expires_within(days, now))
        .collect()
}
