//! Token record types stored in the vault.
//!
//! A `Token` is a credential record: descriptive metadata, lifecycle
//! fields, and the encrypted secret payload.  The plaintext secret only
//! ever exists transiently, inside a `TokenDraft` on its way into
//! `encrypt` or in the return value of a reveal.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::EncryptedValue;
use crate::errors::{Result, TokenVaultError};

/// Maximum length of a service name in characters.
const MAX_SERVICE_NAME_LEN: usize = 256;

/// Lifecycle status of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    Active,
    Expired,
    Revoked,
    Testing,
}

impl TokenStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::Testing => "testing",
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenStatus {
    type Err = TokenVaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "revoked" => Ok(Self::Revoked),
            "testing" => Ok(Self::Testing),
            other => Err(TokenVaultError::ValidationFailed(format!(
                "unknown status '{other}' (expected active, expired, revoked, or testing)"
            ))),
        }
    }
}

/// How urgent a token is to keep healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl TokenPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Sort rank: critical sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

impl fmt::Display for TokenPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenPriority {
    type Err = TokenVaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(TokenVaultError::ValidationFailed(format!(
                "unknown priority '{other}' (expected critical, high, medium, or low)"
            ))),
        }
    }
}

/// Where a credential is deployed or referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLocation {
    /// Human-readable name (e.g. "staging web server").
    pub name: String,

    /// Optional path or URL within that location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A stored credential record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Store-assigned identity.
    pub id: i64,

    /// The service this credential belongs to (e.g. "GitHub").
    pub service_name: String,

    /// Free-text kind of credential (e.g. "personal access token").
    pub token_type: String,

    /// The encrypted secret payload.  Never plaintext.
    pub encrypted_value: EncryptedValue,

    pub regeneration_url: Option<String>,
    pub regeneration_instructions: Option<String>,

    pub expiration_date: Option<DateTime<Utc>>,
    pub status: TokenStatus,
    pub priority: TokenPriority,

    pub usage_notes: String,
    pub tags: Vec<String>,
    pub used_by: Vec<String>,
    pub locations: Vec<TokenLocation>,

    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub access_count: i64,
}

impl Token {
    /// True if this token's expiration date falls within `days` days of
    /// `now` (inclusive on both ends).  Tokens without an expiration
    /// date never match.
    pub fn expires_within(&self, days: i64, now: DateTime<Utc>) -> bool {
        match self.expiration_date {
            Some(exp) => exp >= now && exp <= now + chrono::Duration::days(days),
            None => false,
        }
    }
}

/// Fields for inserting a new token.
///
/// Carries the plaintext secret transiently; the vault container
/// encrypts it before anything touches storage.
#[derive(Debug, Clone, Default)]
pub struct TokenDraft {
    pub service_name: String,
    pub token_type: String,
    pub secret: String,
    pub regeneration_url: Option<String>,
    pub regeneration_instructions: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub status: Option<TokenStatus>,
    pub priority: Option<TokenPriority>,
    pub usage_notes: String,
    pub tags: Vec<String>,
    pub used_by: Vec<String>,
    pub locations: Vec<TokenLocation>,
}

impl TokenDraft {
    /// Check required fields before any crypto or storage call.
    pub fn validate(&self) -> Result<()> {
        validate_service_name(&self.service_name)?;
        if self.secret.is_empty() {
            return Err(TokenVaultError::ValidationFailed(
                "secret value cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

/// A partial update.  `None` fields are left unchanged.
///
/// A new plaintext secret goes in `secret`; the vault container
/// re-encrypts it before handing the patch to the store.
#[derive(Debug, Clone, Default)]
pub struct TokenPatch {
    pub service_name: Option<String>,
    pub token_type: Option<String>,
    pub secret: Option<Zeroizing<String>>,
    pub regeneration_url: Option<Option<String>>,
    pub regeneration_instructions: Option<Option<String>>,
    pub expiration_date: Option<Option<DateTime<Utc>>>,
    pub status: Option<TokenStatus>,
    pub priority: Option<TokenPriority>,
    pub usage_notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub used_by: Option<Vec<String>>,
    pub locations: Option<Vec<TokenLocation>>,
}

impl TokenPatch {
    /// True if no field is set at all.
    pub fn is_empty(&self) -> bool {
        self.service_name.is_none()
            && self.token_type.is_none()
            && self.secret.is_none()
            && self.regeneration_url.is_none()
            && self.regeneration_instructions.is_none()
            && self.expiration_date.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.usage_notes.is_none()
            && self.tags.is_none()
            && self.used_by.is_none()
            && self.locations.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.service_name {
            validate_service_name(name)?;
        }
        if let Some(secret) = &self.secret {
            if secret.is_empty() {
                return Err(TokenVaultError::ValidationFailed(
                    "secret value cannot be empty".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Validate that a service name is non-empty and reasonably sized.
fn validate_service_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TokenVaultError::ValidationFailed(
            "service name cannot be empty".into(),
        ));
    }
    if name.chars().count() > MAX_SERVICE_NAME_LEN {
        return Err(TokenVaultError::ValidationFailed(format!(
            "service name cannot exceed {MAX_SERVICE_NAME_LEN} characters"
        )));
    }
    Ok(())
}
