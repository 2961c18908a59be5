use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Retention cap for the audit log: stores may evict the oldest entries once
/// this many are kept.
pub const MAX_RETAINED_ENTRIES: usize = 50;

/// Enumerated audit tags. Persisted as SCREAMING_SNAKE text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    ClientCreate,
    ClientUpdate,
    ClientDelete,
    ProjectCreate,
    ProjectUpdate,
    ProjectDelete,
    PaymentCreate,
    PaymentUpdate,
    PaymentDelete,
    LinkGenerated,
    ClientAccess,
    AccessDenied,
    AdminLog,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientCreate => "CLIENT_CREATE",
            Self::ClientUpdate => "CLIENT_UPDATE",
            Self::ClientDelete => "CLIENT_DELETE",
            Self::ProjectCreate => "PROJECT_CREATE",
            Self::ProjectUpdate => "PROJECT_UPDATE",
            Self::ProjectDelete => "PROJECT_DELETE",
            Self::PaymentCreate => "PAYMENT_CREATE",
            Self::PaymentUpdate => "PAYMENT_UPDATE",
            Self::PaymentDelete => "PAYMENT_DELETE",
            Self::LinkGenerated => "LINK_GENERATED",
            Self::ClientAccess => "CLIENT_ACCESS",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::AdminLog => "ADMIN_LOG",
        }
    }

    /// Parse a persisted or caller-supplied tag. Unknown tags map to `None`;
    /// callers that accept free-form input fall back to [`AuditAction::AdminLog`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "CLIENT_CREATE" => Some(Self::ClientCreate),
            "CLIENT_UPDATE" => Some(Self::ClientUpdate),
            "CLIENT_DELETE" => Some(Self::ClientDelete),
            "PROJECT_CREATE" => Some(Self::ProjectCreate),
            "PROJECT_UPDATE" => Some(Self::ProjectUpdate),
            "PROJECT_DELETE" => Some(Self::ProjectDelete),
            "PAYMENT_CREATE" => Some(Self::PaymentCreate),
            "PAYMENT_UPDATE" => Some(Self::PaymentUpdate),
            "PAYMENT_DELETE" => Some(Self::PaymentDelete),
            "LINK_GENERATED" => Some(Self::LinkGenerated),
            "CLIENT_ACCESS" => Some(Self::ClientAccess),
            "ACCESS_DENIED" => Some(Self::AccessDenied),
            "ADMIN_LOG" => Some(Self::AdminLog),
            _ => None,
        }
    }
}

/// One append-only audit record. Written as a side effect of every mutating
/// or access-control event; never read back by business logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub detail: String,
}

impl AuditLogEntry {
    pub fn new(action: AuditAction, detail: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            timestamp: now,
            action,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for action in [
            AuditAction::ClientCreate,
            AuditAction::PaymentDelete,
            AuditAction::LinkGenerated,
            AuditAction::AccessDenied,
        ] {
            assert_eq!(AuditAction::from_tag(action.as_str()), Some(action));
        }
    }

    #[test]
    fn unknown_tags_do_not_parse() {
        assert_eq!(AuditAction::from_tag("NOT_A_TAG"), None);
        assert_eq!(AuditAction::from_tag("client_create"), None);
    }
}
