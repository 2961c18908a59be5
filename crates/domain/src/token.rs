use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clientdesk_core::ClientId;

/// Fixed token lifetime. Expiry is absolute: tokens are never renewed or
/// extended in place, only replaced by issuing a new one.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// A bearer token granting time-limited read-only access to one client's
/// projects and payments.
///
/// The token string is opaque and random but carries no cryptographic
/// binding: knowledge of the string is the whole credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub client_id: ClientId,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn issue(client_id: ClientId, now: DateTime<Utc>) -> Self {
        Self {
            token: opaque_token(),
            client_id,
            expires_at: now + Duration::hours(TOKEN_TTL_HOURS),
        }
    }

    /// A token is expired from the instant `now == expires_at` onward.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

fn opaque_token() -> String {
    let raw = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("TKN-{}", &raw[..12])
}
