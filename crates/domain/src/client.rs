use serde::{Deserialize, Serialize};

use clientdesk_core::{ClientId, DomainError, DomainResult};

/// A client of the agency: owns projects, may be granted read-only report
/// access via a temporary token. Never deleted while it owns a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: String,
}

impl Client {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> DomainResult<Self> {
        let (name, email) = validate_contact(name.into(), email.into())?;
        Ok(Self {
            id: ClientId::new(),
            name,
            email,
        })
    }

    pub fn update(&mut self, name: impl Into<String>, email: impl Into<String>) -> DomainResult<()> {
        let (name, email) = validate_contact(name.into(), email.into())?;
        self.name = name;
        self.email = email;
        Ok(())
    }
}

fn validate_contact(name: String, email: String) -> DomainResult<(String, String)> {
    let name = name.trim().to_string();
    let email = email.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::validation("client name cannot be empty"));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(DomainError::validation("client email is not valid"));
    }
    Ok((name, email))
}
