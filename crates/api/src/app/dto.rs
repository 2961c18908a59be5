use chrono::NaiveDate;
use serde::Deserialize;

use clientdesk_access::ClientReport;
use clientdesk_domain::{AuditLogEntry, Client, Payment, Project};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct GenerateTokenRequest {
    pub client_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClientDataRequest {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminLogRequest {
    pub action: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClientRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub client_id: String,
    pub name: String,
    /// Minor units; must be positive.
    pub budget: i64,
}

#[derive(Debug, Deserialize)]
pub struct EditProjectRequest {
    pub name: Option<String>,
    pub budget: i64,
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub project_id: String,
    /// Defaults to today when omitted.
    pub date: Option<NaiveDate>,
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct EditPaymentRequest {
    pub date: NaiveDate,
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn client_to_json(c: &Client) -> serde_json::Value {
    serde_json::json!({
        "id": c.id.to_string(),
        "name": c.name,
        "email": c.email,
    })
}

pub fn project_to_json(p: &Project) -> serde_json::Value {
    serde_json::json!({
        "id": p.id.to_string(),
        "client_id": p.client_id.to_string(),
        "name": p.name,
        "status": p.status.as_str(),
        "budget": p.budget,
        "balance": p.balance,
    })
}

pub fn payment_to_json(p: &Payment) -> serde_json::Value {
    serde_json::json!({
        "id": p.id.to_string(),
        "project_id": p.project_id.to_string(),
        "date": p.date.to_string(),
        "amount": p.amount,
        "type": p.kind,
    })
}

pub fn log_to_json(l: &AuditLogEntry) -> serde_json::Value {
    serde_json::json!({
        "timestamp": l.timestamp.to_rfc3339(),
        "action": l.action.as_str(),
        "detail": l.detail,
    })
}

pub fn report_to_json(r: &ClientReport) -> serde_json::Value {
    serde_json::json!({
        "client": client_to_json(&r.client),
        "projects": r.projects.iter().map(project_to_json).collect::<Vec<_>>(),
        "payments": r.payments.iter().map(payment_to_json).collect::<Vec<_>>(),
    })
}
