use std::fmt;

use serde::Serialize;
use serde_json::Value;

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// Fields a webhook payload must carry to be accepted.
pub const REQUIRED_FIELDS: [&str; 3] = ["issueKey", "summary", "repo"];

/// A ticket event delivered by the ticketing system's webhook automation.
#[derive(Debug, Clone)]
pub struct TicketEvent {
    /// Ticket key, e.g. "ABC-123".
    pub issue_key: String,
    /// Ticket summary line.
    pub summary: String,
    /// Ticket description, if any.
    pub description: Option<String>,
    /// Target repository as "owner/name".
    pub repo: String,
    /// Base branch for the work.
    pub git_ref: String,
}

impl TicketEvent {
    /// Validate a webhook payload against the required-field contract.
    ///
    /// Returns the missing field names when validation fails; a non-object
    /// payload is treated the same as an empty one.
    pub fn from_payload(payload: &Value) -> Result<Self, Vec<&'static str>> {
        let field = |name: &str| {
            payload
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let issue_key = field("issueKey");
        let summary = field("summary");
        let repo = field("repo");

        let mut missing = Vec::new();
        if issue_key.is_none() {
            missing.push("issueKey");
        }
        if summary.is_none() {
            missing.push("summary");
        }
        if repo.is_none() {
            missing.push("repo");
        }

        let (Some(issue_key), Some(summary), Some(repo)) = (issue_key, summary, repo) else {
            return Err(missing);
        };

        Ok(Self {
            issue_key: issue_key.to_string(),
            summary: summary.to_string(),
            description: field("description").map(str::to_string),
            repo: repo.to_string(),
            git_ref: field("ref").unwrap_or("main").to_string(),
        })
    }
}

/// A ticket comment as fetched from the ticketing API.
///
/// The body is raw (possibly HTML); rendering for issue bodies happens in
/// `interaction::compose`.
#[derive(Debug, Clone)]
pub struct TicketComment {
    pub author: String,
    pub created: String,
    pub body: String,
}

/// A named state change available on a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketTransition {
    pub id: String,
    pub name: String,
}

/// An issue created on the code-hosting side.
#[derive(Debug, Clone)]
pub struct CreatedIssue {
    pub number: u64,
    pub url: String,
}

/// A non-success response from an upstream REST API.
///
/// Raised by the service clients so callers can surface the upstream status
/// and body. Issue creation is the only call where this aborts a request.
#[derive(Debug)]
pub struct UpstreamError {
    pub status: u16,
    pub body: String,
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upstream API responded with {}: {}", self.status, self.body)
    }
}

impl std::error::Error for UpstreamError {}

/// Advisory outcome of the ticket transition step.
///
/// Always merged into the webhook response; never changes its overall status.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<Vec<String>>,
}

impl TransitionReport {
    /// The ticket was moved via the named transition.
    pub fn applied(name: impl Into<String>) -> Self {
        Self {
            success: true,
            transition: Some(name.into()),
            error: None,
            status: None,
            body: None,
            available: None,
        }
    }

    /// No available transition matched any target fragment.
    pub fn not_found(available: Vec<String>) -> Self {
        Self {
            success: false,
            transition: None,
            error: Some("transition_not_found"),
            status: None,
            body: None,
            available: Some(available),
        }
    }

    /// The transition lookup or apply call failed.
    pub fn failed(status: Option<u16>, body: impl Into<String>) -> Self {
        Self {
            success: false,
            transition: None,
            error: Some("transition_failed"),
            status,
            body: Some(body.into()),
            available: None,
        }
    }
}

/// Success payload returned to the webhook caller.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira_transition: Option<TransitionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
}

impl WebhookAck {
    /// A duplicate was found; nothing was created.
    pub fn skipped(existing_issue: u64) -> Self {
        Self {
            ok: true,
            skipped: Some(true),
            reason: Some("issue_already_exists"),
            issue_number: Some(existing_issue),
            issue_url: None,
            jira_transition: None,
            action: None,
        }
    }

    /// An issue was created.
    pub fn created(issue: &CreatedIssue) -> Self {
        Self {
            ok: true,
            skipped: None,
            reason: None,
            issue_number: Some(issue.number),
            issue_url: Some(issue.url.clone()),
            jira_transition: None,
            action: None,
        }
    }

    pub fn with_transition(mut self, report: TransitionReport) -> Self {
        self.jira_transition = Some(report);
        self
    }

    pub fn with_action(mut self, action: &'static str) -> Self {
        self.action = Some(action);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_with_all_fields_parses() {
        let payload = json!({
            "issueKey": "ABC-123",
            "summary": "Fix the flux capacitor",
            "description": "It fluxes the wrong way.",
            "repo": "acme/widgets",
            "ref": "develop",
        });

        let event = TicketEvent::from_payload(&payload).unwrap();
        assert_eq!(event.issue_key, "ABC-123");
        assert_eq!(event.summary, "Fix the flux capacitor");
        assert_eq!(event.description.as_deref(), Some("It fluxes the wrong way."));
        assert_eq!(event.repo, "acme/widgets");
        assert_eq!(event.git_ref, "develop");
    }

    #[test]
    fn ref_defaults_to_main() {
        let payload = json!({ "issueKey": "ABC-1", "summary": "s", "repo": "o/r" });
        let event = TicketEvent::from_payload(&payload).unwrap();
        assert_eq!(event.git_ref, "main");
        assert!(event.description.is_none());
    }

    #[test]
    fn missing_fields_are_named() {
        let payload = json!({ "summary": "only a summary" });
        let missing = TicketEvent::from_payload(&payload).unwrap_err();
        assert_eq!(missing, vec!["issueKey", "repo"]);
    }

    #[test]
    fn non_object_payload_is_missing_everything() {
        let missing = TicketEvent::from_payload(&Value::Null).unwrap_err();
        assert_eq!(missing, REQUIRED_FIELDS.to_vec());
    }

    #[test]
    fn blank_required_field_counts_as_missing() {
        let payload = json!({ "issueKey": "  ", "summary": "s", "repo": "o/r" });
        let missing = TicketEvent::from_payload(&payload).unwrap_err();
        assert_eq!(missing, vec!["issueKey"]);
    }

    #[test]
    fn skipped_ack_serializes_without_empty_fields() {
        let ack = WebhookAck::skipped(17);
        let value = serde_json::to_value(&ack).unwrap();
        assert_eq!(value, json!({ "ok": true, "skipped": true, "reason": "issue_already_exists", "issue_number": 17 }));
    }

    #[test]
    fn transition_report_shapes() {
        let applied = serde_json::to_value(TransitionReport::applied("In Progress")).unwrap();
        assert_eq!(applied, json!({ "success": true, "transition": "In Progress" }));

        let not_found = serde_json::to_value(TransitionReport::not_found(vec!["Done".into()])).unwrap();
        assert_eq!(not_found, json!({ "success": false, "error": "transition_not_found", "available": ["Done"] }));

        let failed = serde_json::to_value(TransitionReport::failed(Some(409), "conflict")).unwrap();
        assert_eq!(failed, json!({ "success": false, "error": "transition_failed", "status": 409, "body": "conflict" }));
    }
}
