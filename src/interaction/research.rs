//! The research-request flow.
//!
//! Diverges from the implement flow in three ways: the duplicate search is
//! scoped by the research label and open state (so research and
//! implementation issues for one ticket key are tracked independently), the
//! issue carries the research directive and follow-up contract, and there is
//! no ticket transition. Moving and unassigning the ticket belongs to the
//! downstream workflow that consumes the issue.

use tracing::{info, instrument, warn};

use crate::{
    base::types::{Res, TicketEvent, WebhookAck},
    service::{
        hosting::{HostingClient, IssueSearchScope},
        tickets::TicketClient,
    },
};

use super::compose;

/// Labels applied to research issues.
pub const RESEARCH_LABELS: &[&str] = &["from-jira", "ai-research"];

/// Scope that keeps the duplicate search from matching implementation issues.
const RESEARCH_SEARCH_SCOPE: IssueSearchScope = IssueSearchScope {
    label: Some("ai-research"),
    open_only: true,
};

/// Handle a research request end to end.
#[instrument(skip_all, fields(ticket = %event.issue_key, repo = %event.repo))]
pub async fn handle_research(event: &TicketEvent, hosting: &HostingClient, tickets: &TicketClient) -> Res<WebhookAck> {
    match hosting.find_existing_issue(&event.repo, &event.issue_key, RESEARCH_SEARCH_SCOPE).await {
        Ok(Some(existing)) => {
            info!("Research issue #{existing} already open for {}; skipping", event.issue_key);
            return Ok(WebhookAck::skipped(existing));
        }
        Ok(None) => {}
        Err(err) => warn!("Duplicate search failed, continuing: {err}"),
    }

    let comments = compose::gather_comments(tickets, &event.issue_key).await;
    let ticket_url = tickets.browse_url(&event.issue_key);

    let title = compose::research_title(event);
    let body = compose::research_body(event, &comments, &ticket_url);

    let issue = hosting.create_issue(&event.repo, &title, &body, RESEARCH_LABELS).await?;
    info!("Created research issue #{} for {}", issue.number, event.issue_key);

    if let Err(err) = tickets.post_comment(&event.issue_key, &compose::research_started_comment(&issue.url)).await {
        warn!("Ticket notification failed for {}: {err}", event.issue_key);
    }

    Ok(WebhookAck::created(&issue).with_action("research_issue_created"))
}
