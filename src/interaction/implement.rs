//! The implementation-request flow.

use tracing::{info, instrument, warn};

use crate::{
    base::types::{Res, TicketEvent, WebhookAck},
    service::{
        hosting::{HostingClient, IssueSearchScope},
        tickets::TicketClient,
    },
};

use super::{compose, transition};

/// Labels applied to implementation issues.
pub const IMPLEMENT_LABELS: &[&str] = &["from-jira", "ai-task"];

/// Handle an implementation request end to end.
///
/// Issue creation is the only fatal step; the duplicate search, ticket
/// transition, and ticket notification are all best-effort.
#[instrument(skip_all, fields(ticket = %event.issue_key, repo = %event.repo))]
pub async fn handle_implement(event: &TicketEvent, hosting: &HostingClient, tickets: &TicketClient) -> Res<WebhookAck> {
    // Duplicate check. A failed search never blocks creation.
    match hosting.find_existing_issue(&event.repo, &event.issue_key, IssueSearchScope::default()).await {
        Ok(Some(existing)) => {
            info!("Issue #{existing} already tracks {}; skipping", event.issue_key);
            return Ok(WebhookAck::skipped(existing));
        }
        Ok(None) => {}
        Err(err) => warn!("Duplicate search failed, continuing: {err}"),
    }

    let comments = compose::gather_comments(tickets, &event.issue_key).await;
    let ticket_url = tickets.browse_url(&event.issue_key);

    let title = compose::implement_title(event);
    let body = compose::implement_body(event, &comments, &ticket_url);

    let issue = hosting.create_issue(&event.repo, &title, &body, IMPLEMENT_LABELS).await?;
    info!("Created issue #{} for {}", issue.number, event.issue_key);

    // Advisory: surfaced in the response, never fails the request.
    let report = transition::advance_ticket(tickets, &event.issue_key).await;

    // Fire-and-forget notification back on the ticket.
    if let Err(err) = tickets.post_comment(&event.issue_key, &compose::started_work_comment(&issue.url)).await {
        warn!("Ticket notification failed for {}: {err}", event.issue_key);
    }

    Ok(WebhookAck::created(&issue).with_transition(report))
}
