//! Issue body and title composition.
//!
//! Everything here is a pure text transformation over fetched ticket data;
//! the only network call is the comment fetch, which degrades to a
//! placeholder rather than failing the flow.

use tracing::warn;

use crate::{
    base::{
        prompts,
        types::{TicketComment, TicketEvent},
    },
    service::tickets::TicketClient,
};

/// Rendered in place of the comment thread when there is nothing to show.
pub const NO_COMMENTS_PLACEHOLDER: &str = "(no comments)";

/// Rendered in place of an absent ticket description.
pub const NO_DESCRIPTION_PLACEHOLDER: &str = "(no description)";

/// Comment bodies longer than this are cut off with an ellipsis.
const COMMENT_PREVIEW_LIMIT: usize = 1000;

/// Fetch and render the ticket's comment thread.
///
/// Any fetch failure degrades to the placeholder; the issue still gets created.
pub async fn gather_comments(tickets: &TicketClient, ticket_key: &str) -> String {
    let comments = match tickets.list_comments(ticket_key).await {
        Ok(comments) => comments,
        Err(err) => {
            warn!("Comment fetch failed for {ticket_key}, using placeholder: {err}");
            return NO_COMMENTS_PLACEHOLDER.to_string();
        }
    };

    if comments.is_empty() {
        return NO_COMMENTS_PLACEHOLDER.to_string();
    }

    comments.iter().map(render_comment).collect::<Vec<_>>().join("\n\n")
}

/// Render one comment as a bullet line with a day-granularity date and a
/// tag-stripped, length-capped preview.
fn render_comment(comment: &TicketComment) -> String {
    let date: String = comment.created.chars().take(10).collect();
    let preview = truncate_preview(&strip_html(&comment.body), COMMENT_PREVIEW_LIMIT);

    format!("- {} ({}):\n  {}", comment.author, date, preview)
}

/// Strip HTML tags with a single forward pass.
pub fn strip_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;

    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    out.trim().to_string()
}

/// Cap text at `limit` characters, marking the cut with a single ellipsis.
fn truncate_preview(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let mut preview: String = text.chars().take(limit).collect();
    preview.push('…');
    preview
}

/// Title for implementation issues: "{key}: {summary}".
pub fn implement_title(event: &TicketEvent) -> String {
    format!("{}: {}", event.issue_key, event.summary)
}

/// Title for research issues; the summary carries a research tag.
pub fn research_title(event: &TicketEvent) -> String {
    format!("{}: [AI Research] {}", event.issue_key, event.summary)
}

/// Body for implementation issues.
pub fn implement_body(event: &TicketEvent, comments: &str, ticket_url: &str) -> String {
    format!(
        "{directive}\n\n{common}",
        directive = prompts::IMPLEMENT_AGENT_DIRECTIVE,
        common = common_sections(event, comments, ticket_url),
    )
}

/// Body for research issues; appends the fixed follow-up contract.
pub fn research_body(event: &TicketEvent, comments: &str, ticket_url: &str) -> String {
    format!(
        "{directive}\n\n{common}\n\n## Follow-up\n\n{followup}",
        directive = prompts::RESEARCH_AGENT_DIRECTIVE,
        common = common_sections(event, comments, ticket_url),
        followup = prompts::RESEARCH_FOLLOWUP_INSTRUCTIONS,
    )
}

fn common_sections(event: &TicketEvent, comments: &str, ticket_url: &str) -> String {
    let description = event.description.as_deref().filter(|d| !d.trim().is_empty()).unwrap_or(NO_DESCRIPTION_PLACEHOLDER);

    format!(
        "## Description\n\n{description}\n\n## Jira Comments\n\n{comments}\n\n## Source\n\nJira ticket: {ticket_url}\nBase branch: {git_ref}",
        git_ref = event.git_ref,
    )
}

/// Ticket comment posted by the implement flow after issue creation.
pub fn started_work_comment(issue_url: &str) -> String {
    format!("{} GitHub issue: {issue_url}", prompts::STARTED_WORK_NOTICE)
}

/// Ticket comment posted by the research flow after issue creation.
pub fn research_started_comment(issue_url: &str) -> String {
    format!("{} Findings will be tracked in GitHub issue: {issue_url}", prompts::RESEARCH_STARTED_NOTICE)
}

// Tests.
