//! Best-effort ticket state advancement.
//!
//! Transition names vary by installation, so the target is found by testing
//! an ordered list of name fragments against the available transitions. The
//! whole step is advisory: every failure path collapses into a
//! `TransitionReport` and the webhook request succeeds regardless.

use tracing::{info, instrument, warn};

use crate::{
    base::types::{TicketTransition, TransitionReport, UpstreamError},
    service::tickets::TicketClient,
};

/// Name fragments that identify an "work has started" state, in match order.
///
/// The first fragment that matches any available transition wins; this is an
/// ordered policy, not a closest-match search.
pub const TARGET_FRAGMENTS: [&str; 5] = ["in progress", "start progress", "begin", "start work", "working"];

/// Pick the transition to apply, if any.
fn pick_transition<'a>(transitions: &'a [TicketTransition]) -> Option<&'a TicketTransition> {
    TARGET_FRAGMENTS
        .iter()
        .find_map(|fragment| transitions.iter().find(|t| t.name.to_lowercase().contains(fragment)))
}

/// Move the ticket toward "in progress", reporting the outcome.
#[instrument(skip(tickets))]
pub async fn advance_ticket(tickets: &TicketClient, ticket_key: &str) -> TransitionReport {
    let transitions = match tickets.available_transitions(ticket_key).await {
        Ok(transitions) => transitions,
        Err(err) => {
            warn!("Transition lookup failed for {ticket_key}: {err}");
            return failure_report(err);
        }
    };

    let Some(target) = pick_transition(&transitions) else {
        let available = transitions.into_iter().map(|t| t.name).collect::<Vec<_>>();
        warn!("No matching transition for {ticket_key}; available: {available:?}");
        return TransitionReport::not_found(available);
    };

    match tickets.apply_transition(ticket_key, &target.id).await {
        Ok(()) => {
            info!("Moved {ticket_key} via transition `{}`", target.name);
            TransitionReport::applied(target.name.clone())
        }
        Err(err) => {
            warn!("Transition `{}` failed for {ticket_key}: {err}", target.name);
            failure_report(err)
        }
    }
}

/// Fold an error into a failure report, keeping upstream status and body
/// when the error carries them.
fn failure_report(err: anyhow::Error) -> TransitionReport {
    match err.downcast_ref::<UpstreamError>() {
        Some(upstream) => TransitionReport::failed(Some(upstream.status), upstream.body.clone()),
        None => TransitionReport::failed(None, err.to_string()),
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(id: &str, name: &str) -> TicketTransition {
        TicketTransition {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn match_is_case_insensitive_substring() {
        let transitions = vec![transition("1", "Backlog"), transition("2", "Start Progress on Issue")];
        assert_eq!(pick_transition(&transitions).map(|t| t.id.as_str()), Some("2"));
    }

    #[test]
    fn fragment_order_beats_transition_order() {
        // "Begin Work" appears first in the set, but "in progress" is the
        // higher-priority fragment.
        let transitions = vec![transition("1", "Begin Work"), transition("2", "Move to In Progress")];
        assert_eq!(pick_transition(&transitions).map(|t| t.id.as_str()), Some("2"));
    }

    #[test]
    fn first_matching_transition_wins_within_a_fragment() {
        let transitions = vec![transition("1", "In Progress (dev)"), transition("2", "In Progress (review)")];
        assert_eq!(pick_transition(&transitions).map(|t| t.id.as_str()), Some("1"));
    }

    #[test]
    fn no_match_yields_none() {
        let transitions = vec![transition("1", "Done"), transition("2", "Blocked")];
        assert!(pick_transition(&transitions).is_none());
    }
}
