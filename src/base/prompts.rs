//! Fixed directive and instruction text embedded in hosted issues.

/// Directive line that invokes the coding agent on implementation issues.
pub const IMPLEMENT_AGENT_DIRECTIVE: &str =
    "AI agent: implement the change described below and open a pull request against the base branch when the work is ready.";

/// Directive line that invokes the coding agent on research issues.
pub const RESEARCH_AGENT_DIRECTIVE: &str =
    "AI agent: research the question described below. Produce a written plan; do not implement anything yet.";

/// Follow-up contract appended to research issues.
///
/// The downstream workflow that consumes these issues is expected to close the
/// loop on the ticket itself, so the instructions are stated in the issue.
pub const RESEARCH_FOLLOWUP_INSTRUCTIONS: &str = r#"When the research is complete:
- Post the resulting plan back to the source ticket as a comment.
- Move the ticket to "To Do".
- Unassign the ticket so a teammate can pick it up."#;

/// Lead line of the comment posted back to the ticket by the implement flow.
pub const STARTED_WORK_NOTICE: &str = "An automated coding agent has started work on this ticket.";

/// Lead line of the comment posted back to the ticket by the research flow.
pub const RESEARCH_STARTED_NOTICE: &str = "An automated research agent has picked up this ticket.";
