use crate::keywords::validate_web_results;
use crate::nodes::NodeOutcome;
use crate::state::{OverallState, OverallStateDelta};

/// `validate_web_results` (spec §4.8). Rewrites `web_research_result` to the
/// filtered set and records an aggregate feedback note when anything was
/// dropped or the all-fail fallback kicked in.
///
/// This node does not use the append-only reducer for `web_research_result`:
/// it emits a full replacement via the driver's dedicated "replace filtered
/// set" path rather than appending, since its job is to narrow, not grow,
/// the accumulated results.
pub fn validate_web_results_node(state: &OverallState) -> NodeOutcome {
    let outcome = validate_web_results(
        &state.search_query,
        state.web_research_result.clone(),
    );

    let mut delta = OverallStateDelta::default();
    if let Some(note) = outcome.feedback {
        delta.planning_feedback.push(note);
    }
    delta.replace_web_research_result = Some(outcome.kept);
    NodeOutcome::delta(delta)
}
