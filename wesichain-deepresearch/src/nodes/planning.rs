use crate::nodes::{InterruptReason, NodeOutcome};
use crate::state::{OverallState, OverallStateDelta, PlanStep, PlanningStatus};

/// Recognized bare commands on the `messages` channel (spec §6.2).
/// Case-insensitive, whitespace-tolerant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanningCommand {
    Plan,
    ConfirmPlan,
    EndPlan,
    None,
}

impl PlanningCommand {
    pub fn parse(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "/plan" => PlanningCommand::Plan,
            "/confirm_plan" => PlanningCommand::ConfirmPlan,
            "/end_plan" => PlanningCommand::EndPlan,
            _ => PlanningCommand::None,
        }
    }
}

fn build_plan_steps(queries: &[String]) -> Vec<PlanStep> {
    queries
        .iter()
        .enumerate()
        .map(|(i, query)| PlanStep::new(i as u64 + 1, query.clone()))
        .collect()
}

fn propose_plan(state: &OverallState) -> NodeOutcome {
    let queries: Vec<String> = if state.search_query.is_empty() {
        state
            .latest_user_message()
            .map(|m| vec![m.content.clone()])
            .unwrap_or_default()
    } else {
        state.search_query.clone()
    };
    let steps = build_plan_steps(&queries);
    let summary = format!("proposed a plan with {} step(s) for review", steps.len());
    NodeOutcome::delta(OverallStateDelta {
        planning_steps: Some(steps),
        planning_status: Some(PlanningStatus::Proposed),
        planning_feedback: vec![summary],
        ..Default::default()
    })
}

/// `planning_mode` (spec §4.3): handles `/plan`, `/confirm_plan`, `/end_plan`
/// bare commands, or proposes a plan from the generated queries otherwise.
pub fn planning_mode(state: &OverallState) -> NodeOutcome {
    if state.planning_status.is_terminal() {
        return NodeOutcome::delta(OverallStateDelta::default());
    }

    let Some(user_message) = state.latest_user_message() else {
        return NodeOutcome::delta(OverallStateDelta::default());
    };
    let command = PlanningCommand::parse(&user_message.content);

    match command {
        PlanningCommand::ConfirmPlan => NodeOutcome::delta(OverallStateDelta {
            planning_status: Some(PlanningStatus::Confirmed),
            planning_feedback: vec!["plan confirmed by user".to_string()],
            ..Default::default()
        }),
        PlanningCommand::EndPlan => NodeOutcome::delta(OverallStateDelta {
            planning_status: Some(PlanningStatus::Ended),
            planning_feedback: vec!["research skipped by user; proceeding to finalize".to_string()],
            ..Default::default()
        }),
        PlanningCommand::Plan => propose_plan(state),
        PlanningCommand::None => match state.planning_status {
            PlanningStatus::None => {
                let steps = build_plan_steps(&state.search_query);
                NodeOutcome::delta(OverallStateDelta {
                    planning_steps: Some(steps),
                    planning_status: Some(PlanningStatus::AutoApproved),
                    ..Default::default()
                })
            }
            PlanningStatus::Proposed | PlanningStatus::AwaitingConfirmation => propose_plan(state),
            _ => NodeOutcome::delta(OverallStateDelta::default()),
        },
    }
}

/// `planning_wait` (spec §4.4): marks the run as awaiting human confirmation
/// and suspends. On resume the next user message is fed back into
/// `planning_mode`.
pub fn planning_wait(_state: &OverallState) -> NodeOutcome {
    NodeOutcome::Suspend {
        reason: InterruptReason::AwaitingPlanConfirmation,
        delta: OverallStateDelta {
            planning_status: Some(PlanningStatus::AwaitingConfirmation),
            planning_feedback: vec!["awaiting plan confirmation".to_string()],
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ConversationMessage;

    fn state_with_message(text: &str) -> OverallState {
        let mut state = OverallState::new(2, 2, "model");
        state.messages.push(ConversationMessage::user("m1", text));
        state
    }

    #[test]
    fn command_parsing_is_case_insensitive_and_whitespace_tolerant() {
        assert_eq!(PlanningCommand::parse("  /PLAN  "), PlanningCommand::Plan);
        assert_eq!(
            PlanningCommand::parse("/Confirm_Plan"),
            PlanningCommand::ConfirmPlan
        );
        assert_eq!(PlanningCommand::parse("/end_plan"), PlanningCommand::EndPlan);
        assert_eq!(PlanningCommand::parse("hello there"), PlanningCommand::None);
    }

    #[test]
    fn normal_query_auto_approves() {
        let mut state = state_with_message("what is the tallest mountain?");
        state.search_query = vec!["tallest mountain".to_string()];
        let outcome = planning_mode(&state);
        match outcome {
            NodeOutcome::Delta(delta) => {
                assert_eq!(delta.planning_status, Some(PlanningStatus::AutoApproved));
            }
            _ => panic!("expected delta"),
        }
    }

    #[test]
    fn plan_command_proposes_and_confirm_plan_closes_it() {
        let state = state_with_message("/plan");
        let outcome = planning_mode(&state);
        let mut state = state;
        match outcome {
            NodeOutcome::Delta(delta) => {
                assert_eq!(delta.planning_status, Some(PlanningStatus::Proposed));
                state = OverallState::apply(&state, delta);
            }
            _ => panic!("expected delta"),
        }

        let wait = planning_wait(&state);
        match wait {
            NodeOutcome::Suspend { reason, delta } => {
                assert_eq!(reason, InterruptReason::AwaitingPlanConfirmation);
                state = OverallState::apply(&state, delta);
            }
            _ => panic!("expected suspend"),
        }
        assert_eq!(state.planning_status, PlanningStatus::AwaitingConfirmation);

        state.messages.push(ConversationMessage::user("m2", "/confirm_plan"));
        let outcome = planning_mode(&state);
        match outcome {
            NodeOutcome::Delta(delta) => {
                assert_eq!(delta.planning_status, Some(PlanningStatus::Confirmed));
            }
            _ => panic!("expected delta"),
        }
    }

    #[test]
    fn terminal_status_is_a_no_op() {
        let mut state = state_with_message("anything");
        state.planning_status = PlanningStatus::Ended;
        let outcome = planning_mode(&state);
        match outcome {
            NodeOutcome::Delta(delta) => {
                assert!(delta.planning_status.is_none());
            }
            _ => panic!("expected delta"),
        }
    }
}
