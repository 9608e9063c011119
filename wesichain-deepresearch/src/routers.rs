use std::collections::HashSet;

use crate::nodes::WebResearchDispatch;
use crate::state::{OverallState, PlanStepStatus, PlanningStatus};

/// `planning_router` (spec §4.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanningRoute {
    Wait,
    Research,
    SkipToFinalize,
}

pub fn planning_router(state: &OverallState) -> PlanningRoute {
    match state.planning_status {
        PlanningStatus::Proposed | PlanningStatus::AwaitingConfirmation => PlanningRoute::Wait,
        PlanningStatus::Confirmed | PlanningStatus::AutoApproved => PlanningRoute::Research,
        PlanningStatus::Ended => PlanningRoute::SkipToFinalize,
        PlanningStatus::None => PlanningRoute::Wait,
    }
}

/// `fanout_router` (spec §4.6): one dispatch per pending `PlanStep` when a
/// plan exists, otherwise one per `search_query` entry not yet represented in
/// `web_research_result`. `segment_id` is the position used for deterministic
/// aggregation at the join (spec §5).
pub fn fanout_router(state: &OverallState) -> Vec<WebResearchDispatch> {
    if !state.planning_steps.is_empty() {
        return state
            .planning_steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.status == PlanStepStatus::Pending)
            .map(|(i, step)| WebResearchDispatch {
                query: step.query.clone(),
                segment_id: i as u64,
                plan_step_id: Some(step.id),
            })
            .collect();
    }

    let already_researched: HashSet<u64> = state
        .web_research_result
        .iter()
        .map(|r| r.segment_id)
        .collect();

    state
        .search_query
        .iter()
        .enumerate()
        .filter(|(i, _)| !already_researched.contains(&(*i as u64)))
        .map(|(i, query)| WebResearchDispatch {
            query: query.clone(),
            segment_id: i as u64,
            plan_step_id: None,
        })
        .collect()
}

/// `evaluate_research` (spec §4.10).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResearchRoute {
    Finalize,
    ContinueFanout,
}

pub fn evaluate_research(state: &OverallState) -> ResearchRoute {
    if state.is_sufficient || state.research_loop_count >= state.max_research_loops {
        return ResearchRoute::Finalize;
    }
    // Boundary behavior (spec §8): empty follow-ups with is_sufficient=false
    // still terminates rather than looping forever.
    if fanout_router(state).is_empty() {
        return ResearchRoute::Finalize;
    }
    ResearchRoute::ContinueFanout
}
