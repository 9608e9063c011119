use serde::Deserialize;
use serde_json::json;

use crate::collaborators::Llm;
use crate::error::ResearchError;
use crate::nodes::{generate_structured_with_retry, NodeOutcome};
use crate::state::{OverallState, OverallStateDelta, PlanStep};

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ReflectionVerdict {
    pub is_sufficient: bool,
    pub knowledge_gap: String,
    pub follow_up_queries: Vec<String>,
}

fn schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "is_sufficient": { "type": "boolean" },
            "knowledge_gap": { "type": "string" },
            "follow_up_queries": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["is_sufficient", "knowledge_gap", "follow_up_queries"]
    })
}

/// `reflection` (spec §4.9): evaluates accumulated evidence and decides
/// whether more research is needed. Increments `research_loop_count` — the
/// single increment site chosen in spec §9's open question.
pub async fn reflection(state: &OverallState, llm: &dyn Llm) -> NodeOutcome {
    let evidence = state
        .ordered_web_research_result()
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n---\n");

    let prompt = format!(
        "Queries so far: {:?}\nEvidence gathered:\n{}\n\n\
         Decide if this is sufficient to answer the original question. \
         If not, propose follow-up search queries.",
        state.search_query, evidence
    );

    let raw = match generate_structured_with_retry(llm, &prompt, &schema()).await {
        Ok(value) => value,
        Err(error) => return NodeOutcome::Fail(ResearchError::Reflection(error)),
    };

    let verdict: ReflectionVerdict = match serde_json::from_value(raw) {
        Ok(v) => v,
        Err(error) => {
            return NodeOutcome::Fail(ResearchError::Reflection(format!(
                "reflection verdict failed schema conformance: {error}"
            )))
        }
    };

    let existing: std::collections::HashSet<String> = state
        .search_query
        .iter()
        .map(|q| q.trim().to_lowercase())
        .collect();

    let mut follow_ups = Vec::new();
    let mut seen = existing.clone();
    for query in &verdict.follow_up_queries {
        let key = query.trim().to_lowercase();
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        follow_ups.push(query.trim().to_string());
    }

    let planning_steps = append_follow_up_plan_steps(&state.planning_steps, &follow_ups);

    NodeOutcome::delta(OverallStateDelta {
        research_loop_count: Some(state.research_loop_count + 1),
        is_sufficient: Some(verdict.is_sufficient),
        knowledge_gap: Some(verdict.knowledge_gap),
        search_query: follow_ups,
        planning_steps,
        ..Default::default()
    })
}

/// When a plan exists, `fanout_router` dispatches pending `PlanStep`s only
/// (spec §4.6) — a follow-up query that landed in `search_query` alone would
/// never be picked up, stalling the refinement loop. Appends one new pending
/// step per follow-up, with ids past the current max, so the next fan-out
/// wave covers them. Returns `None` (no-op delta) when there's no existing
/// plan to extend or nothing new to add.
fn append_follow_up_plan_steps(existing: &[PlanStep], follow_ups: &[String]) -> Option<Vec<PlanStep>> {
    if existing.is_empty() || follow_ups.is_empty() {
        return None;
    }
    let next_id = existing.iter().map(|s| s.id).max().unwrap_or(0) + 1;
    let mut steps = existing.to_vec();
    steps.extend(
        follow_ups
            .iter()
            .enumerate()
            .map(|(i, query)| PlanStep::new(next_id + i as u64, query.clone())),
    );
    Some(steps)
}
