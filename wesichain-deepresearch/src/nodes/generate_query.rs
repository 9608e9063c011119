use std::collections::HashSet;

use serde::Deserialize;
use serde_json::json;

use crate::collaborators::Llm;
use crate::error::ResearchError;
use crate::nodes::{generate_structured_with_retry, NodeOutcome};
use crate::state::{OverallState, OverallStateDelta};

#[derive(Deserialize)]
struct QueryList {
    queries: Vec<String>,
}

fn schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "queries": {
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": ["queries"]
    })
}

/// `generate_query` (spec §4.2): asks the LLM for up to
/// `initial_search_query_count` distinct, specific search queries derived
/// from the latest user message.
pub async fn generate_query(state: &OverallState, llm: &dyn Llm) -> NodeOutcome {
    let Some(user_message) = state.latest_user_message() else {
        return NodeOutcome::Fail(ResearchError::Planning(
            "no user message to derive queries from".to_string(),
        ));
    };

    let prompt = format!(
        "Generate up to {} distinct, specific web search queries for this question. \
         Recent context: {:?}\nQuestion: {}",
        state.initial_search_query_count,
        state
            .messages
            .iter()
            .rev()
            .take(5)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>(),
        user_message.content,
    );

    let raw = match generate_structured_with_retry(llm, &prompt, &schema()).await {
        Ok(value) => value,
        Err(error) => return NodeOutcome::Fail(ResearchError::Planning(error)),
    };

    let parsed: QueryList = match serde_json::from_value(raw) {
        Ok(parsed) => parsed,
        Err(error) => {
            return NodeOutcome::Fail(ResearchError::Planning(format!(
                "query list failed schema conformance: {error}"
            )))
        }
    };

    let mut seen = HashSet::new();
    let mut queries = Vec::new();
    for query in parsed.queries {
        let key = query.trim().to_lowercase();
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        queries.push(query.trim().to_string());
        if queries.len() >= state.initial_search_query_count as usize {
            break;
        }
    }

    if queries.is_empty() {
        queries.push(user_message.content.clone());
    }

    NodeOutcome::delta(OverallStateDelta {
        search_query: queries,
        ..Default::default()
    })
}
