mod finalize;
mod generate_query;
mod planning;
mod reflection;
mod validate;
mod web_research;

pub use finalize::finalize_answer;
pub use generate_query::generate_query;
pub use planning::{planning_mode, planning_wait, PlanningCommand};
pub use reflection::{reflection, ReflectionVerdict};
pub use validate::validate_web_results_node;
pub use web_research::{web_research, WebResearchDispatch};

use crate::collaborators::Llm;
use crate::error::ResearchError;
use crate::state::OverallStateDelta;

/// Why a run suspended. Only one reason exists today, but this is tagged so
/// a future human gate (e.g. budget approval) doesn't need a new control-flow
/// shape, only a new variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InterruptReason {
    AwaitingPlanConfirmation,
}

/// Replaces the source's sentinel-exception interrupt with an explicit tagged
/// sum (design note in spec §9): every node returns one of these instead of
/// raising to unwind the stack.
pub enum NodeOutcome {
    Delta(OverallStateDelta),
    Suspend {
        reason: InterruptReason,
        delta: OverallStateDelta,
    },
    Fail(ResearchError),
}

impl NodeOutcome {
    pub fn delta(update: OverallStateDelta) -> Self {
        NodeOutcome::Delta(update)
    }
}

/// A structured-output call that retries once with a stricter instruction on
/// schema-conformance failure before escalating (spec §7: "`ValidationError`
/// on structured output is retried once with a stricter instruction; second
/// failure escalates"). Shared by `generate_query` and `reflection`, the two
/// call sites that use `generate_structured`.
pub(crate) async fn generate_structured_with_retry(
    llm: &dyn Llm,
    prompt: &str,
    schema: &serde_json::Value,
) -> Result<serde_json::Value, String> {
    let raw = llm
        .generate_structured(prompt, schema)
        .await
        .map_err(|e| e.to_string())?;

    if schema_conforms(&raw, schema) {
        return Ok(raw);
    }

    let stricter_prompt = format!(
        "{prompt}\n\nYour previous response did not match the required JSON schema. \
         Respond with strictly valid JSON conforming exactly to this schema: {schema}"
    );
    let retried = llm
        .generate_structured(&stricter_prompt, schema)
        .await
        .map_err(|e| e.to_string())?;

    if schema_conforms(&retried, schema) {
        Ok(retried)
    } else {
        Err(format!(
            "structured output still failed schema conformance after stricter retry: {retried}"
        ))
    }
}

/// Coarse conformance check: every field named in `schema.required` is
/// present on `value`. `generate_structured`'s caller still runs full
/// `serde_json::from_value` afterwards; this only gates whether the
/// stricter-instruction retry should fire.
fn schema_conforms(value: &serde_json::Value, schema: &serde_json::Value) -> bool {
    let Some(required) = schema.get("required").and_then(|r| r.as_array()) else {
        return true;
    };
    let Some(object) = value.as_object() else {
        return false;
    };
    required
        .iter()
        .filter_map(|r| r.as_str())
        .all(|field| object.contains_key(field))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::collaborators::GroundedResponse;
    use crate::error::LlmError;

    struct ScriptedLlm {
        responses: Vec<serde_json::Value>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Llm for ScriptedLlm {
        async fn generate_structured(
            &self,
            _prompt: &str,
            _schema: &serde_json::Value,
        ) -> Result<serde_json::Value, LlmError> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.responses[i.min(self.responses.len() - 1)].clone())
        }

        async fn generate_text(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok(String::new())
        }

        async fn generate_with_search(&self, _prompt: &str) -> Result<GroundedResponse, LlmError> {
            Ok(GroundedResponse {
                text: String::new(),
                grounding_metadata: vec![],
            })
        }
    }

    fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "queries": { "type": "array" } },
            "required": ["queries"]
        })
    }

    #[tokio::test]
    async fn non_conforming_output_retries_once_with_stricter_prompt() {
        let llm = ScriptedLlm {
            responses: vec![json!({"oops": true}), json!({"queries": ["a"]})],
            calls: AtomicUsize::new(0),
        };
        let result = generate_structured_with_retry(&llm, "prompt", &schema()).await;
        assert_eq!(result.unwrap(), json!({"queries": ["a"]}));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_non_conforming_response_escalates() {
        let llm = ScriptedLlm {
            responses: vec![json!({"oops": true}), json!({"still_wrong": true})],
            calls: AtomicUsize::new(0),
        };
        let result = generate_structured_with_retry(&llm, "prompt", &schema()).await;
        assert!(result.is_err());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn conforming_first_response_does_not_retry() {
        let llm = ScriptedLlm {
            responses: vec![json!({"queries": ["a"]})],
            calls: AtomicUsize::new(0),
        };
        let result = generate_structured_with_retry(&llm, "prompt", &schema()).await;
        assert!(result.is_ok());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }
}
