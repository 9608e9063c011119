//! End-to-end scenarios from the spec's testable-properties table, driven
//! through the full `ResearchEngine` against a scripted fake `Llm` — no
//! network, no real model.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::json;

use wesichain_core::Role;
use wesichain_deepresearch::{
    ConversationMessage, GroundedResponse, GroundingChunk, Llm, LlmError, OverallState,
    PlanStepStatus, ResearchConfig, ResearchEngine, RunOutcome,
};

/// A fake `Llm` whose behavior is scripted per-call-kind: returns canned
/// structured verdicts for `generate_structured`, canned grounded responses
/// keyed by prompt substring for `generate_with_search`, and a fixed closing
/// answer for `generate_text`.
struct ScriptedLlm {
    /// Structured responses returned in order for each `generate_structured` call.
    structured_queue: Mutex<Vec<serde_json::Value>>,
    /// Grounded responses keyed by a substring of the query embedded in the prompt.
    grounded: HashMap<&'static str, GroundedResponseScript>,
    /// How many times `generate_with_search` should fail before succeeding, per query substring.
    fail_before_success: HashMap<&'static str, usize>,
    search_calls: Mutex<HashMap<String, usize>>,
    finalize_answer: String,
}

#[derive(Clone)]
struct GroundedResponseScript {
    text: &'static str,
    urls: Vec<(&'static str, &'static str)>,
}

impl ScriptedLlm {
    fn new() -> Self {
        Self {
            structured_queue: Mutex::new(Vec::new()),
            grounded: HashMap::new(),
            fail_before_success: HashMap::new(),
            search_calls: Mutex::new(HashMap::new()),
            finalize_answer: "Final answer.".to_string(),
        }
    }

    fn with_structured(mut self, values: Vec<serde_json::Value>) -> Self {
        self.structured_queue = Mutex::new(values);
        self
    }

    fn with_grounded(mut self, key: &'static str, text: &'static str, urls: Vec<(&'static str, &'static str)>) -> Self {
        self.grounded.insert(key, GroundedResponseScript { text, urls });
        self
    }

    fn with_failures_before_success(mut self, key: &'static str, n: usize) -> Self {
        self.fail_before_success.insert(key, n);
        self
    }
}

#[async_trait::async_trait]
impl Llm for ScriptedLlm {
    async fn generate_structured(
        &self,
        _prompt: &str,
        _schema: &serde_json::Value,
    ) -> Result<serde_json::Value, LlmError> {
        let mut queue = self.structured_queue.lock().unwrap();
        if queue.is_empty() {
            return Ok(json!({"queries": []}));
        }
        Ok(queue.remove(0))
    }

    async fn generate_text(&self, _prompt: &str) -> Result<String, LlmError> {
        Ok(self.finalize_answer.clone())
    }

    async fn generate_with_search(&self, prompt: &str) -> Result<GroundedResponse, LlmError> {
        let key = self
            .grounded
            .keys()
            .find(|k| prompt.contains(**k))
            .copied()
            .unwrap_or("");

        if let Some(&limit) = self.fail_before_success.get(key) {
            let mut calls = self.search_calls.lock().unwrap();
            let count = calls.entry(key.to_string()).or_insert(0);
            *count += 1;
            if *count <= limit {
                return Err(LlmError::Transient("provider hiccup".to_string()));
            }
        }

        let script = self.grounded.get(key).cloned().unwrap_or(GroundedResponseScript {
            text: "no evidence found",
            urls: vec![],
        });

        let mut grounding = Vec::new();
        let mut end = script.text.len();
        for (url, label) in &script.urls {
            grounding.push(GroundingChunk {
                segment_start: 0,
                segment_end: end,
                url: url.to_string(),
                label: label.to_string(),
            });
            end = end.saturating_sub(1);
        }

        Ok(GroundedResponse {
            text: script.text.to_string(),
            grounding_metadata: grounding,
        })
    }
}

fn state_with_question(question: &str, initial_count: u32, max_loops: u32) -> OverallState {
    let mut state = OverallState::new(initial_count, max_loops, "test-model");
    state.messages.push(ConversationMessage::user("m1", question));
    state
}

/// Scenario 1: a normal question with two initial queries and one reflection
/// loop produces a cited final message and a bounded loop count.
#[tokio::test]
async fn scenario_1_normal_run_terminates_with_citation() {
    let llm = Arc::new(
        ScriptedLlm::new()
            .with_structured(vec![
                json!({"queries": ["euro 2024 top scorer", "euro 2024 golden boot"]}),
                json!({"is_sufficient": true, "knowledge_gap": "", "follow_up_queries": []}),
            ])
            .with_grounded(
                "euro 2024 top scorer",
                "Player X led scoring.",
                vec![("https://uefa.example/stats", "UEFA stats")],
            )
            .with_grounded(
                "euro 2024 golden boot",
                "The golden boot went to Player X.",
                vec![("https://uefa.example/stats", "UEFA stats")],
            ),
    );

    let engine = ResearchEngine::builder()
        .with_llm(llm)
        .with_config(
            ResearchConfig::default()
                .with_initial_search_query_count(2)
                .with_max_research_loops(1),
        )
        .build();

    let state = state_with_question("Who scored most goals in Euro 2024?", 2, 1);
    let outcome = engine.invoke("scenario-1", state).await.unwrap();

    match outcome {
        RunOutcome::Completed(final_state) => {
            assert_eq!(final_state.search_query.len(), 2);
            assert_eq!(final_state.research_loop_count, 1);
            assert!(!final_state.sources_gathered.is_empty());
            let answer = final_state.messages.last().unwrap();
            assert_eq!(answer.role, Role::Assistant);
            assert!(!answer.content.is_empty());
        }
        RunOutcome::Interrupted { .. } => panic!("expected completion"),
    }
}

/// Scenario 2: `/plan` halts the run with an interrupt before any research happens.
#[tokio::test]
async fn scenario_2_plan_command_interrupts_before_research() {
    let llm = Arc::new(ScriptedLlm::new().with_structured(vec![json!({"queries": ["q1"]})]));
    let engine = ResearchEngine::builder().with_llm(llm).build();

    let state = state_with_question("/plan", 2, 2);
    let outcome = engine.invoke("scenario-2", state).await.unwrap();

    match outcome {
        RunOutcome::Interrupted { state, reason } => {
            assert_eq!(reason, "awaiting_plan_confirmation");
            assert!(state.web_research_result.is_empty());
            assert!(engine.get_state("scenario-2").await.unwrap().is_some());
        }
        RunOutcome::Completed(_) => panic!("expected interrupt"),
    }
}

/// Scenario 3: resuming with `/confirm_plan` after scenario 2 proceeds to completion.
#[tokio::test]
async fn scenario_3_confirm_plan_resumes_to_completion() {
    let llm = Arc::new(
        ScriptedLlm::new()
            .with_structured(vec![
                json!({"queries": ["rust async runtimes"]}),
                json!({"is_sufficient": true, "knowledge_gap": "", "follow_up_queries": []}),
            ])
            .with_grounded(
                "rust async runtimes",
                "Tokio is the dominant async runtime.",
                vec![("https://tokio.example/docs", "Tokio docs")],
            ),
    );
    let engine = ResearchEngine::builder().with_llm(llm).build();

    let state = state_with_question("/plan", 1, 1);
    let first = engine.invoke("scenario-3", state).await.unwrap();
    assert!(matches!(first, RunOutcome::Interrupted { .. }));

    let second = engine
        .resume("scenario-3", ConversationMessage::user("m2", "/confirm_plan"))
        .await
        .unwrap();

    match second {
        RunOutcome::Completed(final_state) => {
            assert_eq!(final_state.planning_status, wesichain_deepresearch::PlanningStatus::Confirmed);
            assert!(!final_state.messages.is_empty());
        }
        RunOutcome::Interrupted { .. } => panic!("expected completion after confirm"),
    }
}

/// Scenario 4: `/end_plan` after the interrupt finalizes with zero evidence.
#[tokio::test]
async fn scenario_4_end_plan_finalizes_with_no_evidence() {
    let llm = Arc::new(ScriptedLlm::new().with_structured(vec![json!({"queries": ["q1"]})]));
    let engine = ResearchEngine::builder().with_llm(llm).build();

    let state = state_with_question("/plan", 1, 1);
    let first = engine.invoke("scenario-4", state).await.unwrap();
    assert!(matches!(first, RunOutcome::Interrupted { .. }));

    let second = engine
        .resume("scenario-4", ConversationMessage::user("m2", "/end_plan"))
        .await
        .unwrap();

    match second {
        RunOutcome::Completed(final_state) => {
            assert_eq!(final_state.planning_status, wesichain_deepresearch::PlanningStatus::Ended);
            assert!(final_state.web_research_result.is_empty());
            assert!(!final_state.messages.is_empty());
        }
        RunOutcome::Interrupted { .. } => panic!("expected completion after end_plan"),
    }
}

/// Scenario 5: two branches surface the same URL; the run dedupes to one
/// source record and both rendered texts cite the same `short_url`.
#[tokio::test]
async fn scenario_5_repeated_url_across_branches_dedupes_to_one_source() {
    let llm = Arc::new(
        ScriptedLlm::new()
            .with_structured(vec![
                json!({"queries": ["topic a", "topic b", "topic c"]}),
                json!({"is_sufficient": true, "knowledge_gap": "", "follow_up_queries": []}),
            ])
            .with_grounded("topic a", "Evidence about topic a.", vec![("https://shared.example/page", "Shared page")])
            .with_grounded("topic b", "Evidence about topic b.", vec![("https://shared.example/page", "Shared page")])
            .with_grounded("topic c", "Evidence about topic c.", vec![("https://unique.example/page", "Unique page")]),
    );

    let engine = ResearchEngine::builder()
        .with_llm(llm)
        .with_config(
            ResearchConfig::default()
                .with_initial_search_query_count(3)
                .with_max_research_loops(1)
                .with_max_parallel(3),
        )
        .build();

    let state = state_with_question("Compare three topics", 3, 1);
    let outcome = engine.invoke("scenario-5", state).await.unwrap();

    match outcome {
        RunOutcome::Completed(final_state) => {
            let shared_sources: Vec<_> = final_state
                .sources_gathered
                .iter()
                .filter(|s| s.original_url == "https://shared.example/page")
                .collect();
            assert_eq!(shared_sources.len(), 1);
            assert_eq!(final_state.sources_gathered.len(), 2);

            let shared_short_url = shared_sources[0].short_url.clone();
            let a = final_state
                .web_research_result
                .iter()
                .find(|r| r.text.contains("topic a"))
                .unwrap();
            let b = final_state
                .web_research_result
                .iter()
                .find(|r| r.text.contains("topic b"))
                .unwrap();
            assert!(a.text.contains(&shared_short_url));
            assert!(b.text.contains(&shared_short_url));
        }
        RunOutcome::Interrupted { .. } => panic!("expected completion"),
    }
}

/// Scenario 6: one of three branches fails after exhausting retries; the run
/// still completes, with an empty entry for the failed segment and a
/// feedback note naming it.
#[tokio::test]
async fn scenario_6_one_branch_exhausts_retries_others_complete() {
    let llm = Arc::new(
        ScriptedLlm::new()
            .with_structured(vec![
                json!({"queries": ["alpha query", "beta query", "gamma query"]}),
                json!({"is_sufficient": true, "knowledge_gap": "", "follow_up_queries": []}),
            ])
            .with_grounded("alpha query", "Evidence alpha.", vec![("https://a.example", "A")])
            .with_grounded("beta query", "Evidence beta.", vec![("https://b.example", "B")])
            .with_grounded("gamma query", "Evidence gamma.", vec![("https://c.example", "C")])
            // exceeds the default attempt_limit of 3 so this branch degrades to empty
            .with_failures_before_success("beta query", 10),
    );

    let engine = ResearchEngine::builder()
        .with_llm(llm)
        .with_config(
            ResearchConfig::default()
                .with_initial_search_query_count(3)
                .with_max_research_loops(1)
                .with_max_parallel(3),
        )
        .build();

    let state = state_with_question("Three independent facts", 3, 1);
    let outcome = engine.invoke("scenario-6", state).await.unwrap();

    match outcome {
        RunOutcome::Completed(final_state) => {
            // The failed branch degrades to an empty summary at the aggregation
            // step, then keyword validation drops it outright since the other
            // two branches have matching text and the all-fail fallback doesn't
            // apply.
            assert_eq!(final_state.web_research_result.len(), 2);
            assert!(final_state.web_research_result.iter().all(|r| !r.text.is_empty()));
            assert!(final_state
                .planning_feedback
                .iter()
                .any(|f| f.contains("beta query")));
        }
        RunOutcome::Interrupted { .. } => panic!("expected completion"),
    }
}

/// Boundary: `max_research_loops = 0` routes straight to finalize on first visit.
#[tokio::test]
async fn boundary_zero_max_loops_finalizes_on_first_reflection() {
    let llm = Arc::new(
        ScriptedLlm::new()
            .with_structured(vec![
                json!({"queries": ["only query"]}),
                json!({"is_sufficient": false, "knowledge_gap": "still missing", "follow_up_queries": ["another query"]}),
            ])
            .with_grounded("only query", "Some evidence.", vec![("https://x.example", "X")]),
    );

    let engine = ResearchEngine::builder()
        .with_llm(llm)
        .with_config(
            ResearchConfig::default()
                .with_initial_search_query_count(1)
                .with_max_research_loops(0),
        )
        .build();

    let state = state_with_question("A narrow question", 1, 0);
    let outcome = engine.invoke("scenario-boundary-0", state).await.unwrap();

    match outcome {
        RunOutcome::Completed(final_state) => {
            assert_eq!(final_state.research_loop_count, 1);
            assert!(!final_state.messages.is_empty());
        }
        RunOutcome::Interrupted { .. } => panic!("expected completion"),
    }
}

/// A reflection follow-up query must turn into a new pending `PlanStep`, not
/// just a `search_query` entry invisible to `fanout_router` once a plan
/// exists — otherwise the second wave never dispatches and the loop count
/// never advances past 1 even though `max_research_loops` allows more.
#[tokio::test]
async fn scenario_multi_loop_follow_up_query_gets_researched() {
    let llm = Arc::new(
        ScriptedLlm::new()
            .with_structured(vec![
                json!({"queries": ["solar eclipse 2024"]}),
                json!({"is_sufficient": false, "knowledge_gap": "missing path details", "follow_up_queries": ["lunar eclipse date"]}),
                json!({"is_sufficient": true, "knowledge_gap": "", "follow_up_queries": []}),
            ])
            .with_grounded(
                "solar eclipse 2024",
                "The solar eclipse crossed North America.",
                vec![("https://nasa.example/solar", "NASA solar")],
            )
            .with_grounded(
                "lunar eclipse date",
                "The next lunar eclipse is in September.",
                vec![("https://nasa.example/lunar", "NASA lunar")],
            ),
    );

    let engine = ResearchEngine::builder()
        .with_llm(llm)
        .with_config(
            ResearchConfig::default()
                .with_initial_search_query_count(1)
                .with_max_research_loops(2),
        )
        .build();

    let state = state_with_question("When is the next eclipse?", 1, 2);
    let outcome = engine.invoke("scenario-multi-loop", state).await.unwrap();

    match outcome {
        RunOutcome::Completed(final_state) => {
            assert_eq!(final_state.research_loop_count, 2);
            assert_eq!(final_state.planning_steps.len(), 2);
            assert!(final_state
                .planning_steps
                .iter()
                .all(|s| s.status == PlanStepStatus::Done));
            assert_eq!(final_state.web_research_result.len(), 2);
            assert_eq!(final_state.sources_gathered.len(), 2);
        }
        RunOutcome::Interrupted { .. } => panic!("expected completion"),
    }
}

/// Law: resuming the same checkpoint twice with the same input produces the
/// same terminal `planning_status`.
#[tokio::test]
async fn law_idempotent_resume_with_same_input() {
    let make_engine = || {
        let llm = Arc::new(ScriptedLlm::new().with_structured(vec![json!({"queries": ["q"]})]));
        ResearchEngine::builder().with_llm(llm).build()
    };

    let engine = make_engine();
    let state = state_with_question("/plan", 1, 1);
    engine.invoke("idempotent-thread", state).await.unwrap();

    let first = engine
        .resume("idempotent-thread", ConversationMessage::user("m2", "/end_plan"))
        .await
        .unwrap();
    let status_after_first = match &first {
        RunOutcome::Completed(s) => s.planning_status,
        RunOutcome::Interrupted { state, .. } => state.planning_status,
    };

    // Re-resume against the checkpoint the first resume left behind. Since
    // planning_status is already terminal (`Ended`), planning_mode treats
    // the replayed command as a no-op and the run proceeds to the same
    // finalized outcome rather than re-opening planning.
    let second = engine
        .resume("idempotent-thread", ConversationMessage::user("m3", "/end_plan"))
        .await
        .unwrap();
    let status_after_second = match &second {
        RunOutcome::Completed(s) => s.planning_status,
        RunOutcome::Interrupted { state, .. } => state.planning_status,
    };

    assert_eq!(status_after_first, status_after_second);
}

/// Universal invariant: every `short_url` cited in a rendered summary has a
/// matching record in `sources_gathered`.
#[tokio::test]
async fn invariant_every_cited_short_url_has_a_source_record() {
    let llm = Arc::new(
        ScriptedLlm::new()
            .with_structured(vec![
                json!({"queries": ["invariant query"]}),
                json!({"is_sufficient": true, "knowledge_gap": "", "follow_up_queries": []}),
            ])
            .with_grounded("invariant query", "Claim here.", vec![("https://z.example", "Z")]),
    );

    let engine = ResearchEngine::builder()
        .with_llm(llm)
        .with_config(ResearchConfig::default().with_initial_search_query_count(1).with_max_research_loops(1))
        .build();

    let state = state_with_question("Check invariant", 1, 1);
    let outcome = engine.invoke("invariant-thread", state).await.unwrap();

    let final_state = match outcome {
        RunOutcome::Completed(s) => s,
        RunOutcome::Interrupted { .. } => panic!("expected completion"),
    };

    for result in &final_state.web_research_result {
        for source in &final_state.sources_gathered {
            if result.text.contains(&source.short_url) {
                assert!(final_state
                    .sources_gathered
                    .iter()
                    .any(|s| s.short_url == source.short_url));
            }
        }
    }
}
