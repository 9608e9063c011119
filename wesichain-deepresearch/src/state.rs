use serde::{Deserialize, Serialize};
use wesichain_core::Role;
use wesichain_graph::{AppendVec, Override, StateSchema};

/// A single turn on the `messages` channel. `id` is stable within a thread so
/// the frontend can key on it; `role` reuses the core LLM role enum rather
/// than inventing a parallel one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub id: String,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            id: id.into(),
            content: content.into(),
        }
    }

    pub fn assistant(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            id: id.into(),
            content: content.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanStepStatus {
    Pending,
    Running,
    Done,
    Skipped,
}

/// `{id, title, query, status, result?}` — see spec §3.3.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: u64,
    pub title: String,
    pub query: String,
    pub status: PlanStepStatus,
    pub result: Option<String>,
}

impl PlanStep {
    pub fn new(id: u64, query: String) -> Self {
        let title = query
            .split_whitespace()
            .take(8)
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            id,
            title,
            query,
            status: PlanStepStatus::Pending,
            result: None,
        }
    }
}

/// `{short_url, original_url, label, segment_id}` — see spec §3.4.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub short_url: String,
    pub original_url: String,
    pub label: String,
    pub segment_id: u64,
}

/// The `planning_status` state machine of spec §4.3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanningStatus {
    None,
    Proposed,
    AwaitingConfirmation,
    Confirmed,
    AutoApproved,
    Ended,
}

impl Default for PlanningStatus {
    fn default() -> Self {
        PlanningStatus::None
    }
}

impl PlanningStatus {
    /// `confirmed | auto_approved | ended` close the planning turn for the run.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PlanningStatus::Confirmed | PlanningStatus::AutoApproved | PlanningStatus::Ended
        )
    }
}

/// One rendered search summary, tagged with the `segment_id` of the branch
/// that produced it so the aggregator can sort deterministically (§5).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WebResearchResult {
    pub segment_id: u64,
    pub text: String,
}

/// The run record threaded through every node (spec §3.2).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OverallState {
    pub messages: Vec<ConversationMessage>,
    pub search_query: Vec<String>,
    pub web_research_result: Vec<WebResearchResult>,
    pub sources_gathered: Vec<SourceRecord>,
    pub initial_search_query_count: u32,
    pub max_research_loops: u32,
    pub research_loop_count: u32,
    pub reasoning_model: String,
    pub planning_steps: Vec<PlanStep>,
    pub planning_status: PlanningStatus,
    pub planning_feedback: Vec<String>,
    /// Carried over from `reflection`'s structured verdict so
    /// `evaluate_research` stays a pure predicate over `OverallState`
    /// instead of needing the verdict threaded in out-of-band. Not part of
    /// the distilled data model's field table, but present on the original
    /// system's run record and load-bearing for the router (§4.9-4.10).
    pub is_sufficient: bool,
    pub knowledge_gap: String,
}

impl OverallState {
    pub fn new(initial_search_query_count: u32, max_research_loops: u32, reasoning_model: impl Into<String>) -> Self {
        Self {
            initial_search_query_count,
            max_research_loops,
            reasoning_model: reasoning_model.into(),
            ..Default::default()
        }
    }

    /// Ordered view of `web_research_result`, sorted by `segment_id` — the
    /// deterministic-ordering property of spec §5/§8.
    pub fn ordered_web_research_result(&self) -> Vec<&WebResearchResult> {
        let mut out: Vec<&WebResearchResult> = self.web_research_result.iter().collect();
        out.sort_by_key(|r| r.segment_id);
        out
    }

    pub fn latest_user_message(&self) -> Option<&ConversationMessage> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }
}

/// Partial update applied by a node. Every field is optional/empty-by-default;
/// `OverallState::apply` combines each field with the reducer named in spec §3.2.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OverallStateDelta {
    pub messages: Vec<ConversationMessage>,
    pub search_query: Vec<String>,
    pub web_research_result: Vec<WebResearchResult>,
    /// When set, replaces `web_research_result` outright instead of appending
    /// to it. Only `validate_web_results` uses this: its job is to narrow an
    /// already-accumulated set, not grow it (spec §4.8).
    pub replace_web_research_result: Option<Vec<WebResearchResult>>,
    pub sources_gathered: Vec<SourceRecord>,
    pub initial_search_query_count: Option<u32>,
    pub max_research_loops: Option<u32>,
    pub research_loop_count: Option<u32>,
    pub reasoning_model: Option<String>,
    pub planning_steps: Option<Vec<PlanStep>>,
    pub planning_status: Option<PlanningStatus>,
    pub planning_feedback: Vec<String>,
    pub is_sufficient: Option<bool>,
    pub knowledge_gap: Option<String>,
}

fn union_sources(current: &[SourceRecord], update: Vec<SourceRecord>) -> Vec<SourceRecord> {
    let mut out = current.to_vec();
    for candidate in update {
        if !out.iter().any(|s| s.short_url == candidate.short_url) {
            out.push(candidate);
        }
    }
    out
}

impl StateSchema for OverallState {
    type Update = OverallStateDelta;

    fn apply(current: &Self, update: Self::Update) -> Self {
        OverallState {
            messages: AppendVec::merge(&current.messages, update.messages),
            search_query: AppendVec::merge(&current.search_query, update.search_query),
            web_research_result: update.replace_web_research_result.unwrap_or_else(|| {
                AppendVec::merge(&current.web_research_result, update.web_research_result)
            }),
            sources_gathered: union_sources(&current.sources_gathered, update.sources_gathered),
            initial_search_query_count: update
                .initial_search_query_count
                .unwrap_or(current.initial_search_query_count),
            max_research_loops: update.max_research_loops.unwrap_or(current.max_research_loops),
            research_loop_count: update
                .research_loop_count
                .unwrap_or(current.research_loop_count),
            reasoning_model: update
                .reasoning_model
                .map(|m| Override::merge(&current.reasoning_model, m))
                .unwrap_or_else(|| current.reasoning_model.clone()),
            planning_steps: update
                .planning_steps
                .unwrap_or_else(|| current.planning_steps.clone()),
            planning_status: update.planning_status.unwrap_or(current.planning_status),
            planning_feedback: AppendVec::merge(
                &current.planning_feedback,
                update.planning_feedback,
            ),
            is_sufficient: update.is_sufficient.unwrap_or(current.is_sufficient),
            knowledge_gap: update
                .knowledge_gap
                .unwrap_or_else(|| current.knowledge_gap.clone()),
        }
    }
}
