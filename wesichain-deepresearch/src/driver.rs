use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use wesichain_graph::{Checkpoint, Checkpointer, GraphState, InMemoryCheckpointer, Observer};

use crate::citation::{insert_citations, ShortUrlAssigner};
use crate::collaborators::{Llm, RateLimiter, RetryingLlm, RetryingSearchProvider, SearchCapability};
use crate::config::ResearchConfig;
use crate::error::ResearchError;
use crate::nodes::{
    finalize_answer, generate_query, planning_mode, planning_wait, reflection, web_research,
    InterruptReason, NodeOutcome, WebResearchDispatch,
};
use crate::routers::{evaluate_research, fanout_router, planning_router, PlanningRoute, ResearchRoute};
use crate::state::{ConversationMessage, OverallState, OverallStateDelta, PlanStepStatus};

/// One event on the stream surface (spec §6.3).
#[derive(Clone, Debug)]
pub enum StreamEvent {
    NodeUpdate {
        node: String,
        state_delta: OverallStateDelta,
    },
    Interrupt {
        reason: String,
        planning_steps: Vec<crate::state::PlanStep>,
        planning_feedback: Vec<String>,
    },
    Error {
        kind: String,
        message: String,
    },
    Done {
        message_id: String,
    },
}

/// The outcome `invoke`/`resume` fold a stream down to.
#[derive(Clone, Debug)]
pub enum RunOutcome {
    Completed(OverallState),
    Interrupted {
        state: OverallState,
        reason: String,
    },
}

pub struct ResearchEngineBuilder {
    llm: Option<Arc<dyn Llm>>,
    search_capability: SearchCapability,
    checkpointer: Option<Arc<dyn Checkpointer<OverallState>>>,
    observer: Option<Arc<dyn Observer>>,
    config: ResearchConfig,
}

impl Default for ResearchEngineBuilder {
    fn default() -> Self {
        Self {
            llm: None,
            search_capability: SearchCapability::Grounded,
            checkpointer: None,
            observer: None,
            config: ResearchConfig::default(),
        }
    }
}

impl ResearchEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_llm(mut self, llm: Arc<dyn Llm>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_search_capability(mut self, capability: SearchCapability) -> Self {
        self.search_capability = capability;
        self
    }

    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer<OverallState>>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_config(mut self, config: ResearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ResearchEngine {
        let rate_limiter = RateLimiter::new(self.config.requests_per_second, self.config.max_parallel as f64);
        let raw_llm = self.llm.expect("ResearchEngineBuilder requires with_llm");
        let llm: Arc<dyn Llm> = Arc::new(RetryingLlm::new(
            raw_llm,
            self.config.attempt_limit,
            self.config.call_timeout,
        ));
        let search_capability = match self.search_capability {
            SearchCapability::Grounded => SearchCapability::Grounded,
            SearchCapability::Keyword(provider) => {
                let retrying: Arc<dyn crate::collaborators::SearchProvider> = Arc::new(
                    RetryingSearchProvider::new(provider, self.config.attempt_limit, self.config.call_timeout),
                );
                SearchCapability::Keyword(retrying)
            }
        };
        ResearchEngine {
            llm,
            search_capability,
            rate_limiter,
            checkpointer: self
                .checkpointer
                .unwrap_or_else(|| Arc::new(InMemoryCheckpointer::default())),
            observer: self.observer,
            config: self.config,
            cancel_flags: Mutex::new(HashMap::new()),
        }
    }
}

/// The durable, interruptible state machine described by spec §2. Owns the
/// collaborator clients and checkpointer; `invoke`/`stream`/`resume`/`cancel`
/// are the only public surface (spec §6.1).
pub struct ResearchEngine {
    llm: Arc<dyn Llm>,
    search_capability: SearchCapability,
    rate_limiter: Arc<RateLimiter>,
    checkpointer: Arc<dyn Checkpointer<OverallState>>,
    observer: Option<Arc<dyn Observer>>,
    config: ResearchConfig,
    cancel_flags: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl ResearchEngine {
    pub fn builder() -> ResearchEngineBuilder {
        ResearchEngineBuilder::new()
    }

    fn cancel_flag(&self, thread_id: &str) -> Arc<AtomicBool> {
        let mut flags = self.cancel_flags.lock().expect("cancel_flags poisoned");
        flags
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(AtomicBool::new(false)))
            .clone()
    }

    /// Marks `thread_id` cancelled. Cancellation is cooperative: in-flight
    /// branches observe it at their next suspension point (spec §5).
    pub async fn cancel(&self, thread_id: &str) {
        self.cancel_flag(thread_id).store(true, Ordering::SeqCst);
    }

    pub async fn get_state(&self, thread_id: &str) -> Result<Option<OverallState>, ResearchError> {
        self.checkpointer
            .load(thread_id)
            .await
            .map(|maybe| maybe.map(|cp| cp.state.data))
            .map_err(|e| ResearchError::Search(e.to_string()))
    }

    async fn save_checkpoint(
        &self,
        thread_id: &str,
        state: &OverallState,
        step: u64,
        node: &str,
        pending_dispatches: Vec<(String, u64)>,
    ) {
        let checkpoint = Checkpoint::new(
            thread_id.to_string(),
            GraphState::new(state.clone()),
            step,
            node.to_string(),
            pending_dispatches,
        );
        if self.checkpointer.save(&checkpoint).await.is_ok() {
            if let Some(observer) = &self.observer {
                observer.on_checkpoint_saved(node).await;
            }
        }
    }

    async fn observe_start(&self, node: &str, state: &OverallState) {
        if let Some(observer) = &self.observer {
            observer
                .on_node_start(node, &serde_json::to_value(state).unwrap_or_default())
                .await;
        }
    }

    async fn observe_end(&self, node: &str, state: &OverallState, duration_ms: u128) {
        if let Some(observer) = &self.observer {
            observer
                .on_node_end(node, &serde_json::to_value(state).unwrap_or_default(), duration_ms)
                .await;
        }
    }

    /// Enforces the per-node deadline of spec §5/§6.1 (`node_timeout_ms`,
    /// default 120s). On expiry the node's work is dropped at its next
    /// suspension point and the run fails with `ResearchError::Timeout`.
    async fn with_node_deadline<F: std::future::Future>(
        &self,
        node: &str,
        fut: F,
    ) -> Result<F::Output, StreamEvent> {
        match tokio::time::timeout(self.config.node_timeout, fut).await {
            Ok(value) => Ok(value),
            Err(_) => Err(StreamEvent::Error {
                kind: "timeout".to_string(),
                message: format!(
                    "node '{node}' timed out after {:?}",
                    self.config.node_timeout
                ),
            }),
        }
    }

    /// `invoke` (spec §6.1): runs to completion or interrupt, discarding the
    /// intermediate event stream.
    pub async fn invoke(
        &self,
        thread_id: &str,
        initial: OverallState,
    ) -> Result<RunOutcome, ResearchError> {
        let mut stream = self.stream(thread_id, initial.clone());
        let mut state = initial;
        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::NodeUpdate { state_delta, .. } => {
                    state = OverallState::apply(&state, state_delta);
                }
                StreamEvent::Interrupt { reason, .. } => {
                    return Ok(RunOutcome::Interrupted { state, reason });
                }
                StreamEvent::Error { kind, message } => {
                    return Err(map_error(&kind, message));
                }
                StreamEvent::Done { .. } => {
                    return Ok(RunOutcome::Completed(state));
                }
            }
        }
        Ok(RunOutcome::Completed(state))
    }

    /// `stream` (spec §6.1): runs a fresh thread starting at `generate_query`.
    pub fn stream(&self, thread_id: &str, initial: OverallState) -> BoxStream<'_, StreamEvent> {
        let thread_id = thread_id.to_string();
        async_stream::stream! {
            let cancel_flag = self.cancel_flag(&thread_id);
            let mut state = initial;
            let mut step = 0u64;

            self.observe_start("generate_query", &state).await;
            let outcome = match self
                .with_node_deadline("generate_query", generate_query(&state, self.llm.as_ref()))
                .await
            {
                Ok(outcome) => outcome,
                Err(event) => { yield event; return; }
            };
            match self.apply_outcome(&thread_id, &mut state, &mut step, "generate_query", outcome).await {
                Ok(Some(event)) => yield event,
                Ok(None) => {}
                Err(event) => { yield event; return; }
            }
            self.observe_end("generate_query", &state, 0).await;

            let mut stream = self.run_from(thread_id, state, step, cancel_flag);
            while let Some(event) = stream.next().await {
                yield event;
            }
        }
        .boxed()
    }

    /// `resume` (spec §6.1/§5): loads the last checkpoint, appends `input` to
    /// `messages`, and re-enters `planning_mode`. Idempotent against replayed
    /// resumes of the same checkpoint because the checkpointer's `seq` only
    /// advances forward and re-running `planning_mode` on an already-terminal
    /// `planning_status` is a no-op (spec §8).
    pub async fn resume(
        &self,
        thread_id: &str,
        input: ConversationMessage,
    ) -> Result<RunOutcome, ResearchError> {
        let mut stream = self.resume_stream(thread_id, input).await?;
        let mut state = self
            .get_state(thread_id)
            .await?
            .ok_or_else(|| ResearchError::Planning("no checkpoint to resume from".into()))?;
        while let Some(event) = stream.next().await {
            match event {
                StreamEvent::NodeUpdate { state_delta, .. } => {
                    state = OverallState::apply(&state, state_delta);
                }
                StreamEvent::Interrupt { reason, .. } => {
                    return Ok(RunOutcome::Interrupted { state, reason });
                }
                StreamEvent::Error { kind, message } => return Err(map_error(&kind, message)),
                StreamEvent::Done { .. } => return Ok(RunOutcome::Completed(state)),
            }
        }
        Ok(RunOutcome::Completed(state))
    }

    pub async fn resume_stream(
        &self,
        thread_id: &str,
        input: ConversationMessage,
    ) -> Result<BoxStream<'_, StreamEvent>, ResearchError> {
        let checkpoint = self
            .checkpointer
            .load(thread_id)
            .await
            .map_err(|e| ResearchError::Planning(e.to_string()))?
            .ok_or_else(|| ResearchError::Planning("no checkpoint to resume from".into()))?;

        let mut state = checkpoint.state.data;
        state.messages.push(input);
        let step = checkpoint.step + 1;
        let cancel_flag = self.cancel_flag(thread_id);

        Ok(self.run_from(thread_id.to_string(), state, step, cancel_flag).boxed())
    }

    async fn apply_outcome(
        &self,
        thread_id: &str,
        state: &mut OverallState,
        step: &mut u64,
        node: &str,
        outcome: NodeOutcome,
    ) -> Result<Option<StreamEvent>, StreamEvent> {
        match outcome {
            NodeOutcome::Delta(delta) => {
                *step += 1;
                *state = OverallState::apply(state, delta.clone());
                self.save_checkpoint(thread_id, state, *step, node, vec![])
                    .await;
                Ok(Some(StreamEvent::NodeUpdate {
                    node: node.to_string(),
                    state_delta: delta,
                }))
            }
            NodeOutcome::Suspend { reason, delta } => {
                *step += 1;
                *state = OverallState::apply(state, delta);
                self.save_checkpoint(thread_id, state, *step, node, vec![])
                    .await;
                let reason_str = interrupt_reason_str(&reason);
                Err(StreamEvent::Interrupt {
                    reason: reason_str.to_string(),
                    planning_steps: state.planning_steps.clone(),
                    planning_feedback: state.planning_feedback.clone(),
                })
            }
            NodeOutcome::Fail(error) => Err(StreamEvent::Error {
                kind: error.kind().to_string(),
                message: error.to_string(),
            }),
        }
    }

    /// The shared continuation used by both a fresh run (after
    /// `generate_query`) and a resumed run (straight into `planning_mode`).
    fn run_from(
        &self,
        thread_id: String,
        initial_state: OverallState,
        initial_step: u64,
        cancel_flag: Arc<AtomicBool>,
    ) -> impl futures::Stream<Item = StreamEvent> + '_ {
        async_stream::stream! {
            let mut state = initial_state;
            let mut step = initial_step;

            loop {
                if cancel_flag.load(Ordering::SeqCst) {
                    self.save_checkpoint(&thread_id, &state, step, "cancelled", vec![]).await;
                    yield StreamEvent::Error {
                        kind: "cancelled".to_string(),
                        message: "run cancelled".to_string(),
                    };
                    return;
                }

                self.observe_start("planning_mode", &state).await;
                let outcome = planning_mode(&state);
                match self.apply_outcome(&thread_id, &mut state, &mut step, "planning_mode", outcome).await {
                    Ok(Some(event)) => yield event,
                    Ok(None) => {}
                    Err(event) => { yield event; return; }
                }
                self.observe_end("planning_mode", &state, 0).await;

                match planning_router(&state) {
                    PlanningRoute::Wait => {
                        self.observe_start("planning_wait", &state).await;
                        let outcome = planning_wait(&state);
                        match self.apply_outcome(&thread_id, &mut state, &mut step, "planning_wait", outcome).await {
                            Ok(_) => {}
                            Err(event) => { yield event; return; }
                        }
                        // apply_outcome only returns Err for Suspend/Fail; planning_wait
                        // always suspends, so we never reach past this point here.
                        return;
                    }
                    PlanningRoute::SkipToFinalize => break,
                    PlanningRoute::Research => {}
                }

                // Spans every fan-out wave in this research loop so `short_url`s
                // stay monotonic across reflection iterations instead of
                // restarting at `[s1]` each wave (spec §5).
                let mut assigner = ShortUrlAssigner::new();

                'research: loop {
                    if cancel_flag.load(Ordering::SeqCst) {
                        self.save_checkpoint(&thread_id, &state, step, "cancelled", vec![]).await;
                        yield StreamEvent::Error {
                            kind: "cancelled".to_string(),
                            message: "run cancelled".to_string(),
                        };
                        return;
                    }

                    let dispatches = fanout_router(&state);
                    if !dispatches.is_empty() {
                        self.observe_start("web_research", &state).await;
                        let wave = self
                            .with_node_deadline(
                                "web_research",
                                self.run_web_research_wave(
                                    &thread_id,
                                    &mut state,
                                    &mut step,
                                    dispatches,
                                    &cancel_flag,
                                    &mut assigner,
                                ),
                            )
                            .await;
                        match wave {
                            Ok(Ok(events)) => {
                                for event in events {
                                    yield event;
                                }
                            }
                            Ok(Err(event)) => { yield event; return; }
                            Err(event) => { yield event; return; }
                        }
                        self.observe_end("web_research", &state, 0).await;

                        self.observe_start("validate_web_results", &state).await;
                        let outcome = crate::nodes::validate_web_results_node(&state);
                        match self.apply_outcome(&thread_id, &mut state, &mut step, "validate_web_results", outcome).await {
                            Ok(Some(event)) => yield event,
                            Ok(None) => {}
                            Err(event) => { yield event; return; }
                        }
                        self.observe_end("validate_web_results", &state, 0).await;
                    }

                    self.observe_start("reflection", &state).await;
                    let outcome = match self
                        .with_node_deadline("reflection", reflection(&state, self.llm.as_ref()))
                        .await
                    {
                        Ok(outcome) => outcome,
                        Err(event) => { yield event; return; }
                    };
                    match self.apply_outcome(&thread_id, &mut state, &mut step, "reflection", outcome).await {
                        Ok(Some(event)) => yield event,
                        Ok(None) => {}
                        Err(event) => { yield event; return; }
                    }
                    self.observe_end("reflection", &state, 0).await;

                    match evaluate_research(&state) {
                        ResearchRoute::Finalize => break 'research,
                        ResearchRoute::ContinueFanout => continue 'research,
                    }
                }
                break;
            }

            self.observe_start("finalize_answer", &state).await;
            let message_id = format!("{thread_id}-answer-{step}");
            let outcome = match self
                .with_node_deadline(
                    "finalize_answer",
                    finalize_answer(&state, self.llm.as_ref(), message_id.clone()),
                )
                .await
            {
                Ok(outcome) => outcome,
                Err(event) => { yield event; return; }
            };
            match self.apply_outcome(&thread_id, &mut state, &mut step, "finalize_answer", outcome).await {
                Ok(Some(event)) => yield event,
                Ok(None) => {}
                Err(event) => { yield event; return; }
            }
            self.observe_end("finalize_answer", &state, 0).await;

            yield StreamEvent::Done { message_id };
        }
    }

    /// Runs one fan-out wave: up to `max_parallel` `web_research` branches
    /// concurrently (spec §4.7 back-pressure), joins them, then resolves
    /// citations in `segment_id` order on this single task so the `short_url`
    /// counter is never touched concurrently (spec §5).
    async fn run_web_research_wave(
        &self,
        thread_id: &str,
        state: &mut OverallState,
        step: &mut u64,
        dispatches: Vec<WebResearchDispatch>,
        cancel_flag: &Arc<AtomicBool>,
        assigner: &mut ShortUrlAssigner,
    ) -> Result<Vec<StreamEvent>, StreamEvent> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel));
        let mut join_set = JoinSet::new();

        for dispatch in dispatches {
            let llm = self.llm.clone();
            let capability = self.search_capability.clone();
            let rate_limiter = self.rate_limiter.clone();
            let permit_source = semaphore.clone();
            join_set.spawn(async move {
                let _permit = permit_source.acquire_owned().await.expect("semaphore closed");
                web_research(dispatch, llm.as_ref(), &capability, rate_limiter.as_ref()).await
            });
        }

        let mut raw_results = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(raw)) => raw_results.push(raw),
                Ok(Err(research_error)) => {
                    join_set.shutdown().await;
                    return Err(StreamEvent::Error {
                        kind: research_error.kind().to_string(),
                        message: research_error.to_string(),
                    });
                }
                Err(join_error) => {
                    join_set.shutdown().await;
                    return Err(StreamEvent::Error {
                        kind: "search".to_string(),
                        message: join_error.to_string(),
                    });
                }
            }
            if cancel_flag.load(Ordering::SeqCst) {
                join_set.shutdown().await;
                return Err(StreamEvent::Error {
                    kind: "cancelled".to_string(),
                    message: "run cancelled".to_string(),
                });
            }
        }

        raw_results.sort_by_key(|r| r.segment_id);

        let mut rendered = Vec::new();
        let mut sources = Vec::new();
        let mut feedback = Vec::new();
        let mut plan_updates = Vec::new();

        for raw in raw_results {
            if raw.failed {
                feedback.push(format!("web research failed for query: {}", raw.query));
                rendered.push(crate::state::WebResearchResult {
                    segment_id: raw.segment_id,
                    text: String::new(),
                });
                if let Some(plan_step_id) = raw.plan_step_id {
                    plan_updates.push((plan_step_id, PlanStepStatus::Skipped, String::new()));
                }
                continue;
            }

            let (text, new_sources) =
                insert_citations(&raw.text, &raw.grounding, &mut *assigner, raw.segment_id);
            sources.extend(new_sources);
            if let Some(plan_step_id) = raw.plan_step_id {
                plan_updates.push((plan_step_id, PlanStepStatus::Done, text.clone()));
            }
            rendered.push(crate::state::WebResearchResult {
                segment_id: raw.segment_id,
                text,
            });
        }

        let planning_steps = if plan_updates.is_empty() {
            None
        } else {
            let mut steps = state.planning_steps.clone();
            for step_entry in &mut steps {
                if let Some((_, status, result)) =
                    plan_updates.iter().find(|(id, _, _)| *id == step_entry.id)
                {
                    step_entry.status = *status;
                    step_entry.result = Some(result.clone());
                }
            }
            Some(steps)
        };

        let delta = OverallStateDelta {
            web_research_result: rendered,
            sources_gathered: sources,
            planning_feedback: feedback,
            planning_steps,
            ..Default::default()
        };

        *step += 1;
        *state = OverallState::apply(state, delta.clone());
        self.save_checkpoint(thread_id, state, *step, "web_research", vec![])
            .await;

        Ok(vec![StreamEvent::NodeUpdate {
            node: "web_research".to_string(),
            state_delta: delta,
        }])
    }
}

fn interrupt_reason_str(reason: &InterruptReason) -> &'static str {
    match reason {
        InterruptReason::AwaitingPlanConfirmation => "awaiting_plan_confirmation",
    }
}

fn map_error(kind: &str, message: String) -> ResearchError {
    match kind {
        "planning" => ResearchError::Planning(message),
        "reflection" => ResearchError::Reflection(message),
        "finalize" => ResearchError::Finalize(message),
        "timeout" => ResearchError::Timeout(message),
        "cancelled" => ResearchError::Cancelled,
        _ => ResearchError::Search(message),
    }
}
