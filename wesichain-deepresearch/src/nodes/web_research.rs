use crate::collaborators::{GroundingChunk, Llm, RateLimiter, SearchCapability};
use crate::error::{LlmError, ResearchError};
use crate::state::PlanStepStatus;

/// One fan-out dispatch descriptor from `fanout_router` (spec §4.6):
/// `{node: web_research, payload: {query, segment_id}}`.
#[derive(Clone, Debug, PartialEq)]
pub struct WebResearchDispatch {
    pub query: String,
    pub segment_id: u64,
    pub plan_step_id: Option<u64>,
}

/// What a single `web_research` branch produces before the driver's
/// aggregator resolves `short_url`s and rewrites citations (spec §4.7 steps
/// 3-4 are deliberately kept out of this function: they touch the run-scoped
/// `short_url` counter, which spec §5 reserves for the single-threaded
/// aggregator, not for concurrently-running branches).
#[derive(Clone, Debug, PartialEq)]
pub struct RawBranchResult {
    pub segment_id: u64,
    pub plan_step_id: Option<u64>,
    pub query: String,
    pub text: String,
    pub grounding: Vec<GroundingChunk>,
    pub failed: bool,
}

/// `web_research` (spec §4.7): the hot path. Runs once per dispatched query,
/// concurrently with its siblings. Acquires a rate-limiter token, calls the
/// `LLM` (directly if it grounds natively, otherwise via explicit search +
/// summarization), and degrades to an empty result on exhausted transient
/// retries rather than aborting the whole run.
pub async fn web_research(
    dispatch: WebResearchDispatch,
    llm: &dyn Llm,
    capability: &SearchCapability,
    rate_limiter: &RateLimiter,
) -> Result<RawBranchResult, ResearchError> {
    rate_limiter.acquire().await;

    let outcome = match capability {
        SearchCapability::Grounded => {
            let prompt = format!("Research and ground your answer: {}", dispatch.query);
            llm.generate_with_search(&prompt).await
        }
        SearchCapability::Keyword(provider) => {
            let hits = provider.search(&dispatch.query).await;
            match hits {
                Ok(hits) => {
                    let listing = hits
                        .iter()
                        .enumerate()
                        .map(|(i, h)| format!("{}. {} — {}\n{}", i + 1, h.title, h.url, h.snippet))
                        .collect::<Vec<_>>()
                        .join("\n");
                    let prompt = format!(
                        "Summarize these search results for the query \"{}\":\n{}",
                        dispatch.query, listing
                    );
                    match llm.generate_text(&prompt).await {
                        Ok(text) => {
                            let grounding = hits
                                .into_iter()
                                .map(|h| GroundingChunk {
                                    segment_start: 0,
                                    segment_end: text.len(),
                                    url: h.url,
                                    label: h.title,
                                })
                                .collect();
                            Ok(crate::collaborators::GroundedResponse {
                                text,
                                grounding_metadata: grounding,
                            })
                        }
                        Err(error) => Err(error),
                    }
                }
                Err(search_error) => {
                    if search_error.is_transient() {
                        return Ok(RawBranchResult {
                            segment_id: dispatch.segment_id,
                            plan_step_id: dispatch.plan_step_id,
                            query: dispatch.query,
                            text: String::new(),
                            grounding: Vec::new(),
                            failed: true,
                        });
                    }
                    return Err(ResearchError::Search(search_error.to_string()));
                }
            }
        }
    };

    match outcome {
        Ok(response) => Ok(RawBranchResult {
            segment_id: dispatch.segment_id,
            plan_step_id: dispatch.plan_step_id,
            query: dispatch.query,
            text: response.text,
            grounding: response.grounding_metadata,
            failed: false,
        }),
        Err(LlmError::Transient(_)) => Ok(RawBranchResult {
            segment_id: dispatch.segment_id,
            plan_step_id: dispatch.plan_step_id,
            query: dispatch.query,
            text: String::new(),
            grounding: Vec::new(),
            failed: true,
        }),
        Err(LlmError::Permanent(reason)) => Err(ResearchError::Search(reason)),
    }
}

pub fn plan_step_status_for(failed: bool) -> PlanStepStatus {
    if failed {
        PlanStepStatus::Skipped
    } else {
        PlanStepStatus::Done
    }
}
