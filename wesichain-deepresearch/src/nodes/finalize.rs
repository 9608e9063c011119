use crate::collaborators::Llm;
use crate::error::ResearchError;
use crate::nodes::NodeOutcome;
use crate::state::{ConversationMessage, OverallState, OverallStateDelta, SourceRecord};

fn short_url_pattern(short_url: &str) -> bool {
    short_url.starts_with("[s") && short_url.ends_with(']')
}

/// Rewrites every `short_url` reference in `text` into `(label)(original_url)`
/// and returns the subset of `sources` actually referenced (spec §4.11:
/// "unreferenced sources are dropped from the final bibliography").
fn resolve_citations(text: &str, sources: &[SourceRecord]) -> (String, Vec<SourceRecord>) {
    let mut rewritten = text.to_string();
    let mut referenced = Vec::new();
    for source in sources {
        if !short_url_pattern(&source.short_url) {
            continue;
        }
        if rewritten.contains(&source.short_url) {
            let link = format!("({})({})", source.label, source.original_url);
            rewritten = rewritten.replace(&source.short_url, &link);
            referenced.push(source.clone());
        }
    }
    (rewritten, referenced)
}

/// `finalize_answer` (spec §4.11): synthesizes the final assistant message
/// from the validated evidence and the accumulated sources.
pub async fn finalize_answer(
    state: &OverallState,
    llm: &dyn Llm,
    message_id: impl Into<String>,
) -> NodeOutcome {
    let evidence = state
        .ordered_web_research_result()
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n---\n");

    let question = state
        .latest_user_message()
        .map(|m| m.content.clone())
        .unwrap_or_default();

    let prompt = format!(
        "Question: {question}\n\nEvidence (citations use [sN] markers):\n{evidence}\n\n\
         Write the final answer, keeping [sN] markers inline where you use that evidence."
    );

    let draft = match llm.generate_text(&prompt).await {
        Ok(text) => text,
        Err(error) => return NodeOutcome::Fail(ResearchError::Finalize(error.to_string())),
    };

    let (answer, _referenced) = resolve_citations(&draft, &state.sources_gathered);

    NodeOutcome::delta(OverallStateDelta {
        messages: vec![ConversationMessage::assistant(message_id.into(), answer)],
        ..Default::default()
    })
}
