use std::collections::HashMap;

use crate::collaborators::GroundingChunk;
use crate::state::SourceRecord;

/// Run-scoped, monotonic `short_url` assignment (spec §4.7 step 3). Dedupes
/// by `original_url` so the same source reuses its `short_url` across
/// branches — this is the set-union half of the `sources_gathered` reducer.
#[derive(Default)]
pub struct ShortUrlAssigner {
    next: u64,
    by_original_url: HashMap<String, String>,
}

impl ShortUrlAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing `short_url` for `original_url` if already seen in
    /// this run, otherwise mints the next one in insertion order.
    pub fn assign(&mut self, original_url: &str) -> String {
        if let Some(existing) = self.by_original_url.get(original_url) {
            return existing.clone();
        }
        self.next += 1;
        let short = format!("[s{}]", self.next);
        self.by_original_url.insert(original_url.to_string(), short.clone());
        short
    }
}

/// Rewrites `text` so every grounded span carries its `short_url` marker, and
/// returns the new source records minted for this branch.
///
/// `short_url`s are minted in a forward pass over `chunks` ordered by first
/// observation (ascending segment start, ties broken by longer span first),
/// so numbering reads in document order regardless of how markers are later
/// spliced into the text. Insertion itself is a separate right-to-left pass
/// by segment end offset (so earlier offsets in `text` stay valid as later
/// ones are rewritten), with the same tie-break (spec §4.7 steps 3-4).
pub fn insert_citations(
    text: &str,
    chunks: &[GroundingChunk],
    assigner: &mut ShortUrlAssigner,
    segment_id: u64,
) -> (String, Vec<SourceRecord>) {
    let mut by_first_observation: Vec<usize> = (0..chunks.len()).collect();
    by_first_observation.sort_by(|&a, &b| {
        chunks[a]
            .segment_start
            .cmp(&chunks[b].segment_start)
            .then_with(|| {
                (chunks[b].segment_end - chunks[b].segment_start)
                    .cmp(&(chunks[a].segment_end - chunks[a].segment_start))
            })
    });

    let mut short_urls: Vec<String> = vec![String::new(); chunks.len()];
    let mut new_sources = Vec::new();
    for idx in by_first_observation {
        let chunk = &chunks[idx];
        let short_url = assigner.assign(&chunk.url);
        if !new_sources.iter().any(|s: &SourceRecord| s.short_url == short_url) {
            new_sources.push(SourceRecord {
                short_url: short_url.clone(),
                original_url: chunk.url.clone(),
                label: chunk.label.clone(),
                segment_id,
            });
        }
        short_urls[idx] = short_url;
    }

    let mut ordered: Vec<usize> = (0..chunks.len()).collect();
    ordered.sort_by(|&a, &b| {
        chunks[b]
            .segment_end
            .cmp(&chunks[a].segment_end)
            .then_with(|| {
                (chunks[b].segment_end - chunks[b].segment_start)
                    .cmp(&(chunks[a].segment_end - chunks[a].segment_start))
            })
    });

    let mut rewritten = text.to_string();
    for idx in ordered {
        let chunk = &chunks[idx];
        let insert_at = chunk.segment_end.min(rewritten.len());
        let boundary = nearest_char_boundary(&rewritten, insert_at);
        rewritten.insert_str(boundary, &short_urls[idx]);
    }

    (rewritten, new_sources)
}

fn nearest_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
