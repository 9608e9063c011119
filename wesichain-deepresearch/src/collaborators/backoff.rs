use std::time::Duration;

use rand::Rng;

/// Exponential backoff with full jitter, capped at `max_delay`. `attempt` is
/// 1-based (the delay waited *before* retry number `attempt`).
///
/// Grounded in [`wesichain_core::Retrying`], which retries immediately with no
/// delay; the core engine's collaborator layer needs backoff so it doesn't
/// hammer a struggling provider, so this adds the delay computation the
/// teacher's `Retrying` doesn't have.
pub fn backoff_with_jitter(attempt: u32, base: Duration, max_delay: Duration) -> Duration {
    let exp = base.as_millis().saturating_mul(1u128 << attempt.min(16));
    let capped = exp.min(max_delay.as_millis());
    let jittered = rand::thread_rng().gen_range(0..=capped.max(1));
    Duration::from_millis(jittered as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_never_exceeds_cap() {
        let max = Duration::from_millis(500);
        for attempt in 0..10 {
            let delay = backoff_with_jitter(attempt, Duration::from_millis(50), max);
            assert!(delay <= max);
        }
    }
}
