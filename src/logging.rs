//! Per-statement timing, logged at `debug` or escalated to `warn` past a slow-query threshold.

use std::time::Duration;

const SLOW_QUERY_THRESHOLD: Duration = Duration::from_secs(1);

/// Runs `block`, then logs `query` and how long it took. Anything at or past
/// [`SLOW_QUERY_THRESHOLD`] logs at `warn` instead of `debug`.
macro_rules! log_execution {
    ( $query:expr, $block:expr ) => {{
        let query_text = $query;
        let timer = std::time::Instant::now();
        let result = $block;
        let elapsed = timer.elapsed();
        if elapsed >= crate::logging::SLOW_QUERY_THRESHOLD {
            log::warn!(
                "{} ..., elapsed: {:.3?}\n\n    {}\n",
                crate::logging::summarize(query_text),
                elapsed,
                query_text
            );
        } else {
            log::debug!(
                "{} ..., elapsed: {:.3?}\n\n    {}\n",
                crate::logging::summarize(query_text),
                elapsed,
                query_text
            );
        }
        result
    }};
}

pub(crate) use log_execution;

pub(crate) fn summarize(query: &str) -> String {
    query.split_whitespace().take(3).collect::<Vec<&str>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_takes_the_first_three_words() {
        assert_eq!(summarize("SELECT id, name FROM accounts WHERE id = $1"), "SELECT id, name");
    }

    #[test]
    fn summarize_handles_short_queries() {
        assert_eq!(summarize("VACUUM"), "VACUUM");
    }
}
