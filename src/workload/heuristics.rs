//! Keyword tables driving workload classification.
//!
//! Classification is a heuristic, not a guarantee. The tables are plain data
//! so embedders can tune or replace them without touching routing logic.

use serde::{Deserialize, Serialize};

/// Keyword and length thresholds used by the analyzer.
///
/// All keyword matching is a case-insensitive substring scan over the
/// lower-cased prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordHeuristics {
    /// Keywords that classify a prompt as complex
    pub complexity_keywords: Vec<String>,
    /// Keywords that signal a streaming response
    pub streaming_keywords: Vec<String>,
    /// Keywords that signal image/diagram work
    pub vision_keywords: Vec<String>,
    /// Keywords that signal tool/function invocation
    pub function_calling_keywords: Vec<String>,
    /// Keywords that raise priority to high
    pub high_priority_keywords: Vec<String>,
    /// Keywords that lower priority
    pub low_priority_keywords: Vec<String>,
    /// Prompts at or above this many characters classify as complex
    pub complex_prompt_chars: usize,
    /// Prompts at or below this many characters classify as simple
    /// (absent any complexity signal)
    pub simple_prompt_chars: usize,
}

impl Default for KeywordHeuristics {
    fn default() -> Self {
        fn owned(words: &[&str]) -> Vec<String> {
            words.iter().map(|w| w.to_string()).collect()
        }

        Self {
            complexity_keywords: owned(&[
                "architecture",
                "optimize",
                "refactor",
                "proof",
                "algorithm",
                "distributed",
                "concurrency",
                "trade-off",
            ]),
            streaming_keywords: owned(&["stream", "streaming", "real-time", "live output"]),
            vision_keywords: owned(&["image", "diagram", "screenshot", "photo", "chart"]),
            function_calling_keywords: owned(&[
                "call the api",
                "invoke function",
                "function call",
                "use the tool",
                "tool call",
            ]),
            high_priority_keywords: owned(&["urgent", "asap", "immediately", "critical"]),
            low_priority_keywords: owned(&["whenever", "no rush", "low priority"]),
            complex_prompt_chars: 1200,
            simple_prompt_chars: 160,
        }
    }
}

impl KeywordHeuristics {
    /// Whether any keyword from the table occurs in the lower-cased prompt.
    pub(crate) fn matches(haystack: &str, keywords: &[String]) -> bool {
        keywords.iter().any(|k| haystack.contains(k.as_str()))
    }
}
