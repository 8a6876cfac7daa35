//! Reasoning models wrap their chain of thought in `<think>...</think>` before the answer.

use regex::Regex;
use std::sync::OnceLock;

/// A completion split into the optional reasoning block and the final answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelReply {
    pub thinking: Option<String>,
    pub answer: String,
}

fn think_block() -> &'static Regex {
    static THINK: OnceLock<Regex> = OnceLock::new();
    THINK.get_or_init(|| {
        Regex::new(r"(?s)<think>(.*?)</think>(.*)$").expect("think pattern is valid")
    })
}

impl ModelReply {
    pub fn parse(content: &str) -> Self {
        if !content.contains("<think>") {
            return Self {
                thinking: None,
                answer: content.to_string(),
            };
        }

        match think_block().captures(content) {
            Some(caps) => Self {
                thinking: caps.get(1).map(|m| m.as_str().trim().to_string()),
                answer: caps
                    .get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default(),
            },
            // opened but never closed: still thinking when the reply was cut off
            None => Self {
                thinking: content
                    .split_once("<think>")
                    .map(|(_, rest)| rest.trim().to_string()),
                answer: String::new(),
            },
        }
    }
}
