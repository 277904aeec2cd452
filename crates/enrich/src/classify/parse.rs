//! Best-effort JSON recovery from model replies.
//!
//! Attempts, in order:
//! 1. the body of each fenced code block (```` ```json ```` or bare ```` ``` ````)
//! 2. the widest `{...}` span in the reply
//! 3. the whole reply after cleanup: surrounding quotes stripped,
//!    typographic and single quotes turned into `"`, and Python literals
//!    (`True`, `False`, `None`) turned into JSON ones
//!
//! The first attempt that parses wins. Total failure yields an empty object.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static CODE_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("code block regex is valid"));

static OBJECT_SPAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("object span regex is valid"));

static PY_TRUE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bTrue\b").expect("True regex is valid"));
static PY_FALSE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bFalse\b").expect("False regex is valid"));
static PY_NONE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bNone\b").expect("None regex is valid"));

fn clean(text: &str) -> String {
    let text = text.trim().trim_matches(|c: char| c == '"' || c == '\'');
    let text = text
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace('\'', "\"");
    let text = PY_TRUE_REGEX.replace_all(&text, "true");
    let text = PY_FALSE_REGEX.replace_all(&text, "false");
    PY_NONE_REGEX.replace_all(&text, "null").into_owned()
}

/// Recover a JSON value from a model reply.
pub fn parse_json(reply: &str) -> Value {
    for captures in CODE_BLOCK_REGEX.captures_iter(reply) {
        if let Some(body) = captures.get(1)
            && let Ok(value) = serde_json::from_str(body.as_str())
        {
            return value;
        }
    }

    if let Some(span) = OBJECT_SPAN_REGEX.find(reply)
        && let Ok(value) = serde_json::from_str(span.as_str())
    {
        return value;
    }

    let cleaned = clean(reply);
    if cleaned.contains('{')
        && cleaned.contains('}')
        && let Ok(value) = serde_json::from_str(&cleaned)
    {
        return value;
    }

    Value::Object(Map::new())
}
