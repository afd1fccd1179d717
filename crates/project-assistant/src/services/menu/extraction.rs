//! Heuristics that turn generated prose into a project name and a task list.
//!
//! Nothing here fails: every function degrades to `None` or a fallback value.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::text::{normalize_whitespace, truncate_chars};

const MAX_DERIVED_NAME_CHARS: usize = 80;

static NAME_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:project\s+name|name\s+of\s+the\s+project|name|project|title)\s*[:\-]\s*(.+?)\s*$",
    )
    .expect("valid regex")
});

static BULLET_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d+\.|[\-*+]\s)").expect("valid regex"));

static TASK_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s+(\S.*)$").expect("valid regex"));

static IDEA_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:project|application|app|system|store|website|platform)\b")
        .expect("valid regex")
});

static COMMAND_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:create|build|make|generate|design|i\s+want|i\s+need)(?:\s+me)?\b\s*")
        .expect("valid regex")
});

static FILLER_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:a|an|the|of|for|about|to)\s+").expect("valid regex"));

static GENERIC_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:create|build|make|generate|design|project|application|app|system|store|website|platform)$",
    )
    .expect("valid regex")
});

const BOILERPLATE: &[&str] = &["error", "generated by", "project defined"];

/// Drop markdown emphasis and heading marks around a line.
fn strip_markup(line: &str) -> String {
    line.replace("**", "")
        .replace('*', "")
        .trim()
        .trim_start_matches('#')
        .trim()
        .to_string()
}

fn clean_name(raw: &str) -> String {
    let quotes: &[char] = &['"', '\'', '\u{201c}', '\u{201d}', '`'];
    raw.trim()
        .trim_end_matches('.')
        .trim_matches(quotes)
        .trim()
        .trim_end_matches('.')
        .trim()
        .to_string()
}

/// Project name stated in a generated response.
///
/// Labelled lines (`Project: X`, `Title - X`, ...) win; otherwise the last
/// non-empty line is used when it reads like a title.
pub fn extract_project_name(response: &str) -> Option<String> {
    for line in response.lines() {
        let line = strip_markup(line);
        if let Some(caps) = NAME_LINE.captures(&line) {
            let name = clean_name(&caps[1]);
            if !name.is_empty() {
                return Some(name);
            }
        }
    }

    // bullets are recognised before emphasis marks are stripped
    let raw_last = response.lines().rev().find(|line| !line.trim().is_empty())?.trim();
    if BULLET_LINE.is_match(raw_last) {
        return None;
    }

    let last = strip_markup(raw_last);

    let lower = last.to_lowercase();
    if BOILERPLATE.iter().any(|phrase| lower.contains(phrase)) {
        return None;
    }

    let name = clean_name(&last);
    (!name.is_empty()).then_some(name)
}

fn strip_fillers(mut text: &str) -> &str {
    text = text.trim();
    while let Some(found) = FILLER_WORD.find(text) {
        text = text[found.end()..].trim_start();
    }
    text
}

fn first_phrase(text: &str) -> &str {
    text.split(|c| matches!(c, '.' | ',' | ';' | '\n'))
        .next()
        .unwrap_or("")
        .trim()
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn finish_name(candidate: &str) -> Option<String> {
    let candidate = first_phrase(candidate);
    if candidate.is_empty() || GENERIC_NAME.is_match(candidate) {
        return None;
    }

    let name = title_case(candidate);
    let name = truncate_chars(&name, MAX_DERIVED_NAME_CHARS).trim().to_string();
    (!name.is_empty()).then_some(name)
}

/// Project name derived from the user's own idea.
///
/// Takes what follows the earliest project keyword ("app", "store", ...). When
/// nothing usable follows it, leading command verbs are stripped from the whole
/// idea instead.
pub fn derive_name_from_idea(idea: &str) -> Option<String> {
    let idea = idea.trim();

    let after_keyword = IDEA_KEYWORD
        .find(idea)
        .and_then(|found| finish_name(strip_fillers(&idea[found.end()..])));

    after_keyword.or_else(|| {
        let without_command = match COMMAND_VERB.find(idea) {
            Some(found) => &idea[found.end()..],
            None => idea,
        };
        finish_name(strip_fillers(without_command))
    })
}

fn is_name_line(line: &str) -> bool {
    NAME_LINE.is_match(&strip_markup(line))
}

/// Numbered task blocks of a generated response.
///
/// A block opens on a line like `3. Do something` or `3) Do something`, keeps
/// following non-blank lines as continuation, and closes on a blank line, the
/// next numbered item or a labelled name line. Without any numbered block the
/// whole response becomes a single task.
pub fn extract_tasks(response: &str) -> Vec<String> {
    let mut tasks = Vec::new();
    let mut current: Option<String> = None;

    for raw in response.lines() {
        let line = raw.trim();

        if let Some(caps) = TASK_START.captures(line) {
            tasks.extend(current.take());
            current = Some(caps[1].to_string());
        } else if line.is_empty() || is_name_line(line) {
            tasks.extend(current.take());
        } else if let Some(block) = current.as_mut() {
            block.push(' ');
            block.push_str(line);
        }
    }
    tasks.extend(current);

    let tasks: Vec<String> = tasks
        .iter()
        .map(|task| normalize_whitespace(&task.replace("**", "")))
        .filter(|task| !task.is_empty())
        .collect();

    if tasks.is_empty() {
        let whole = normalize_whitespace(response);
        return if whole.is_empty() { Vec::new() } else { vec![whole] };
    }
    tasks
}
