//! Decoder for the `key=value` text the attach listener returns for the
//! `properties` and `agentProperties` commands (`java.util.Properties#store`
//! format).

use crate::process::source::Properties;

pub fn parse_properties(text: &str) -> Properties {
    let mut properties = Properties::new();
    for line in logical_lines(text) {
        let (key, value) = split_entry(&line);
        properties.insert(unescape(key), unescape(value));
    }
    properties
}

/// Joins continued lines and drops blanks and comments. Escapes are kept
/// so that the separator search can still tell `\=` from `=`.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending: Option<String> = None;

    for raw in text.lines() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let line = match pending.take() {
            Some(mut joined) => {
                joined.push_str(raw.trim_start());
                joined
            }
            None => {
                let trimmed = raw.trim_start();
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                trimmed.to_string()
            }
        };

        if ends_with_continuation(&line) {
            let mut line = line;
            line.pop();
            pending = Some(line);
        } else {
            lines.push(line);
        }
    }

    if let Some(line) = pending {
        lines.push(line);
    }
    lines
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\u{c}' => {
                key_end = index;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let rest = line[key_end..].trim_start_matches([' ', '\t', '\u{c}']);
    let rest = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest);
    (key, rest.trim_start_matches([' ', '\t', '\u{c}']))
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let digits: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    // malformed escape, keep it verbatim
                    None => {
                        out.push_str("\\u");
                        out.push_str(&digits);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
