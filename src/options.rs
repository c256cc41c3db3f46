//! Parsing of the interactive input line.
//!
//! A line holds a URL optionally followed by option tokens. Tokens are
//! separated by single spaces; `\ ` keeps a literal space inside a token and
//! `\\` stands for a literal backslash:
//!
//! - `aaa bbb` ⇒ `["aaa", "bbb"]`
//! - `aaa\ bbb` ⇒ `["aaa bbb"]`
//! - `aaa\\ bbb` ⇒ `["aaa\", "bbb"]`

/// Split an input line into the URL and the raw options string
pub fn split_input(line: &str) -> (&str, Option<&str>) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((url, rest)) => {
            let rest = rest.trim_start();
            (url, (!rest.is_empty()).then_some(rest))
        }
        None => (line, None),
    }
}

/// Parse an options string into tokens
pub fn parse_options(options: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut chars = options.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(' ' | '\\') => current.extend(chars.next()),
                _ => current.push('\\'),
            },
            ' ' => {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}
