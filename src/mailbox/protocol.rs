//! IMAP4rev1 command formatting and response parsing.
//!
//! Pure string handling, no I/O, so the client can stay a thin loop over a
//! socket.

use chrono::NaiveDate;

use super::SearchCriteria;

/// Completion status of a tagged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    No,
    Bad,
}

/// Status of the line if it completes the command tagged `tag`.
pub fn tagged_status(line: &str, tag: &str) -> Option<Status> {
    let rest = line.strip_prefix(tag)?.strip_prefix(' ')?;
    let word = rest.split_whitespace().next()?;
    match word.to_ascii_uppercase().as_str() {
        "OK" => Some(Status::Ok),
        "NO" => Some(Status::No),
        "BAD" => Some(Status::Bad),
        _ => None,
    }
}

/// Byte count of a literal announced at the end of `line` (`... {123}\r\n`).
pub fn literal_len(line: &str) -> Option<usize> {
    let line = line.trim_end_matches(['\r', '\n']);
    let open = line.rfind('{')?;
    let inner = line[open + 1..].strip_suffix('}')?;
    inner.trim_end_matches('+').parse().ok()
}

/// Quote a string argument, escaping `\` and `"`.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if ch == '\\' || ch == '"' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// IMAP `date` format, e.g. `1-Jul-2025`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%-d-%b-%Y").to_string()
}

/// `UID SEARCH` command for the given criteria.
pub fn search_command(criteria: &SearchCriteria) -> String {
    let mut keys = Vec::new();
    if let Some(since) = criteria.since {
        keys.push(format!("SINCE {}", format_date(since)));
    }
    if criteria.unseen_only {
        keys.push("UNSEEN".to_string());
    }
    if keys.is_empty() {
        keys.push("ALL".to_string());
    }
    format!("UID SEARCH {}", keys.join(" "))
}

/// UIDs from untagged `* SEARCH` lines, in server order.
pub fn parse_search(lines: &[String]) -> Vec<u32> {
    lines
        .iter()
        .filter_map(|line| {
            let rest = line.strip_prefix("* ")?;
            let (word, ids) = rest.split_once(' ').unwrap_or((rest.trim_end(), ""));
            word.eq_ignore_ascii_case("SEARCH").then_some(ids)
        })
        .flat_map(|ids| ids.split_whitespace().filter_map(|id| id.parse().ok()))
        .collect()
}

/// Mailbox name from a `* LIST (flags) "delim" name` line.
pub fn parse_list_line(line: &str) -> Option<String> {
    let rest = line.trim_end_matches(['\r', '\n']).strip_prefix("* ")?;
    let (word, rest) = rest.split_once(' ')?;
    if !word.eq_ignore_ascii_case("LIST") {
        return None;
    }

    // Flags: parenthesized list.
    let rest = rest.trim_start().strip_prefix('(')?;
    let close = rest.find(')')?;
    let rest = rest[close + 1..].trim_start();

    // Hierarchy delimiter: quoted char or NIL.
    let (_, rest) = take_astring(rest)?;
    let (name, _) = take_astring(rest.trim_start())?;
    Some(name)
}

/// Split one quoted string or atom off the front of `input`.
fn take_astring(input: &str) -> Option<(String, &str)> {
    if let Some(body) = input.strip_prefix('"') {
        let mut value = String::new();
        let mut escaped = false;
        for (idx, ch) in body.char_indices() {
            match ch {
                _ if escaped => {
                    value.push(ch);
                    escaped = false;
                }
                '\\' => escaped = true,
                '"' => return Some((value, &body[idx + 1..])),
                _ => value.push(ch),
            }
        }
        None
    } else {
        let end = input.find(' ').unwrap_or(input.len());
        if end == 0 {
            return None;
        }
        Some((input[..end].to_string(), &input[end..]))
    }
}

/// UID named in a `* n FETCH (...)` response line, wherever it appears.
pub fn fetch_uid(line: &str) -> Option<u32> {
    let rest = line.strip_prefix("* ")?;
    let (_, rest) = rest.split_once(' ')?;
    let (word, items) = rest.split_once(' ')?;
    if !word.eq_ignore_ascii_case("FETCH") {
        return None;
    }

    let mut tokens = items
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .filter(|t| !t.is_empty());
    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case("UID") {
            return tokens.next()?.parse().ok();
        }
    }
    None
}

/// Keep only the newest `limit` identifiers (the tail of the server order).
pub fn apply_limit(mut uids: Vec<u32>, limit: Option<usize>) -> Vec<u32> {
    if let Some(limit) = limit
        && uids.len() > limit
    {
        uids.drain(..uids.len() - limit);
    }
    uids
}
