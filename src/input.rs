//! Input normalization and multi-command splitting

/// Collapse every whitespace run into one space and trim the ends
pub fn normalize(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a line into sub-commands on a literal separator
///
/// An empty separator, or one that does not occur in the line, yields the
/// line itself. Sub-commands are trimmed and empty ones are dropped.
pub fn split_commands(input: &str, separator: &str) -> Vec<String> {
    let pieces: Vec<&str> = if separator.is_empty() || !input.contains(separator) {
        vec![input]
    } else {
        input.split(separator).collect()
    };

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(String::from)
        .collect()
}
