/// Characters with special meaning in the store's pattern language.
const PATTERN_METACHARACTERS: &[char] = &[
    '.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\',
];

/// Escape every pattern metacharacter in `input` with a single backslash.
///
/// The result matches `input` literally when used as a containment pattern.
/// Empty input yields an empty string and input without metacharacters is
/// returned unchanged.
pub fn escape_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if PATTERN_METACHARACTERS.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Returns true iff `input` has at most `max_length` characters.
///
/// Counts Unicode scalar values, not bytes.
pub fn validate_length(input: &str, max_length: usize) -> bool {
    input.chars().count() <= max_length
}

/// Trim a filter value and drop NUL characters, which text columns cannot
/// hold, before it is validated and escaped.
pub fn normalize_filter(input: &str) -> String {
    input.chars().filter(|c| *c != '\0').collect::<String>().trim().to_string()
}
