/// Punctuation removed before two answers are compared.
const STRIPPED: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~', '(',
    ')',
];

/// Lowercases, strips punctuation and collapses whitespace runs.
///
/// Leading and trailing whitespace is dropped after stripping, so the result
/// is stable under a second application.
pub fn normalize(input: &str) -> String {
    let stripped: String = input
        .to_lowercase()
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn are_equivalent(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Empty or whitespace-only submissions never reach validation.
pub fn is_valid_input(input: &str) -> bool {
    !input.trim().is_empty()
}
