/// Replacement table for symbols that restricted text sinks cannot encode.
const SYMBOL_REPLACEMENTS: [(char, &str); 5] = [
    ('™', "(TM)"),
    ('–', "-"),
    ('≥', ">="),
    ('✓', "v"),
    ('✔', "v"),
];

/// Map the restricted symbols to ASCII-safe equivalents. Other characters
/// pass through untouched.
pub fn normalize_symbols(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for c in text.chars() {
        match SYMBOL_REPLACEMENTS
            .iter()
            .find(|(symbol, _)| *symbol == c)
        {
            Some((_, replacement)) => normalized.push_str(replacement),
            None => normalized.push(c),
        }
    }
    normalized
}
