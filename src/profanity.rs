//! Word filter applied to chirp bodies before they are stored.

const BANNED_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const MASK: &str = "****";

/// Replaces every banned word with `****`.
///
/// Words are the pieces between single spaces and are compared
/// case-insensitively. A banned word with punctuation attached (`fornax!`)
/// is left alone, and the original spacing is preserved.
pub fn clean(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            let lowered = word.to_lowercase();
            if BANNED_WORDS.contains(&lowered.as_str()) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
