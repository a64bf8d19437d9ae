/// Case-fold, trim, and collapse internal whitespace to single spaces.
///
/// Applied to answers and expected answers alike, in every mode.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
