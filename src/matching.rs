//! Spoken-script matching
//!
//! Judges whether a speech transcript counts as a recitation of an alarm
//! script. Comparison is case-, space-, and period-insensitive because ASR
//! transcripts rarely preserve exact punctuation or spacing.

use strsim::levenshtein;

/// Fraction of the script length allowed as edit errors
pub const ERROR_TOLERANCE: f64 = 0.2;

/// Normalize text for comparison: drop spaces and periods, lowercase
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| *c != ' ' && *c != '.')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Edit distance between the normalized forms of `source` and `target`
pub fn edit_distance(source: &str, target: &str) -> usize {
    levenshtein(&normalize(source), &normalize(target))
}

/// Whether `transcript` matches `script` within the error tolerance.
///
/// The error budget is `ERROR_TOLERANCE` of the script length as written,
/// spaces and periods included, while the distance itself is computed over
/// the normalized strings. Intentional: the budget tracks how long the
/// script reads to the user, not its compressed form.
pub fn matches_script(script: &str, transcript: &str) -> bool {
    let budget = script.chars().count() as f64 * ERROR_TOLERANCE;
    edit_distance(script, transcript) as f64 <= budget
}
