//! Text normalisation shared by domain extraction and filtering.

use std::sync::LazyLock;

use regex::Regex;

/// A number immediately followed by a percent sign: `87%`, `12.5%`.
static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("valid percent pattern"));

/// Strip all whitespace and upper-case, so `"Aspirin Compound"` becomes
/// `"ASPIRINCOMPOUND"`.
pub fn clean_for_search(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Upper-cased whitespace-separated tokens, list punctuation trimmed.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|tok| tok.trim_matches(&[';', ','][..]))
        .filter(|tok| !tok.is_empty())
        .map(str::to_uppercase)
}

/// Every percentage in `text`, in order of appearance.
pub fn percentages(text: &str) -> Vec<f64> {
    PERCENT
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<f64>().ok())
        .collect()
}

/// The first percentage in `text`, if any.
pub fn first_percentage(text: &str) -> Option<f64> {
    PERCENT
        .captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}
