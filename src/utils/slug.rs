use once_cell::sync::Lazy;
use regex::Regex;

/// Lower-case, ASCII-only, dash-separated form of `input` for use in
/// identifiers such as launchd labels. Falls back to `fallback` when nothing
/// usable remains.
pub fn slugify(input: &str, fallback: &str) -> String {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
    let lowercase = input.to_lowercase();
    let replaced = RE.replace_all(lowercase.trim(), "-");
    let slug = replaced.trim_matches('-');
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators() {
        assert_eq!(slugify("Proactive Comms", "job"), "proactive-comms");
        assert_eq!(slugify("decision_engine.py", "job"), "decision-engine-py");
        assert_eq!(slugify("--", "job"), "job");
    }
}
