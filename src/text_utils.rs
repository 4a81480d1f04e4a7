use once_cell::sync::Lazy;
use regex::Regex;

static SPACE_COLLAPSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// The `context` field sent alongside the prompt.
pub fn build_context(url: &str, language: &str) -> String {
    let language = if language.is_empty() { "None" } else { language };
    format!("Website: {url}\nLanguage: {language}")
}

/// Flatten a transcript to a single line so it can be appended to a prompt.
pub fn normalize_transcript(text: &str) -> String {
    SPACE_COLLAPSE.replace_all(text.trim(), " ").into_owned()
}

pub fn append_transcript(prompt: &mut String, transcript: &str) {
    prompt.push(' ');
    prompt.push_str(transcript);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_names_missing_language() {
        assert_eq!(
            build_context("https://example.com", ""),
            "Website: https://example.com\nLanguage: None"
        );
        assert_eq!(
            build_context("https://example.com", "Spanish"),
            "Website: https://example.com\nLanguage: Spanish"
        );
    }

    #[test]
    fn transcript_is_flattened() {
        assert_eq!(
            normalize_transcript("  summarize \n\n this   page\t"),
            "summarize this page"
        );
        assert_eq!(normalize_transcript(" \n "), "");
    }

    #[test]
    fn transcript_gets_leading_space() {
        let mut prompt = String::from("Summarize");
        append_transcript(&mut prompt, "in French");
        assert_eq!(prompt, "Summarize in French");

        let mut empty = String::new();
        append_transcript(&mut empty, "hello");
        assert_eq!(empty, " hello");
    }
}
