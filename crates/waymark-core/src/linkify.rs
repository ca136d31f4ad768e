// SPDX-License-Identifier: MIT

use regex::Regex;

/// One segment of an auto-linked description.
#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    Text(String),
    Link(String),
}

/// Splits free text into ordered text and link spans so front ends can
/// render embedded URLs as clickable. Trailing sentence punctuation is
/// left out of the link.
pub fn linkify(text: &str) -> Vec<Span> {
    let re = Regex::new(r"https?://[^\s]+").unwrap();

    let mut spans = Vec::new();
    let mut cursor = 0;
    for found in re.find_iter(text) {
        let url = found.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', ')']);
        let end = found.start() + url.len();

        if found.start() > cursor {
            spans.push(Span::Text(text[cursor..found.start()].to_string()));
        }
        if !url.is_empty() {
            spans.push(Span::Link(url.to_string()));
        }
        cursor = end;
    }
    if cursor < text.len() {
        spans.push(Span::Text(text[cursor..].to_string()));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_one_span() {
        assert_eq!(
            linkify("just words"),
            vec![Span::Text("just words".to_string())]
        );
    }

    #[test]
    fn test_url_becomes_link_span() {
        assert_eq!(
            linkify("see https://example.org/mill for hours"),
            vec![
                Span::Text("see ".to_string()),
                Span::Link("https://example.org/mill".to_string()),
                Span::Text(" for hours".to_string()),
            ]
        );
    }

    #[test]
    fn test_trailing_punctuation_stays_text() {
        assert_eq!(
            linkify("Open daily, https://example.org."),
            vec![
                Span::Text("Open daily, ".to_string()),
                Span::Link("https://example.org".to_string()),
                Span::Text(".".to_string()),
            ]
        );
    }

    #[test]
    fn test_multiple_urls() {
        let spans = linkify("http://a.example and https://b.example");
        assert_eq!(
            spans,
            vec![
                Span::Link("http://a.example".to_string()),
                Span::Text(" and ".to_string()),
                Span::Link("https://b.example".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_text() {
        assert!(linkify("").is_empty());
    }
}
