use crate::Page;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::OnceLock;
use tracing::debug;

/// Title used when a document has no usable `<title>`.
pub const NO_TITLE_PLACEHOLDER: &str = "No title found";

/// Elements whose content never makes it into the extracted text.
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "img", "input"];

const TEXT_SEPARATOR: &str = "\n";

fn body_open_tag() -> &'static Regex {
    static BODY: OnceLock<Regex> = OnceLock::new();
    BODY.get_or_init(|| Regex::new(r"(?i)<body[\s/>]").expect("body pattern is valid"))
}

/// Turns raw HTML into a [`Page`]: title, readable body text and anchor targets.
#[derive(Clone, Debug, Default)]
pub struct PageTextExtractor;

impl PageTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extraction never fails; missing pieces degrade to the placeholder title,
    /// empty text or an empty link list.
    ///
    /// The parser always synthesizes a `<body>`, so whether the document has one
    /// is decided from the source: without a `<body>` tag the text is empty.
    pub fn extract(&self, html: &str, url: &str) -> Page {
        let document = Html::parse_document(html);

        let title = self
            .extract_title(&document)
            .unwrap_or_else(|| NO_TITLE_PLACEHOLDER.to_string());
        let text = if body_open_tag().is_match(html) {
            self.extract_text(&document)
        } else {
            String::new()
        };
        let links = self.extract_links(&document);

        debug!(
            url = %url,
            title = %title,
            text_length = text.len(),
            link_count = links.len(),
            "Extracted page content"
        );

        Page {
            url: url.to_string(),
            title,
            text,
            links,
        }
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        let title_selector = Selector::parse("title").ok()?;

        document
            .select(&title_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
    }

    fn extract_text(&self, document: &Html) -> String {
        let body = Selector::parse("body")
            .ok()
            .and_then(|selector| document.select(&selector).next());

        let Some(body) = body else {
            return String::new();
        };

        let mut fragments = Vec::new();
        collect_text(body, &mut fragments);
        fragments.join(TEXT_SEPARATOR)
    }

    fn extract_links(&self, document: &Html) -> Vec<String> {
        let Ok(anchor_selector) = Selector::parse("a") else {
            return Vec::new();
        };

        document
            .select(&anchor_selector)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| !href.is_empty())
            .map(String::from)
            .collect()
    }
}

fn collect_text<'a>(element: ElementRef<'a>, fragments: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.text.trim();
                if !trimmed.is_empty() {
                    fragments.push(trimmed);
                }
            }
            Node::Element(el) => {
                if SKIPPED_TAGS.contains(&el.name()) {
                    continue;
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, fragments);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Page {
        PageTextExtractor::new().extract(html, "https://x.com")
    }

    #[test]
    fn test_missing_title_uses_placeholder() {
        let page = extract("<html><body><p>Hello</p></body></html>");
        assert_eq!(page.title, NO_TITLE_PLACEHOLDER);

        let page = extract("<html><head><title>   </title></head><body></body></html>");
        assert_eq!(page.title, NO_TITLE_PLACEHOLDER);
    }

    #[test]
    fn test_title_is_trimmed() {
        let page = extract("<html><head><title>\n  Acme Corp \n</title></head></html>");
        assert_eq!(page.title, "Acme Corp");
    }

    #[test]
    fn test_non_content_tags_are_dropped() {
        let html = r#"<html><body>
            <h1>Welcome</h1>
            <script>var secret = "script text";</script>
            <style>.hidden { color: red; }</style>
            <img src="logo.png" alt="logo alt">
            <input value="typed value">
            <p>We build <b>things</b>.</p>
        </body></html>"#;

        let page = extract(html);
        assert_eq!(page.text, "Welcome\nWe build\nthings\n.");
        assert!(!page.text.contains("script text"));
        assert!(!page.text.contains("color: red"));
    }

    #[test]
    fn test_nested_skipped_subtree() {
        let html = "<body><div>keep<script><!-- x -->drop</script></div><p>tail</p></body>";
        assert_eq!(extract(html).text, "keep\ntail");
    }

    #[test]
    fn test_empty_document_yields_empty_text() {
        let page = extract("");
        assert_eq!(page.text, "");
        assert_eq!(page.title, NO_TITLE_PLACEHOLDER);
        assert!(page.links.is_empty());
    }

    #[test]
    fn test_document_without_body_yields_empty_text() {
        let page = extract("<title>T</title><p>Hello</p>");
        assert_eq!(page.title, "T");
        assert_eq!(page.text, "");
    }

    #[test]
    fn test_body_tag_is_matched_case_insensitively() {
        assert_eq!(extract("<BODY class=\"home\"><p>Hello</p></BODY>").text, "Hello");
        assert_eq!(extract("<body/><p>Hello</p>").text, "Hello");
        assert_eq!(extract("<bodyguard>Hello</bodyguard>").text, "");
    }

    #[test]
    fn test_links_skip_empty_and_keep_order() {
        let html = r#"<html><body>
            <a href="/about">About</a>
            <a href="https://x.com/careers">Careers</a>
            <a href="">Nothing</a>
            <a>No href</a>
            <a href="/terms">Terms</a>
            <a href="/about">About again</a>
        </body></html>"#;

        assert_eq!(
            extract(html).links,
            vec!["/about", "https://x.com/careers", "/terms", "/about"]
        );
    }

    #[test]
    fn test_links_outside_body_are_collected() {
        let html = r#"<html><head><title>T</title></head><body><a href="/x">x</a></body></html>"#;
        assert_eq!(extract(html).links, vec!["/x"]);
    }
}
