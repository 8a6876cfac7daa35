//! Prompt templates for the link filter, the brochure writer and the summarizer.
//!
//! Every builder here is pure string templating. The only policy lives in
//! [`truncate_chars`], which caps a prompt at a fixed number of characters.

use crate::Page;

/// Character budget for the brochure and summary user prompts.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 5_000;

pub const LINK_FILTER_SYSTEM_PROMPT: &str = "You are provided with a list of links found on a webpage. \
You are able to decide which of the links would be most relevant to include in a brochure about the company, \
such as links to an About page, or a Company page, or Careers/Jobs pages.\n\
You should respond in JSON as in this example:
{
    \"links\": [
        {\"type\": \"about page\", \"url\": \"https://full.url/goes/here/about\"},
        {\"type\": \"careers page\", \"url\": \"https://another.full.url/careers\"}
    ]
}";

pub const BROCHURE_SYSTEM_PROMPT: &str = "You are an assistant that analyzes the contents of several relevant pages from a company website \
and creates a short brochure about the company for prospective customers, investors, and recruits. \
Respond in html. Include details of company culture, customers, and careers/jobs if you have the information.";

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an assistant that analyzes the contents of a website \
and provides a short summary, ignoring text and symbols that might be navigation related or cannot be read. \
Respond in markdown.";

/// Lists every link of `page` and asks for the brochure-relevant ones as absolute URLs.
///
/// A trailing `/` is dropped from the page URL so the relative-to-absolute
/// example reads `https://x.com/about`, not `https://x.com//about`.
pub fn link_filter_user_prompt(page: &Page) -> String {
    let mut prompt = format!(
        "Here is the list of links on the website of {url} - \
         please decide which of these are relevant web links for a brochure about the company, \
         respond with the full https URL in JSON format. \
         Example of relative to full url conversion: /about -> {url}/about. \
         Do not include Terms of Service, Privacy, email links.\n\
         Links (some might be relative links):\n",
        url = page.url.trim_end_matches('/'),
    );
    prompt.push_str(&page.links.join("\n"));
    prompt
}

/// Company header followed by the aggregated page contents, capped at `max_chars`.
pub fn brochure_user_prompt(company_name: &str, aggregate: &str, max_chars: usize) -> String {
    let prompt = format!(
        "You are looking at a company called: {company_name}\n\
         Here are the contents of its landing page and other relevant pages; \
         use this information to build a short brochure of the company in html.\n\
         {aggregate}"
    );
    truncate_chars(&prompt, max_chars).to_string()
}

/// Title header plus page text, capped at `max_chars` like the brochure prompt.
pub fn summary_user_prompt(page: &Page, max_chars: usize) -> String {
    let prompt = format!(
        "You are looking at a website titled {title} \
         \nThe contents of this website is as follows; \
         please provide a short summary of this website in markdown. \
         Be concise, only provided the requested content without asking for next tasks.\n\n\
         {text}",
        title = page.title,
        text = page.text,
    );
    truncate_chars(&prompt, max_chars).to_string()
}

/// Hard cutoff after `max_chars` Unicode scalar values. Never splits a code point
/// and never reorders: the result is always a prefix of `s`.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &s[..byte_index],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(links: &[&str]) -> Page {
        Page {
            url: "https://x.com/".to_string(),
            title: "X".to_string(),
            text: "Body".to_string(),
            links: links.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_truncate_chars_short_input_untouched() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn test_truncate_chars_is_exact_prefix() {
        let long = "0123456789".repeat(700);
        let cut = truncate_chars(&long, DEFAULT_MAX_PROMPT_CHARS);
        assert_eq!(cut.chars().count(), DEFAULT_MAX_PROMPT_CHARS);
        assert!(long.starts_with(cut));
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
    }

    #[test]
    fn test_link_filter_prompt_lists_links() {
        let prompt = link_filter_user_prompt(&page(&["/about", "https://x.com/careers"]));
        assert!(prompt.contains("website of https://x.com -"));
        assert!(prompt.contains("/about -> https://x.com/about"));
        assert!(prompt.ends_with("Links (some might be relative links):\n/about\nhttps://x.com/careers"));
    }

    #[test]
    fn test_brochure_prompt_is_capped() {
        let aggregate = "a".repeat(10_000);
        let prompt = brochure_user_prompt("Acme", &aggregate, 5_000);
        assert_eq!(prompt.chars().count(), 5_000);
        assert!(prompt.starts_with("You are looking at a company called: Acme\n"));
    }

    #[test]
    fn test_summary_prompt_includes_title_and_text() {
        let prompt = summary_user_prompt(&page(&[]), DEFAULT_MAX_PROMPT_CHARS);
        assert!(prompt.starts_with("You are looking at a website titled X"));
        assert!(prompt.ends_with("\n\nBody"));
    }

    #[test]
    fn test_summary_prompt_is_capped() {
        let mut long_page = page(&[]);
        long_page.text = "word ".repeat(2_000);
        let prompt = summary_user_prompt(&long_page, 1_000);
        assert_eq!(prompt.chars().count(), 1_000);
        assert!(prompt.starts_with("You are looking at a website titled X"));
    }

    #[test]
    fn test_link_filter_prompt_keeps_url_without_trailing_slash() {
        let mut landing = page(&["/about"]);
        landing.url = "https://x.com/en".into();
        let prompt = link_filter_user_prompt(&landing);
        assert!(prompt.contains("website of https://x.com/en -"));
        assert!(prompt.contains("/about -> https://x.com/en/about"));
    }
}
