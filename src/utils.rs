use unicode_width::UnicodeWidthChar;

use crate::BrochureError;
use url::Url;

const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Safely truncate a string for display, ensuring it is not cut in the middle of
/// a multi-byte character and that its display width stays within `max_width`.
#[allow(dead_code)]
pub fn truncate_str(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthStr;

    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(1);

        if current_width + char_width + 3 > max_width {
            break;
        }

        result.push(c);
        current_width += char_width;
    }

    result.push_str("...");
    result
}

/// Resolves a link the model handed back against the page it came from.
///
/// Absolute links are taken as-is, relative ones are joined onto `base`.
/// Only http(s) targets are fetchable.
pub fn resolve_link(base: &str, link: &str) -> Result<Url, BrochureError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(BrochureError::InvalidLink {
            url: link.to_string(),
            reason: "empty URL".to_string(),
        });
    }

    let resolved = match Url::parse(link) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base)?.join(link)?,
        Err(e) => {
            return Err(BrochureError::InvalidLink {
                url: link.to_string(),
                reason: e.to_string(),
            })
        }
    };

    if !ALLOWED_SCHEMES.contains(&resolved.scheme()) {
        return Err(BrochureError::InvalidLink {
            url: link.to_string(),
            reason: format!("unsupported scheme '{}'", resolved.scheme()),
        });
    }

    Ok(resolved)
}
