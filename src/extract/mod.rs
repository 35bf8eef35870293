//! Thread link extraction from free-form message text.

use once_cell::sync::Lazy;
use regex::Regex;

/// `reddit.com/r/<sub>/comments/<id>`; the thread ID is the only capture.
static THREAD_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)reddit\.com/r/\w*/comments/(\w+)").expect("valid regex")
});

/// Return the thread ID of the first thread link in `body`, if any.
///
/// The body is lower-cased before matching, so the returned ID is lower-case.
/// Later links in the same message are ignored.
pub fn extract_thread_id(body: &str) -> Option<String> {
    let normalized = body.to_lowercase();
    THREAD_LINK
        .captures(&normalized)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
