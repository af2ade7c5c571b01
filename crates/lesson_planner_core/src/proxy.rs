//! crates/lesson_planner_core/src/proxy.rs
//!
//! Maps REST-style paths onto a backend that serves one script per resource.

use regex::Regex;
use std::sync::OnceLock;

const API_PREFIX: &str = "/api";
const BACKEND_PREFIX: &str = "/backend/api";

fn resource_pattern() -> &'static Regex {
    static RESOURCE: OnceLock<Regex> = OnceLock::new();
    RESOURCE.get_or_init(|| {
        Regex::new(r"^/backend/api/([A-Za-z]+)").expect("resource pattern is valid")
    })
}

/// Rewrites `/api/<resource>[/<anything>][?query]` to
/// `/backend/api/<resource>.<ext>[?query]`.
///
/// Everything after the resource name up to the query is discarded. The query
/// is reattached verbatim unless it is empty. Paths without a leading
/// alphabetic resource keep their shape apart from the prefix.
///
/// ```
/// use lesson_planner_core::proxy::rewrite_proxy_path;
///
/// assert_eq!(rewrite_proxy_path("/api/lessons?id=5", "cfm"), "/backend/api/lessons.cfm?id=5");
/// assert_eq!(rewrite_proxy_path("/api/groups/3", "cfm"), "/backend/api/groups.cfm");
/// ```
pub fn rewrite_proxy_path(path: &str, script_ext: &str) -> String {
    let (pathname, query) = match path.split_once('?') {
        Some((pathname, query)) => (pathname, Some(query)),
        None => (path, None),
    };

    let mut rewritten = match pathname.strip_prefix(API_PREFIX) {
        Some(rest) => format!("{}{}", BACKEND_PREFIX, rest),
        None => pathname.to_string(),
    };

    if let Some(resource) = resource_pattern()
        .captures(&rewritten)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
    {
        rewritten = format!("{}/{}.{}", BACKEND_PREFIX, resource, script_ext);
    }

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        rewritten.push('?');
        rewritten.push_str(query);
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_subpaths_into_one_script() {
        assert_eq!(
            rewrite_proxy_path("/api/snippets/language/python", "cfm"),
            "/backend/api/snippets.cfm"
        );
        assert_eq!(
            rewrite_proxy_path("/api/lessons/search?q=loops", "php"),
            "/backend/api/lessons.php?q=loops"
        );
    }

    #[test]
    fn query_is_kept_verbatim() {
        assert_eq!(
            rewrite_proxy_path("/api/progress?studentId=1&lessonId=2", "cfm"),
            "/backend/api/progress.cfm?studentId=1&lessonId=2"
        );
        assert_eq!(rewrite_proxy_path("/api/lessons?", "cfm"), "/backend/api/lessons.cfm");
    }

    #[test]
    fn resource_is_the_leading_letters_only() {
        assert_eq!(rewrite_proxy_path("/api/ai/generate-lesson", "cfm"), "/backend/api/ai.cfm");
        assert_eq!(rewrite_proxy_path("/api/v2lessons", "cfm"), "/backend/api/v.cfm");
    }

    #[test]
    fn paths_without_a_resource_keep_their_shape() {
        assert_eq!(rewrite_proxy_path("/api/123", "cfm"), "/backend/api/123");
        assert_eq!(rewrite_proxy_path("/api", "cfm"), "/backend/api");
        assert_eq!(rewrite_proxy_path("/health?x=1", "cfm"), "/health?x=1");
    }
}
