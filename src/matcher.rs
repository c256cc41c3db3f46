use regex::Regex;
use url::Url;

/// Decides whether a site variant can capture a URL.
///
/// A URL is supported when its scheme is http or https, its host matches the
/// domain pattern in full, and the remainder (path without the leading slash,
/// plus `?query` when present) starts with a match of any path pattern.
#[derive(Debug, Clone)]
pub struct PageMatcher {
    domain: Regex,
    patterns: Vec<Regex>,
}

impl PageMatcher {
    /// Compile a matcher. Patterns are regular expressions; invalid ones are a
    /// programming error and reported as such.
    pub fn new(domain: &str, patterns: &[&str]) -> Result<Self, regex::Error> {
        let domain = Regex::new(&format!("^(?:{})$", domain))?;
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(&format!("^(?:{})", p)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { domain, patterns })
    }

    pub fn supports(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") || parsed.port().is_some() {
            return false;
        }
        if !parsed.host_str().is_some_and(|host| self.domain.is_match(host)) {
            return false;
        }

        let mut rest = parsed.path().trim_start_matches('/').to_string();
        if let Some(query) = parsed.query() {
            rest.push('?');
            rest.push_str(query);
        }
        self.patterns.iter().any(|pattern| pattern.is_match(&rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = r"www\.example\.co\.jp";
    const PATTERNS: [&str; 3] = [
        r"manga/official/\d+",
        r"manga/viewManga/(\?.*no=)?\d+",
        r"manga/official/\d+/\d+",
    ];

    fn matcher(patterns: &[&str]) -> PageMatcher {
        PageMatcher::new(DOMAIN, patterns).unwrap()
    }

    #[test]
    fn test_supports_matching_urls() {
        let m = matcher(&PATTERNS);
        assert!(m.supports("https://www.example.co.jp/manga/official/123"));
        assert!(m.supports("http://www.example.co.jp/manga/official/123/456"));
        assert!(m.supports("https://www.example.co.jp/manga/viewManga/?no=42"));
        assert!(m.supports("https://www.example.co.jp/manga/viewManga/?title=a&no=42"));
    }

    #[test]
    fn test_rejects_other_urls() {
        let m = matcher(&PATTERNS);
        assert!(!m.supports("ftp://www.example.co.jp/manga/official/123"));
        assert!(!m.supports("https://evil.www.example.co.jp/manga/official/123"));
        assert!(!m.supports("https://www.example.co.jp.evil.com/manga/official/123"));
        assert!(!m.supports("https://www.example.co.jp/manga/official/"));
        assert!(!m.supports("https://www.example.co.jp/books/official/123"));
        assert!(!m.supports("not a url"));
        assert!(!m.supports(""));
    }

    #[test]
    fn test_end_anchor_in_pattern() {
        let m = PageMatcher::new(r"shop\.example\.jp", &[r"shoshi-\d+/$"]).unwrap();
        assert!(m.supports("https://shop.example.jp/shoshi-100/"));
        assert!(!m.supports("https://shop.example.jp/shoshi-100/reviews"));
        assert!(!m.supports("https://shop.example.jp/shoshi-100"));
    }

    #[test]
    fn test_pattern_order_does_not_change_result() {
        let forward = matcher(&PATTERNS);
        let mut reversed_patterns = PATTERNS;
        reversed_patterns.reverse();
        let reversed = matcher(&reversed_patterns);

        let urls = [
            "https://www.example.co.jp/manga/official/1",
            "https://www.example.co.jp/manga/official/1/2",
            "https://www.example.co.jp/manga/viewManga/?no=7",
            "https://www.example.co.jp/manga/viewManga/abc",
            "https://www.example.co.jp/",
            "https://other.example.com/manga/official/1",
        ];
        for url in urls {
            assert_eq!(forward.supports(url), reversed.supports(url), "{}", url);
        }
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        assert!(PageMatcher::new(DOMAIN, &["manga/("]).is_err());
    }
}
