use std::sync::LazyLock;

use regex::Regex;

static POST_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(www\.)?(instagram\.com|instagr\.am)/(reel|reels|p)/[A-Za-z0-9_-]+")
        .expect("POST_URL_RE should compile")
});

static SHORTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:reel|reels|p)/([A-Za-z0-9_-]+)").expect("SHORTCODE_RE should compile")
});

/// True if `url` looks like an Instagram post or reel URL.
///
/// Accepts `http`/`https`, an optional `www.`, the `instagram.com` host or the
/// `instagr.am` short domain, then `/reel/`, `/reels/` or `/p/` and a token.
/// Matching is case-insensitive.
///
/// ```
/// use reelcap_social::instagram::url::is_post_url;
///
/// assert!(is_post_url("https://www.instagram.com/reel/C0ffee_-1/"));
/// assert!(is_post_url("http://instagr.am/p/abc"));
/// assert!(!is_post_url("https://www.instagram.com/natgeo/"));
/// ```
pub fn is_post_url(url: &str) -> bool {
    POST_URL_RE.is_match(url)
}

/// The post shortcode following `/reel/`, `/reels/` or `/p/`, if any.
///
/// ```
/// use reelcap_social::instagram::url::extract_shortcode;
///
/// assert_eq!(
///     extract_shortcode("https://www.instagram.com/p/ABC123xyz/?igsh=1").as_deref(),
///     Some("ABC123xyz")
/// );
/// assert_eq!(extract_shortcode("https://example.com/"), None);
/// ```
pub fn extract_shortcode(url: &str) -> Option<String> {
    SHORTCODE_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_post_shape() {
        for url in [
            "https://www.instagram.com/p/ABC123xyz/",
            "https://instagram.com/reel/XYZ/",
            "https://instagram.com/reels/a-b_c",
            "HTTPS://WWW.INSTAGRAM.COM/REEL/XYZ",
            "https://instagr.am/p/Q1",
        ] {
            assert!(is_post_url(url), "{url} should be accepted");
        }
    }

    #[test]
    fn rejects_other_shapes() {
        for url in [
            "not-a-url",
            "",
            "ftp://instagram.com/p/ABC/",
            "https://instagram.com/stories/someone/1/",
            "https://instagram.com/p/",
            "https://evil.com/instagram.com/p/ABC/",
            "https://m.instagram.com/p/ABC/",
            "https://www.facebook.com/reel/123",
        ] {
            assert!(!is_post_url(url), "{url} should be rejected");
        }
    }

    #[test]
    fn shortcode_is_the_segment_after_the_kind() {
        let cases = [
            ("https://www.instagram.com/p/ABC123xyz/", "ABC123xyz"),
            ("https://instagram.com/reel/XYZ/", "XYZ"),
            ("https://instagram.com/reels/a-b_c?utm=1", "a-b_c"),
            ("https://instagr.am/p/Q1#frag", "Q1"),
        ];
        for (url, expected) in cases {
            assert!(is_post_url(url));
            assert_eq!(extract_shortcode(url).as_deref(), Some(expected), "{url}");
        }
    }

    #[test]
    fn uppercase_kind_validates_but_yields_no_shortcode() {
        let url = "https://instagram.com/P/abc";
        assert!(is_post_url(url));
        assert_eq!(extract_shortcode(url), None);
    }
}
