//! Pure HTML extraction. Every function here takes already-fetched markup
//! and returns plain data; nothing in this module touches the network or
//! the database.

pub mod detail;
pub mod episode;
pub mod genres;
pub mod listing;
pub mod selectors;

use scraper::ElementRef;

/// Reduces an absolute upstream link to its endpoint slug by stripping the
/// `{base}/{segment}/` prefix and the trailing slash. Links that do not
/// carry the expected prefix are stripped of slashes only, so relative
/// hrefs degrade to the same canonical form.
#[must_use]
pub fn endpoint_from_link(link: &str, base_url: &str, segment: &str) -> String {
    let prefix = format!("{}/{}/", base_url.trim_end_matches('/'), segment);
    link.strip_prefix(&prefix)
        .unwrap_or(link)
        .trim_start_matches('/')
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Collects an element's text content, whitespace-trimmed.
#[must_use]
pub(crate) fn text_of(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_absolute_link() {
        assert_eq!(
            endpoint_from_link(
                "https://otakudesu.watch/anime/spy-x-family-sub-indo/",
                "https://otakudesu.watch",
                "anime"
            ),
            "spy-x-family-sub-indo"
        );
    }

    #[test]
    fn test_endpoint_from_relative_link() {
        assert_eq!(
            endpoint_from_link("/genres/action/", "https://otakudesu.watch", "genres"),
            "action"
        );
    }

    #[test]
    fn test_endpoint_handles_missing_trailing_slash() {
        assert_eq!(
            endpoint_from_link(
                "https://otakudesu.watch/episode/sxf-episode-12-sub-indo",
                "https://otakudesu.watch",
                "episode"
            ),
            "sxf-episode-12-sub-indo"
        );
    }
}
