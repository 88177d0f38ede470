use scraper::Html;

use super::selectors::SelectorSet;
use super::{endpoint_from_link, text_of};
use crate::models::GenreEntry;

/// Pulls every genre anchor off the genre index page. Anchors without an
/// href or with an empty name are dropped.
#[must_use]
pub fn extract_genres(html: &str, base_url: &str) -> Vec<GenreEntry> {
    let sel = SelectorSet::get();
    let doc = Html::parse_document(html);

    doc.select(&sel.genre_anchor)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let name = text_of(&a);
            if name.is_empty() {
                return None;
            }
            Some(GenreEntry {
                name,
                endpoint: endpoint_from_link(href, base_url, "genres"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_genre_entries() {
        let html = r#"<ul class="genres">
            <li><a href="/genres/action/">Action</a></li>
            <li><a href="/genres/slice-of-life/">Slice of Life</a></li>
            <li><a>No Href</a></li>
        </ul>"#;

        let genres = extract_genres(html, "https://otakudesu.watch");
        assert_eq!(genres.len(), 2);
        assert_eq!(genres[0].name, "Action");
        assert_eq!(genres[0].endpoint, "action");
        assert_eq!(genres[1].endpoint, "slice-of-life");
    }
}
