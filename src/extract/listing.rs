use scraper::Html;
use tracing::debug;

use super::selectors::SelectorSet;
use super::{endpoint_from_link, text_of};
use crate::models::{AnimeStatus, ListingItem};

/// Pulls every anime card out of an ongoing or completed listing page.
/// Cards missing a title or a usable thumb link are skipped rather than
/// failing the whole page.
#[must_use]
pub fn extract_listing(html: &str, status: AnimeStatus, base_url: &str) -> Vec<ListingItem> {
    let sel = SelectorSet::get();
    let doc = Html::parse_document(html);
    let mut items = Vec::new();

    for card in doc.select(&sel.listing_item) {
        let title = card
            .select(&sel.listing_title)
            .next()
            .map(|el| text_of(&el))
            .unwrap_or_default();

        let Some(href) = card
            .select(&sel.listing_thumb_anchor)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            debug!("Listing card without a thumb anchor, skipping");
            continue;
        };

        if title.is_empty() {
            continue;
        }

        let thumb = card
            .select(&sel.image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .unwrap_or_default()
            .to_string();
        let total_episode = card
            .select(&sel.episode_count)
            .next()
            .map(|el| text_of(&el))
            .unwrap_or_default();
        let updated_on = card
            .select(&sel.updated_on)
            .next()
            .map(|el| text_of(&el))
            .unwrap_or_default();

        // The completed grid reuses the day-of-week slot for a score label.
        let rating = match status {
            AnimeStatus::Completed => card
                .select(&sel.rating_label)
                .next()
                .map(|el| text_of(&el))
                .filter(|s| !s.is_empty()),
            AnimeStatus::Ongoing => None,
        };

        items.push(ListingItem {
            title,
            endpoint: endpoint_from_link(href, base_url, "anime"),
            thumb,
            total_episode,
            updated_on,
            rating,
            status,
        });
    }

    items
}
