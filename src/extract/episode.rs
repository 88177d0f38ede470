use scraper::{ElementRef, Html, Selector};

use super::selectors::SelectorSet;
use super::text_of;
use crate::models::{BatchRecord, DownloadLinks, EpisodeRecord, Mirror, QualityTier};

/// Extracts an episode page. Missing pieces degrade: no iframe means an
/// empty stream link, and an absent download block leaves all tiers unset.
/// `fallback_title` and `date` come from the detail page's episode list,
/// used when the page's own heading is empty.
#[must_use]
pub fn extract_episode(
    html: &str,
    endpoint: &str,
    fallback_title: &str,
    date: &str,
) -> EpisodeRecord {
    let sel = SelectorSet::get();
    let doc = Html::parse_document(html);

    let mut episode_title = doc
        .select(&sel.episode_title)
        .next()
        .map(|el| text_of(&el))
        .unwrap_or_default();
    if episode_title.is_empty() {
        episode_title = fallback_title.to_string();
    }

    let stream_link = doc
        .select(&sel.stream_iframe)
        .next()
        .and_then(|iframe| iframe.value().attr("src"))
        .unwrap_or_default()
        .to_string();

    EpisodeRecord {
        episode_title,
        episode_endpoint: endpoint.to_string(),
        episode_date: date.to_string(),
        stream_link,
        download_links: extract_download_links(&doc),
    }
}

/// Extracts a batch page. Batch download blocks only come in the
/// list-per-tier layout.
#[must_use]
pub fn extract_batch(html: &str, endpoint: &str) -> BatchRecord {
    let sel = SelectorSet::get();
    let doc = Html::parse_document(html);

    let batch_title = doc
        .select(&sel.batch_title)
        .next()
        .map(|el| text_of(&el))
        .unwrap_or_default();

    BatchRecord {
        batch_title,
        batch_endpoint: endpoint.to_string(),
        download_links: DownloadLinks {
            low_quality: list_tier(&doc, &sel.batch_tier_list, 0),
            medium_quality: list_tier(&doc, &sel.batch_tier_list, 1),
            high_quality: list_tier(&doc, &sel.batch_tier_list, 2),
        },
    }
}

/// The upstream ships two download-block templates. The common one is a
/// `.download ul` with one `li` per quality tier; some pages instead carry
/// boxed tiers (`.anime-box` or `.yondarkness-box`) whose heading embeds
/// quality and size as `... [480p] [80MB]`. An empty first list item marks
/// the boxed variant.
#[must_use]
pub fn extract_download_links(doc: &Html) -> DownloadLinks {
    let sel = SelectorSet::get();

    let first_item_text = doc
        .select(&sel.download_tier_list)
        .next()
        .and_then(|ul| ul.select(&sel.list_item).next())
        .map(|li| text_of(&li))
        .unwrap_or_default();

    if first_item_text.is_empty() {
        let boxed_has_titles = doc
            .select(&sel.boxed_download)
            .next()
            .and_then(|b| b.select(&sel.boxed_title).next())
            .map(|t| !text_of(&t).is_empty())
            .unwrap_or(false);

        let (boxes, title_sel, item_sel) = if boxed_has_titles {
            (&sel.boxed_download, &sel.boxed_title, &sel.boxed_item)
        } else {
            (
                &sel.dark_boxed_download,
                &sel.dark_boxed_title,
                &sel.dark_boxed_item,
            )
        };

        DownloadLinks {
            low_quality: boxed_tier(doc, boxes, title_sel, item_sel, 0),
            medium_quality: boxed_tier(doc, boxes, title_sel, item_sel, 1),
            high_quality: boxed_tier(doc, boxes, title_sel, item_sel, 2),
        }
    } else {
        DownloadLinks {
            low_quality: list_tier(doc, &sel.download_tier_list, 0),
            medium_quality: list_tier(doc, &sel.download_tier_list, 1),
            high_quality: list_tier(doc, &sel.download_tier_list, 2),
        }
    }
}

fn list_tier(doc: &Html, lists: &Selector, n: usize) -> Option<QualityTier> {
    let sel = SelectorSet::get();

    for ul in doc.select(lists) {
        let Some(li) = ul.select(&sel.list_item).nth(n) else {
            continue;
        };
        let quality = li
            .select(&sel.quality_label)
            .next()
            .map(|el| text_of(&el))
            .unwrap_or_default();
        let size = li
            .select(&sel.size_label)
            .next()
            .map(|el| text_of(&el))
            .unwrap_or_default();
        let download_links = mirrors_of(&li);

        if !download_links.is_empty() {
            return Some(QualityTier {
                quality,
                size,
                download_links,
            });
        }
    }
    None
}

fn boxed_tier(
    doc: &Html,
    boxes: &Selector,
    title_sel: &Selector,
    item_sel: &Selector,
    n: usize,
) -> Option<QualityTier> {
    for bx in doc.select(boxes) {
        let Some(title) = bx.select(title_sel).nth(n) else {
            continue;
        };
        let Some((quality, size)) = parse_bracket_title(&text_of(&title)) else {
            continue;
        };
        let Some(item) = bx.select(item_sel).nth(n) else {
            continue;
        };
        let download_links = mirrors_of(&item);

        if !download_links.is_empty() {
            return Some(QualityTier {
                quality,
                size,
                download_links,
            });
        }
    }
    None
}

fn mirrors_of(el: &ElementRef<'_>) -> Vec<Mirror> {
    let sel = SelectorSet::get();
    el.select(&sel.anchor)
        .filter_map(|a| {
            let link = a.value().attr("href")?;
            Some(Mirror {
                host: text_of(&a),
                link: link.to_string(),
            })
        })
        .collect()
}

/// Splits a boxed tier heading like `MKV [480p][80MB]` into its quality
/// and size tokens.
fn parse_bracket_title(text: &str) -> Option<(String, String)> {
    let (_, rest) = text.split_once('[')?;
    let (quality, rest) = rest.split_once(']')?;
    let (_, size_part) = rest.split_once('[')?;
    let size = size_part.split(']').next().unwrap_or(size_part);
    Some((quality.trim().to_string(), size.trim().to_string()))
}
