use scraper::Html;

use super::selectors::SelectorSet;
use super::{endpoint_from_link, text_of};
use crate::models::{AnimeRecord, AnimeStatus, EpisodeKind, EpisodeRef};

/// Everything a single detail page yields: the anime record itself and the
/// episode/batch sub-pages it links to.
#[derive(Debug, Clone)]
pub struct DetailPage {
    pub anime: AnimeRecord,
    pub episode_refs: Vec<EpisodeRef>,
}

/// Extracts a detail page. The info block is joined into newline-separated
/// `synopsis` and `detail` texts; airing status is inferred from whether
/// the detail text mentions "Ongoing".
#[must_use]
pub fn extract_detail(html: &str, endpoint: &str, base_url: &str) -> DetailPage {
    let sel = SelectorSet::get();
    let doc = Html::parse_document(html);

    let mut thumb = String::new();
    let mut synopsis_lines = Vec::new();
    let mut detail_lines = Vec::new();

    for info in doc.select(&sel.detail_info) {
        if let Some(src) = info
            .select(&sel.image)
            .next()
            .and_then(|img| img.value().attr("src"))
        {
            thumb = src.to_string();
        }
        for p in info.select(&sel.synopsis_paragraph) {
            synopsis_lines.push(text_of(&p));
        }
        for p in info.select(&sel.info_paragraph) {
            detail_lines.push(text_of(&p));
        }
    }

    let title = doc
        .select(&sel.detail_title)
        .next()
        .map(|el| text_of(&el))
        .unwrap_or_default();
    let detail = detail_lines.join("\n");
    let status = if detail.contains("Ongoing") {
        AnimeStatus::Ongoing
    } else {
        AnimeStatus::Completed
    };

    let mut episode_refs = Vec::new();
    for item in doc.select(&sel.episode_list_item) {
        let Some(anchor) = item.select(&sel.episode_anchor).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let ep_endpoint = endpoint_from_link(href, base_url, "episode");
        if ep_endpoint.is_empty() {
            continue;
        }

        let kind = if ep_endpoint.contains("batch") {
            EpisodeKind::Batch
        } else {
            EpisodeKind::Episode
        };
        let date = item
            .select(&sel.episode_date)
            .next()
            .map(|el| text_of(&el))
            .unwrap_or_default();

        episode_refs.push(EpisodeRef {
            title: text_of(&anchor),
            endpoint: ep_endpoint,
            date,
            kind,
        });
    }

    DetailPage {
        anime: AnimeRecord {
            title,
            endpoint: endpoint.to_string(),
            thumb,
            status,
            rating: None,
            synopsis: synopsis_lines.join("\n"),
            detail,
            total_episode: None,
            updated_on: None,
        },
        episode_refs,
    }
}

/// Pulls the genre names out of a detail text's "Genre: a, b, c" line.
/// Empty segments after comma-splitting are dropped.
#[must_use]
pub fn genre_names(detail: &str) -> Vec<String> {
    let Some(line) = detail
        .lines()
        .find_map(|l| l.trim().strip_prefix("Genre:"))
    else {
        return Vec::new();
    };

    line.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://otakudesu.watch";

    fn detail_fixture() -> String {
        format!(
            r#"<div class="jdlrx"><h1>Spy x Family Sub Indo</h1></div>
            <div class="fotoanime">
                <img src="{BASE}/img/sxf.jpg">
                <div class="sinopc"><p>A spy builds a family.</p><p>For the mission.</p></div>
                <div class="infozingle">
                    <p>Judul: Spy x Family</p>
                    <p>Status: Ongoing</p>
                    <p>Genre: Action, Comedy, Slice of Life</p>
                </div>
            </div>
            <div class="episodelist"><ul>
                <li><span><a href="{BASE}/batch/sxf-batch-sub-indo/">Sxf Batch</a></span>
                    <span class="zeebr">10 Jun</span></li>
                <li><span><a href="{BASE}/episode/sxf-episode-2-sub-indo/">Episode 2</a></span>
                    <span class="zeebr">16 Apr</span></li>
                <li><span><a href="{BASE}/episode/sxf-episode-1-sub-indo/">Episode 1</a></span>
                    <span class="zeebr">9 Apr</span></li>
            </ul></div>"#
        )
    }

    #[test]
    fn test_extracts_record_fields() {
        let page = extract_detail(&detail_fixture(), "spy-x-family-sub-indo", BASE);
        assert_eq!(page.anime.title, "Spy x Family Sub Indo");
        assert_eq!(page.anime.endpoint, "spy-x-family-sub-indo");
        assert_eq!(page.anime.status, AnimeStatus::Ongoing);
        assert_eq!(
            page.anime.synopsis,
            "A spy builds a family.\nFor the mission."
        );
        assert!(page.anime.detail.contains("Genre: Action, Comedy, Slice of Life"));
    }

    #[test]
    fn test_batch_refs_are_classified_by_endpoint() {
        let page = extract_detail(&detail_fixture(), "spy-x-family-sub-indo", BASE);
        assert_eq!(page.episode_refs.len(), 3);
        assert_eq!(page.episode_refs[0].kind, EpisodeKind::Batch);
        assert_eq!(page.episode_refs[0].endpoint, "sxf-batch-sub-indo");
        assert_eq!(page.episode_refs[1].kind, EpisodeKind::Episode);
        assert_eq!(page.episode_refs[1].endpoint, "sxf-episode-2-sub-indo");
        assert_eq!(page.episode_refs[1].date, "16 Apr");
    }

    #[test]
    fn test_status_defaults_to_completed() {
        let html = r#"<div class="jdlrx"><h1>X</h1></div>
            <div class="fotoanime"><div class="infozingle">
            <p>Status: Completed</p></div></div>"#;
        let page = extract_detail(html, "x", BASE);
        assert_eq!(page.anime.status, AnimeStatus::Completed);
    }

    #[test]
    fn test_genre_names_from_detail_text() {
        assert_eq!(
            genre_names("Judul: X\nGenre: Action, Comedy , Slice of Life\nStatus: Ongoing"),
            vec!["Action", "Comedy", "Slice of Life"]
        );
        assert!(genre_names("Judul: X\nStatus: Ongoing").is_empty());
        assert!(genre_names("Genre: ,").is_empty());
    }
}
