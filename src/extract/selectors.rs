use scraper::Selector;
use std::sync::OnceLock;

/// Pre-parsed CSS selectors for the upstream's page templates, built once
/// and shared process-wide.
pub struct SelectorSet {
    // Listing pages (.rapi grid)
    pub listing_item: Selector,
    pub listing_title: Selector,
    pub listing_thumb_anchor: Selector,
    pub episode_count: Selector,
    pub updated_on: Selector,
    pub rating_label: Selector,

    // Detail pages
    pub detail_info: Selector,
    pub detail_title: Selector,
    pub synopsis_paragraph: Selector,
    pub info_paragraph: Selector,
    pub episode_list_item: Selector,
    pub episode_anchor: Selector,
    pub episode_date: Selector,

    // Episode pages
    pub episode_title: Selector,
    pub stream_iframe: Selector,
    pub download_tier_list: Selector,
    pub boxed_download: Selector,
    pub boxed_title: Selector,
    pub boxed_item: Selector,
    pub dark_boxed_download: Selector,
    pub dark_boxed_title: Selector,
    pub dark_boxed_item: Selector,

    // Batch pages
    pub batch_title: Selector,
    pub batch_tier_list: Selector,

    // Genre index
    pub genre_anchor: Selector,

    // Shared
    pub pagination: Selector,
    pub anchor: Selector,
    pub image: Selector,
    pub list_item: Selector,
    pub quality_label: Selector,
    pub size_label: Selector,
}

impl SelectorSet {
    pub fn get() -> &'static Self {
        static SET: OnceLock<SelectorSet> = OnceLock::new();
        SET.get_or_init(|| Self {
            listing_item: sel(".rapi ul > li"),
            listing_title: sel("h2"),
            listing_thumb_anchor: sel(".thumb > a"),
            episode_count: sel(".epz"),
            updated_on: sel(".newnime"),
            rating_label: sel(".epztipe"),

            detail_info: sel(".fotoanime"),
            detail_title: sel(".jdlrx > h1"),
            synopsis_paragraph: sel(".sinopc > p"),
            info_paragraph: sel(".infozingle > p"),
            episode_list_item: sel(".episodelist li"),
            episode_anchor: sel("span > a"),
            episode_date: sel(".zeebr"),

            episode_title: sel(".venutama > h1"),
            stream_iframe: sel("#lightsVideo #embed_holder .responsive-embed-stream > iframe"),
            download_tier_list: sel(".download ul"),
            boxed_download: sel(".download .anime-box"),
            boxed_title: sel(".anime-title"),
            boxed_item: sel(".anime-item"),
            dark_boxed_download: sel(".download .yondarkness-box"),
            dark_boxed_title: sel(".yondarkness-title"),
            dark_boxed_item: sel(".yondarkness-item"),

            batch_title: sel(".batchlink > h4"),
            batch_tier_list: sel(".batchlink ul"),

            genre_anchor: sel(".genres a"),

            pagination: sel(".pagination"),
            anchor: sel("a"),
            image: sel("img"),
            list_item: sel("li"),
            quality_label: sel("strong"),
            size_label: sel("i"),
        })
    }
}

fn sel(source: &str) -> Selector {
    Selector::parse(source).expect("Invalid selector defined in code")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_set_builds() {
        // Forces every selector through the parser.
        let _ = SelectorSet::get();
    }
}
