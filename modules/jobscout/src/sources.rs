use jobscout_common::JobScoutError;

/// How a source's detail pages are reached from its listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    /// Detail content renders in-page after clicking the listing link;
    /// there is no distinct URL to load.
    ClickThrough,
    /// The listing link carries an href to load directly.
    DirectLink,
}

/// Navigation and extraction configuration for one career site.
/// Defined once per source, read-only after registry construction.
#[derive(Debug, Clone)]
pub struct SiteAdapter {
    pub source_id: &'static str,
    pub listing_url: &'static str,
    pub list_item_selector: &'static str,
    pub title_selector: &'static str,
    pub detail_link_selector: &'static str,
    pub navigation_mode: NavigationMode,
}

/// Immutable source_id → SiteAdapter table, built once at startup and
/// passed to the components that need it.
pub struct SourceRegistry {
    adapters: Vec<SiteAdapter>,
}

impl SourceRegistry {
    pub fn new(adapters: Vec<SiteAdapter>) -> Self {
        Self { adapters }
    }

    /// Registry of the supported career sites.
    pub fn builtin() -> Self {
        Self::new(vec![
            SiteAdapter {
                source_id: "nexon",
                listing_url: "https://careers.nexon.com/recruit?jobCategories=3",
                list_item_selector: "ul.notice-list > li",
                title_selector: "h4",
                detail_link_selector: "a",
                navigation_mode: NavigationMode::DirectLink,
            },
            SiteAdapter {
                source_id: "krafton",
                listing_url: "https://www.krafton.com/careers/jobs/?search_department=GameDesign",
                list_item_selector: "li.RecruitList-item",
                title_selector: "h3.RecruitItemTitle-title",
                detail_link_selector: "a.RecruitItemTitle-link",
                navigation_mode: NavigationMode::DirectLink,
            },
            // NCSoft renders detail content client-side; the listing link
            // must be clicked rather than followed.
            SiteAdapter {
                source_id: "ncsoft",
                listing_url: "https://careers.ncsoft.com/recruit/list",
                list_item_selector: "div.applyListWrap li",
                title_selector: "p.subject",
                detail_link_selector: "a.applyDetailBtn",
                navigation_mode: NavigationMode::ClickThrough,
            },
            SiteAdapter {
                source_id: "smilegate",
                listing_url: "https://careers.smilegate.com/apply/announce/list",
                list_item_selector: "ul.list > li",
                title_selector: "span.txt_notice",
                detail_link_selector: "a",
                navigation_mode: NavigationMode::DirectLink,
            },
        ])
    }

    pub fn lookup(&self, source_id: &str) -> Result<&SiteAdapter, JobScoutError> {
        self.adapters
            .iter()
            .find(|a| a.source_id == source_id)
            .ok_or_else(|| JobScoutError::UnknownSource(source_id.to_string()))
    }

    /// Every registered source id, in registration order.
    pub fn source_ids(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.source_id).collect()
    }
}
