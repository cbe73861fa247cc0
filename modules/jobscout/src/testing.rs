// Test mocks for the scout pipeline.
//
// Three mocks matching the three trait boundaries:
// - MockSession (RenderSession) — scripted listing/detail pages
// - MockSessionFactory (SessionFactory) — counts opens and teardowns
// - ScriptedModel (TextModel) — queued responses, rate limits, failures
//
// Plus helpers for constructing test SiteAdapters against the mock
// selectors. No browser, no network.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::sources::{NavigationMode, SiteAdapter};
use crate::traits::{ElementHandle, ModelError, RenderSession, SessionFactory, TextModel};

/// Selectors every mock site answers to. Test adapters must use the same.
pub const TEST_ITEM_SELECTOR: &str = "li.posting";
pub const TEST_TITLE_SELECTOR: &str = "h4";
pub const TEST_LINK_SELECTOR: &str = "a";

/// A SiteAdapter wired to the mock selectors.
pub fn test_adapter(
    source_id: &'static str,
    listing_url: &'static str,
    navigation_mode: NavigationMode,
) -> SiteAdapter {
    SiteAdapter {
        source_id,
        listing_url,
        list_item_selector: TEST_ITEM_SELECTOR,
        title_selector: TEST_TITLE_SELECTOR,
        detail_link_selector: TEST_LINK_SELECTOR,
        navigation_mode,
    }
}

// ---------------------------------------------------------------------------
// MockWeb — scripted sites served by MockSession
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MockItem {
    /// `None` stages a per-item title-selector miss.
    pub title: Option<String>,
    /// Direct-link target; also registered as a loadable page.
    pub href: Option<String>,
    /// Whether the link element exists and can be clicked.
    pub clickable: bool,
    /// Click on this item's link fails (stale handle after a re-render).
    pub click_fails: bool,
    pub detail_text: String,
}

#[derive(Debug, Clone)]
pub struct MockSite {
    pub listing_url: String,
    pub items: Vec<MockItem>,
}

impl MockSite {
    pub fn new(listing_url: &str) -> Self {
        Self {
            listing_url: listing_url.to_string(),
            items: Vec::new(),
        }
    }

    /// An item whose link carries an href.
    pub fn direct_item(mut self, title: &str, href: &str, detail_text: &str) -> Self {
        self.items.push(MockItem {
            title: Some(title.to_string()),
            href: Some(href.to_string()),
            clickable: false,
            click_fails: false,
            detail_text: detail_text.to_string(),
        });
        self
    }

    /// An item reached by clicking its link element.
    pub fn click_item(mut self, title: &str, detail_text: &str) -> Self {
        self.items.push(MockItem {
            title: Some(title.to_string()),
            href: None,
            clickable: true,
            click_fails: false,
            detail_text: detail_text.to_string(),
        });
        self
    }

    /// A click-through item whose stored handle has gone stale.
    pub fn stale_click_item(mut self, title: &str) -> Self {
        self.items.push(MockItem {
            title: Some(title.to_string()),
            href: None,
            clickable: true,
            click_fails: true,
            detail_text: String::new(),
        });
        self
    }

    /// An item whose title selector finds nothing.
    pub fn untitled_item(mut self, href: &str, detail_text: &str) -> Self {
        self.items.push(MockItem {
            title: None,
            href: Some(href.to_string()),
            clickable: false,
            click_fails: false,
            detail_text: detail_text.to_string(),
        });
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockWeb {
    sites: Vec<MockSite>,
    fail_urls: HashSet<String>,
}

impl MockWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn site(mut self, site: MockSite) -> Self {
        self.sites.push(site);
        self
    }

    /// Loading this URL errors, as a blocked or unreachable site would.
    pub fn fail_url(mut self, url: &str) -> Self {
        self.fail_urls.insert(url.to_string());
        self
    }
}

// ---------------------------------------------------------------------------
// MockSession
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum MockElement {
    /// (site index, item index)
    Item(usize, usize),
    Title(usize, usize),
    Link(usize, usize),
}

pub struct MockSession {
    web: MockWeb,
    current_site: Option<usize>,
    page_text: String,
    elements: Vec<MockElement>,
    closes: Arc<AtomicUsize>,
}

impl MockSession {
    fn new(web: MockWeb, closes: Arc<AtomicUsize>) -> Self {
        Self {
            web,
            current_site: None,
            page_text: String::new(),
            elements: Vec::new(),
            closes,
        }
    }

    fn store(&mut self, element: MockElement) -> ElementHandle {
        self.elements.push(element);
        ElementHandle(self.elements.len() as u64 - 1)
    }

    fn element(&self, handle: ElementHandle) -> Result<MockElement> {
        self.elements
            .get(handle.0 as usize)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("MockSession: unknown handle {}", handle.0))
    }

    fn item(&self, site: usize, item: usize) -> &MockItem {
        &self.web.sites[site].items[item]
    }
}

#[async_trait]
impl RenderSession for MockSession {
    async fn load(&mut self, url: &str) -> Result<()> {
        if self.web.fail_urls.contains(url) {
            bail!("MockSession: load of {url} is scripted to fail");
        }
        if let Some(idx) = self.web.sites.iter().position(|s| s.listing_url == url) {
            self.current_site = Some(idx);
            self.page_text = format!("listing page of {url}");
            return Ok(());
        }
        for site in &self.web.sites {
            if let Some(item) = site.items.iter().find(|i| i.href.as_deref() == Some(url)) {
                self.page_text = item.detail_text.clone();
                return Ok(());
            }
        }
        bail!("MockSession: no page registered for {url}");
    }

    async fn query_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>> {
        let Some(site) = self.current_site else {
            bail!("MockSession: query before any listing load");
        };
        if selector != TEST_ITEM_SELECTOR {
            return Ok(Vec::new());
        }
        let count = self.web.sites[site].items.len();
        let handles = (0..count)
            .map(|i| self.store(MockElement::Item(site, i)))
            .collect();
        Ok(handles)
    }

    async fn query_within(
        &mut self,
        parent: ElementHandle,
        selector: &str,
    ) -> Result<ElementHandle> {
        let MockElement::Item(site, idx) = self.element(parent)? else {
            bail!("MockSession: scoped query on a non-item handle");
        };
        let item = self.item(site, idx);
        let has_title = item.title.is_some();
        let has_link = item.href.is_some() || item.clickable;
        match selector {
            TEST_TITLE_SELECTOR if has_title => Ok(self.store(MockElement::Title(site, idx))),
            TEST_LINK_SELECTOR if has_link => Ok(self.store(MockElement::Link(site, idx))),
            _ => bail!("MockSession: no element matching {selector} in item {idx}"),
        }
    }

    async fn text(&mut self, handle: ElementHandle) -> Result<String> {
        match self.element(handle)? {
            MockElement::Title(site, idx) => Ok(self
                .item(site, idx)
                .title
                .clone()
                .unwrap_or_default()),
            _ => bail!("MockSession: no text scripted for this handle"),
        }
    }

    async fn attribute(&mut self, handle: ElementHandle, name: &str) -> Result<Option<String>> {
        match (self.element(handle)?, name) {
            (MockElement::Link(site, idx), "href") => Ok(self.item(site, idx).href.clone()),
            _ => Ok(None),
        }
    }

    async fn click(&mut self, handle: ElementHandle) -> Result<()> {
        let MockElement::Link(site, idx) = self.element(handle)? else {
            bail!("MockSession: click on a non-link handle");
        };
        let item = self.item(site, idx);
        let (click_fails, clickable, detail) =
            (item.click_fails, item.clickable, item.detail_text.clone());
        if click_fails {
            bail!("MockSession: stale element reference");
        }
        if !clickable {
            bail!("MockSession: element is not clickable");
        }
        self.page_text = detail;
        Ok(())
    }

    async fn go_back(&mut self) -> Result<()> {
        let Some(site) = self.current_site else {
            bail!("MockSession: back navigation with no history");
        };
        self.page_text = format!("listing page of {}", self.web.sites[site].listing_url);
        Ok(())
    }

    async fn page_text(&mut self) -> Result<String> {
        Ok(self.page_text.clone())
    }

    async fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockSessionFactory
// ---------------------------------------------------------------------------

/// Hands out MockSessions over a shared scripted web and counts how many
/// sessions were opened and torn down.
#[derive(Clone)]
pub struct MockSessionFactory {
    web: MockWeb,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    fail_open: bool,
}

impl MockSessionFactory {
    pub fn new(web: MockWeb) -> Self {
        Self {
            web,
            opens: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            fail_open: false,
        }
    }

    /// Every open fails, as a broken browser install would.
    pub fn failing() -> Self {
        let mut factory = Self::new(MockWeb::new());
        factory.fail_open = true;
        factory
    }

    pub fn opened(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    async fn open(&self) -> Result<Box<dyn RenderSession>> {
        if self.fail_open {
            bail!("MockSessionFactory: open is scripted to fail");
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession::new(
            self.web.clone(),
            self.closes.clone(),
        )))
    }
}

// ---------------------------------------------------------------------------
// ScriptedModel
// ---------------------------------------------------------------------------

enum ScriptedResponse {
    Text(String),
    RateLimited,
    Fail(String),
}

/// Queued model responses; once the queue is drained every call gets the
/// default response. Call count is observable after the model is boxed.
pub struct ScriptedModel {
    script: Mutex<VecDeque<ScriptedResponse>>,
    default: String,
    calls: Arc<AtomicUsize>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default: "50\nScripted default analysis.".to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn respond(self, text: &str) -> Self {
        self.push(ScriptedResponse::Text(text.to_string()))
    }

    pub fn rate_limited(self) -> Self {
        self.push(ScriptedResponse::RateLimited)
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(ScriptedResponse::Fail(message.to_string()))
    }

    pub fn with_default(mut self, text: &str) -> Self {
        self.default = text.to_string();
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    fn push(self, response: ScriptedResponse) -> Self {
        self.script.lock().unwrap().push_back(response);
        self
    }
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextModel for ScriptedModel {
    async fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(ScriptedResponse::Text(text)) => Ok(text),
            Some(ScriptedResponse::RateLimited) => Err(ModelError::RateLimited),
            Some(ScriptedResponse::Fail(message)) => Err(ModelError::Other(message)),
            None => Ok(self.default.clone()),
        }
    }
}
