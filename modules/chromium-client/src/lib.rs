pub mod error;

pub use error::{ChromiumError, Result};

use std::collections::HashMap;

use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Desktop Chrome user-agent. Career sites block obvious headless agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Opaque id for an element held by the session. Handles stay valid until
/// the page they were queried from re-renders; operations on a stale
/// handle fail and the caller decides what to skip.
pub type ElementId = u64;

/// One headless Chromium instance with a single page. Launched per site,
/// torn down with [`close`](ChromiumSession::close) when the site is done.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    dialog_task: JoinHandle<()>,
    elements: HashMap<ElementId, Element>,
    next_id: ElementId,
}

impl ChromiumSession {
    /// Launch a sandboxless headless browser and open a blank page with a
    /// desktop user-agent. JavaScript dialogs (login prompts, bot
    /// interstitials) are accepted automatically so navigation can continue.
    pub async fn launch() -> Result<Self> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .build()
            .map_err(ChromiumError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ChromiumError::Launch(e.to_string()))?;

        // Drive browser events until the connection drops.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ChromiumError::Browser(e.to_string()))?;

        page.set_user_agent(USER_AGENT)
            .await
            .map_err(|e| ChromiumError::Browser(e.to_string()))?;

        let mut dialogs = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| ChromiumError::Browser(e.to_string()))?;
        let dialog_page = page.clone();
        let dialog_task = tokio::spawn(async move {
            while let Some(dialog) = dialogs.next().await {
                debug!(message = %dialog.message, "Dismissing unexpected dialog");
                if let Ok(params) = HandleJavaScriptDialogParams::builder().accept(true).build() {
                    let _ = dialog_page.execute(params).await;
                }
            }
        });

        info!("Chromium session launched");

        Ok(Self {
            browser,
            page,
            handler_task,
            dialog_task,
            elements: HashMap::new(),
            next_id: 0,
        })
    }

    fn store(&mut self, element: Element) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        self.elements.insert(id, element);
        id
    }

    fn element(&self, id: ElementId) -> Result<&Element> {
        self.elements.get(&id).ok_or(ChromiumError::UnknownHandle(id))
    }

    /// Navigate the page to `url`.
    pub async fn load(&mut self, url: &str) -> Result<()> {
        debug!(url, "Loading page");
        self.page
            .goto(url)
            .await
            .map_err(|e| ChromiumError::Navigation(e.to_string()))?;
        Ok(())
    }

    /// All elements matching a CSS selector on the current page.
    pub async fn query_all(&mut self, selector: &str) -> Result<Vec<ElementId>> {
        let found = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| ChromiumError::Element(e.to_string()))?;
        Ok(found.into_iter().map(|el| self.store(el)).collect())
    }

    /// First element matching a CSS selector inside `parent`.
    /// Fails when nothing matches.
    pub async fn query_within(&mut self, parent: ElementId, selector: &str) -> Result<ElementId> {
        let found = self
            .element(parent)?
            .find_element(selector)
            .await
            .map_err(|e| ChromiumError::Element(e.to_string()))?;
        Ok(self.store(found))
    }

    /// Visible text of an element.
    pub async fn text(&self, id: ElementId) -> Result<String> {
        let text = self
            .element(id)?
            .inner_text()
            .await
            .map_err(|e| ChromiumError::Element(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }

    /// Attribute value of an element, `None` when the attribute is absent.
    pub async fn attribute(&self, id: ElementId, name: &str) -> Result<Option<String>> {
        self.element(id)?
            .attribute(name)
            .await
            .map_err(|e| ChromiumError::Element(e.to_string()))
    }

    /// Click an element. Fails on stale handles, e.g. after the listing
    /// re-rendered behind a back-navigation.
    pub async fn click(&self, id: ElementId) -> Result<()> {
        self.element(id)?
            .click()
            .await
            .map_err(|e| ChromiumError::Element(e.to_string()))?;
        Ok(())
    }

    /// Navigate one entry back in session history.
    pub async fn go_back(&mut self) -> Result<()> {
        self.page
            .evaluate("history.back()")
            .await
            .map_err(|e| ChromiumError::Navigation(e.to_string()))?;
        Ok(())
    }

    /// Visible text of the whole current page.
    pub async fn page_text(&mut self) -> Result<String> {
        let body = self
            .page
            .find_element("body")
            .await
            .map_err(|e| ChromiumError::Element(e.to_string()))?;
        let text = body
            .inner_text()
            .await
            .map_err(|e| ChromiumError::Element(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }

    /// Tear down the browser. Must be called even when the site's
    /// processing failed; a leaked session is a leaked Chromium process.
    pub async fn close(&mut self) -> Result<()> {
        self.dialog_task.abort();
        self.elements.clear();
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Browser close failed");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        info!("Chromium session closed");
        Ok(())
    }
}
