// Trait abstractions for the pipeline's two external collaborators.
//
// RenderSession — one browser session: navigation, DOM queries, clicks.
// SessionFactory — opens a fresh session per site so teardown is scoped.
// TextModel — prompt in, text out, with a distinguishable rate-limit error.
//
// These enable deterministic testing with MockSession and ScriptedModel:
// no browser, no network. `cargo test` in seconds.

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// RenderSession
// ---------------------------------------------------------------------------

/// Opaque handle to an element on the session's current page. Handles can
/// go stale when the page re-renders; operations on a stale handle fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

#[async_trait]
pub trait RenderSession: Send {
    /// Navigate to a URL.
    async fn load(&mut self, url: &str) -> Result<()>;

    /// All elements matching a CSS selector on the current page.
    async fn query_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>>;

    /// First element matching a CSS selector inside `parent`.
    /// Fails when nothing matches.
    async fn query_within(&mut self, parent: ElementHandle, selector: &str)
        -> Result<ElementHandle>;

    /// Visible text of an element.
    async fn text(&mut self, handle: ElementHandle) -> Result<String>;

    /// Attribute value of an element, `None` when absent.
    async fn attribute(&mut self, handle: ElementHandle, name: &str) -> Result<Option<String>>;

    /// Click an element.
    async fn click(&mut self, handle: ElementHandle) -> Result<()>;

    /// Navigate one entry back in session history.
    async fn go_back(&mut self) -> Result<()>;

    /// Visible text of the whole current page.
    async fn page_text(&mut self) -> Result<String>;

    /// Tear the session down. Called unconditionally once per session,
    /// error paths included.
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
impl RenderSession for chromium_client::ChromiumSession {
    async fn load(&mut self, url: &str) -> Result<()> {
        Ok(chromium_client::ChromiumSession::load(self, url).await?)
    }

    async fn query_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>> {
        let ids = chromium_client::ChromiumSession::query_all(self, selector).await?;
        Ok(ids.into_iter().map(ElementHandle).collect())
    }

    async fn query_within(
        &mut self,
        parent: ElementHandle,
        selector: &str,
    ) -> Result<ElementHandle> {
        let id = chromium_client::ChromiumSession::query_within(self, parent.0, selector).await?;
        Ok(ElementHandle(id))
    }

    async fn text(&mut self, handle: ElementHandle) -> Result<String> {
        Ok(chromium_client::ChromiumSession::text(self, handle.0).await?)
    }

    async fn attribute(&mut self, handle: ElementHandle, name: &str) -> Result<Option<String>> {
        Ok(chromium_client::ChromiumSession::attribute(self, handle.0, name).await?)
    }

    async fn click(&mut self, handle: ElementHandle) -> Result<()> {
        Ok(chromium_client::ChromiumSession::click(self, handle.0).await?)
    }

    async fn go_back(&mut self) -> Result<()> {
        Ok(chromium_client::ChromiumSession::go_back(self).await?)
    }

    async fn page_text(&mut self) -> Result<String> {
        Ok(chromium_client::ChromiumSession::page_text(self).await?)
    }

    async fn close(&mut self) -> Result<()> {
        Ok(chromium_client::ChromiumSession::close(self).await?)
    }
}

// ---------------------------------------------------------------------------
// SessionFactory
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open a fresh, isolated session. One per site.
    async fn open(&self) -> Result<Box<dyn RenderSession>>;
}

/// Launches one headless Chromium per site.
pub struct ChromiumFactory;

#[async_trait]
impl SessionFactory for ChromiumFactory {
    async fn open(&self) -> Result<Box<dyn RenderSession>> {
        Ok(Box::new(chromium_client::ChromiumSession::launch().await?))
    }
}

// ---------------------------------------------------------------------------
// TextModel
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ModelError {
    /// The model asked us to slow down. The scorer retries after a cooldown.
    #[error("model rate-limited")]
    RateLimited,

    #[error("model request failed: {0}")]
    Other(String),
}

#[async_trait]
pub trait TextModel: Send + Sync {
    /// Submit a prompt, return the model's text response.
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

#[async_trait]
impl TextModel for gemini_client::GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        gemini_client::GeminiClient::generate(self, prompt)
            .await
            .map_err(|e| match e {
                gemini_client::GeminiError::RateLimited => ModelError::RateLimited,
                other => ModelError::Other(other.to_string()),
            })
    }
}
