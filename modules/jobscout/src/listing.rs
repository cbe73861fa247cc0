use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::sources::{NavigationMode, SiteAdapter};
use crate::traits::{ElementHandle, RenderSession};

/// One posting found on a listing page, not yet fetched.
/// Consumed exactly once by the detail fetcher.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub title: String,
    pub nav: NavigationRef,
}

/// How to reach the candidate's detail view. Click-through candidates
/// carry the listing link element itself.
#[derive(Debug, Clone)]
pub enum NavigationRef {
    Click(ElementHandle),
    Direct(String),
}

/// Extract up to `limit` candidates from a site's listing page.
///
/// Items whose title or link selector fails to match are dropped without
/// aborting the batch; partial results are acceptable.
pub async fn extract(
    session: &mut dyn RenderSession,
    adapter: &SiteAdapter,
    limit: usize,
    settle: Duration,
) -> Result<Vec<Candidate>> {
    session
        .load(adapter.listing_url)
        .await
        .context("Failed to load listing page")?;
    // Client-side rendering needs time to finish before the DOM is queried.
    tokio::time::sleep(settle).await;

    let items = session
        .query_all(adapter.list_item_selector)
        .await
        .with_context(|| format!("Listing query failed for {}", adapter.source_id))?;
    info!(
        source = adapter.source_id,
        found = items.len(),
        limit,
        "Listing items found"
    );

    let mut candidates = Vec::new();
    for item in items.into_iter().take(limit) {
        match extract_item(session, adapter, item).await {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => {
                debug!(source = adapter.source_id, error = %e, "Skipping listing item");
            }
        }
    }

    Ok(candidates)
}

async fn extract_item(
    session: &mut dyn RenderSession,
    adapter: &SiteAdapter,
    item: ElementHandle,
) -> Result<Candidate> {
    let title_el = session.query_within(item, adapter.title_selector).await?;
    let title = session.text(title_el).await?;
    let link = session
        .query_within(item, adapter.detail_link_selector)
        .await?;

    let nav = match adapter.navigation_mode {
        NavigationMode::ClickThrough => NavigationRef::Click(link),
        NavigationMode::DirectLink => {
            let href = session
                .attribute(link, "href")
                .await?
                .ok_or_else(|| anyhow::anyhow!("Link element has no href"))?;
            NavigationRef::Direct(resolve_href(adapter.listing_url, &href)?)
        }
    };

    Ok(Candidate { title, nav })
}

/// Resolve a possibly-relative href against the listing URL.
fn resolve_href(base: &str, href: &str) -> Result<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Ok(href.to_string());
    }
    let base = url::Url::parse(base).context("Invalid listing URL")?;
    Ok(base
        .join(href)
        .with_context(|| format!("Unresolvable href: {href}"))?
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_hrefs_pass_through() {
        let resolved =
            resolve_href("https://careers.example.com/list", "https://other.com/job/1").unwrap();
        assert_eq!(resolved, "https://other.com/job/1");
    }

    #[test]
    fn relative_hrefs_resolve_against_listing_url() {
        let resolved = resolve_href("https://careers.example.com/recruit/list", "/job/42").unwrap();
        assert_eq!(resolved, "https://careers.example.com/job/42");
    }

    #[test]
    fn garbage_base_is_an_error() {
        assert!(resolve_href("not a url", "/job/1").is_err());
    }
}
