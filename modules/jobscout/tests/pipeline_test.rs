// End-to-end pipeline tests over the mock seams: scripted sites behind
// MockSessionFactory, scripted model responses behind ScriptedModel.

use std::time::Duration;

use jobscout::scout::{Scout, SettleDelays};
use jobscout::sources::{NavigationMode, SourceRegistry};
use jobscout::testing::{test_adapter, MockSessionFactory, MockSite, MockWeb, ScriptedModel};

fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

fn scout(registry: SourceRegistry, factory: MockSessionFactory, model: ScriptedModel) -> Scout {
    Scout::new(registry, Box::new(factory), Box::new(model))
        .with_delays(SettleDelays::zero())
        .with_cooldown(Duration::from_millis(5))
}

#[tokio::test]
async fn postings_from_two_sites_are_ranked_descending() {
    let registry = SourceRegistry::new(vec![
        test_adapter("alpha", "https://alpha.example/jobs", NavigationMode::DirectLink),
        test_adapter("beta", "https://beta.example/jobs", NavigationMode::DirectLink),
    ]);
    let web = MockWeb::new()
        .site(
            MockSite::new("https://alpha.example/jobs")
                .direct_item("Systems Designer", "https://alpha.example/jobs/1", "alpha jd one"),
        )
        .site(
            MockSite::new("https://beta.example/jobs")
                .direct_item("Economy Designer", "https://beta.example/jobs/1", "beta jd one")
                .direct_item("Level Designer", "https://beta.example/jobs/2", "beta jd two"),
        );
    let factory = MockSessionFactory::new(web);
    let model = ScriptedModel::new()
        .respond("40\nMeh.")
        .respond("90\nGreat.")
        .respond("90\nAlso great.");

    let outcome = scout(registry, factory.clone(), model)
        .run(&ids(&["alpha", "beta"]), 5)
        .await;

    assert!(outcome.site_errors.is_empty());
    assert_eq!(outcome.stats.sites_completed, 2);
    assert_eq!(outcome.stats.postings_scored, 3);

    let entries = outcome.report.entries();
    let ranked: Vec<(&str, u32)> = entries
        .iter()
        .map(|e| (e.title.as_str(), e.score))
        .collect();
    // Stable sort: the two 90s keep collection order.
    assert_eq!(
        ranked,
        vec![
            ("Economy Designer", 90),
            ("Level Designer", 90),
            ("Systems Designer", 40),
        ]
    );
    assert_eq!(entries[0].source_id, "beta");

    // One session per site, all torn down.
    assert_eq!(factory.opened(), 2);
    assert_eq!(factory.closed(), 2);
}

#[tokio::test]
async fn per_site_limit_is_enforced() {
    let mut site = MockSite::new("https://big.example/jobs");
    for i in 0..50 {
        site = site.direct_item(
            &format!("Posting {i}"),
            &format!("https://big.example/jobs/{i}"),
            "jd text",
        );
    }
    let registry = SourceRegistry::new(vec![test_adapter(
        "big",
        "https://big.example/jobs",
        NavigationMode::DirectLink,
    )]);
    let factory = MockSessionFactory::new(MockWeb::new().site(site));

    let outcome = scout(registry, factory, ScriptedModel::new())
        .run(&ids(&["big"]), 2)
        .await;

    assert_eq!(outcome.stats.candidates_found, 2);
    assert_eq!(outcome.report.len(), 2);
}

#[tokio::test]
async fn one_blocked_site_does_not_abort_the_others() {
    let registry = SourceRegistry::new(vec![
        test_adapter("blocked", "https://blocked.example/jobs", NavigationMode::DirectLink),
        test_adapter("open", "https://open.example/jobs", NavigationMode::DirectLink),
    ]);
    let web = MockWeb::new()
        .fail_url("https://blocked.example/jobs")
        .site(
            MockSite::new("https://open.example/jobs")
                .direct_item("Live Posting", "https://open.example/jobs/1", "jd"),
        );
    let factory = MockSessionFactory::new(web);

    let outcome = scout(registry, factory.clone(), ScriptedModel::new().respond("70\nFine."))
        .run(&ids(&["blocked", "open"]), 3)
        .await;

    assert_eq!(outcome.stats.sites_failed, 1);
    assert_eq!(outcome.stats.sites_completed, 1);
    assert_eq!(outcome.site_errors.len(), 1);
    assert_eq!(outcome.site_errors[0].source_id, "blocked");
    assert_eq!(outcome.report.len(), 1);
    assert_eq!(outcome.report.entries()[0].title, "Live Posting");

    // The blocked site's session is still torn down.
    assert_eq!(factory.opened(), 2);
    assert_eq!(factory.closed(), 2);
}

#[tokio::test]
async fn click_through_candidates_are_fetched_and_stale_ones_skipped() {
    let registry = SourceRegistry::new(vec![test_adapter(
        "clicky",
        "https://clicky.example/jobs",
        NavigationMode::ClickThrough,
    )]);
    let web = MockWeb::new().site(
        MockSite::new("https://clicky.example/jobs")
            .click_item("Reachable", "click-through jd")
            .stale_click_item("Gone Stale"),
    );
    let factory = MockSessionFactory::new(web);

    let outcome = scout(registry, factory, ScriptedModel::new().respond("65\nOk."))
        .run(&ids(&["clicky"]), 5)
        .await;

    assert_eq!(outcome.stats.candidates_found, 2);
    assert_eq!(outcome.stats.postings_scored, 1);
    assert_eq!(outcome.stats.postings_skipped, 1);
    assert_eq!(outcome.report.entries()[0].title, "Reachable");
}

#[tokio::test]
async fn items_missing_a_title_are_dropped_silently() {
    let registry = SourceRegistry::new(vec![test_adapter(
        "partial",
        "https://partial.example/jobs",
        NavigationMode::DirectLink,
    )]);
    let web = MockWeb::new().site(
        MockSite::new("https://partial.example/jobs")
            .untitled_item("https://partial.example/jobs/0", "jd zero")
            .direct_item("Titled", "https://partial.example/jobs/1", "jd one"),
    );
    let factory = MockSessionFactory::new(web);

    let outcome = scout(registry, factory, ScriptedModel::new())
        .run(&ids(&["partial"]), 5)
        .await;

    assert!(outcome.site_errors.is_empty());
    assert_eq!(outcome.stats.candidates_found, 1);
    assert_eq!(outcome.report.entries()[0].title, "Titled");
}

#[tokio::test]
async fn unknown_source_is_a_site_error_and_the_run_continues() {
    let registry = SourceRegistry::new(vec![test_adapter(
        "known",
        "https://known.example/jobs",
        NavigationMode::DirectLink,
    )]);
    let web = MockWeb::new().site(
        MockSite::new("https://known.example/jobs")
            .direct_item("Posting", "https://known.example/jobs/1", "jd"),
    );
    let factory = MockSessionFactory::new(web);

    let outcome = scout(registry, factory.clone(), ScriptedModel::new())
        .run(&ids(&["mystery", "known"]), 2)
        .await;

    assert_eq!(outcome.site_errors.len(), 1);
    assert!(outcome.site_errors[0].message.contains("unknown source"));
    assert_eq!(outcome.report.len(), 1);
    // No session was ever opened for the unknown source.
    assert_eq!(factory.opened(), 1);
}

#[tokio::test]
async fn rate_limited_model_delays_but_loses_nothing() {
    let registry = SourceRegistry::new(vec![test_adapter(
        "slow",
        "https://slow.example/jobs",
        NavigationMode::DirectLink,
    )]);
    let web = MockWeb::new().site(
        MockSite::new("https://slow.example/jobs")
            .direct_item("Patient Posting", "https://slow.example/jobs/1", "jd"),
    );
    let factory = MockSessionFactory::new(web);
    let model = ScriptedModel::new()
        .rate_limited()
        .rate_limited()
        .respond("81\nWorth the wait.");

    let outcome = scout(registry, factory, model)
        .run(&ids(&["slow"]), 1)
        .await;

    assert!(outcome.site_errors.is_empty());
    assert_eq!(outcome.report.len(), 1);
    assert_eq!(outcome.report.entries()[0].score, 81);
}

#[tokio::test]
async fn scoring_failure_fails_the_site_but_still_tears_down() {
    let registry = SourceRegistry::new(vec![
        test_adapter("broken", "https://broken.example/jobs", NavigationMode::DirectLink),
        test_adapter("fine", "https://fine.example/jobs", NavigationMode::DirectLink),
    ]);
    let web = MockWeb::new()
        .site(
            MockSite::new("https://broken.example/jobs")
                .direct_item("Unscorable", "https://broken.example/jobs/1", "jd"),
        )
        .site(
            MockSite::new("https://fine.example/jobs")
                .direct_item("Scorable", "https://fine.example/jobs/1", "jd"),
        );
    let factory = MockSessionFactory::new(web);
    let model = ScriptedModel::new()
        .fail("model exploded")
        .respond("55\nFine.");

    let outcome = scout(registry, factory.clone(), model)
        .run(&ids(&["broken", "fine"]), 1)
        .await;

    assert_eq!(outcome.stats.sites_failed, 1);
    assert_eq!(outcome.site_errors[0].source_id, "broken");
    assert_eq!(outcome.report.len(), 1);
    assert_eq!(outcome.report.entries()[0].title, "Scorable");
    assert_eq!(factory.opened(), 2);
    assert_eq!(factory.closed(), 2);
}

#[tokio::test]
async fn session_launch_failure_is_contained_to_the_site() {
    let registry = SourceRegistry::new(vec![test_adapter(
        "nowhere",
        "https://nowhere.example/jobs",
        NavigationMode::DirectLink,
    )]);
    let factory = MockSessionFactory::failing();

    let outcome = scout(registry, factory, ScriptedModel::new())
        .run(&ids(&["nowhere"]), 1)
        .await;

    assert_eq!(outcome.stats.sites_failed, 1);
    assert!(outcome.report.is_empty());
}

#[tokio::test]
async fn empty_selection_produces_an_empty_report() {
    let registry = SourceRegistry::builtin();
    let factory = MockSessionFactory::new(MockWeb::new());

    let outcome = scout(registry, factory.clone(), ScriptedModel::new())
        .run(&[], 2)
        .await;

    assert!(outcome.report.is_empty());
    assert_eq!(outcome.report.len(), 0);
    assert!(outcome.site_errors.is_empty());
    assert_eq!(factory.opened(), 0);
}
