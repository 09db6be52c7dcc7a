use super::*;
use pricedrop_watcher::core::database::ProductStore;
use rust_decimal::Decimal;

#[tokio::test]
async fn test_refresh_detects_drop_and_merges() -> anyhow::Result<()> {
    let harness = TestHarness::new().await?;
    let url = harness.listing_url("LAPTOP");

    harness.serve_listing("LAPTOP", "Gaming Laptop", "1,299.99", None).await;
    harness.manager.add_product(&url).await?;

    harness.reset_listings().await;
    harness.serve_listing("LAPTOP", "Gaming Laptop", "999.99", Some("800.00")).await;
    let report = harness.manager.refresh_all().await?;

    assert_eq!(report.checked, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.notified, 1);
    assert!(report.failures.is_empty());

    let alerts = harness.sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].url, url);
    assert!(alerts[0].is_lower_price);
    assert!(alerts[0].is_lower_alt);
    assert_eq!(
        alerts[0].message("$"),
        "Gaming Laptop has a new lower price!\nNew Price: $99,999.00\nNew Used Price: $80,000.00"
    );

    let stored = harness.store.get(&url).await?.unwrap();
    assert_eq!(stored.current_price, Decimal::from(99999));
    assert_eq!(stored.lowest_price, Decimal::from(99999));
    assert_eq!(stored.highest_price, Decimal::from(129999));
    // The scraped used price only drives the alert, it is never stored by a refresh
    assert_eq!(stored.alt_price, Decimal::ZERO);
    Ok(())
}

#[tokio::test]
async fn test_refresh_price_rise_is_silent() -> anyhow::Result<()> {
    let harness = TestHarness::new().await?;
    let url = harness.listing_url("CHAIR");

    harness.serve_listing("CHAIR", "Office Chair", "150", None).await;
    harness.manager.add_product(&url).await?;

    harness.reset_listings().await;
    harness.serve_listing("CHAIR", "Office Chair (2026)", "175", None).await;
    let report = harness.manager.refresh_all().await?;

    assert_eq!(report.notified, 0);
    assert!(harness.sink.alerts().is_empty());

    let stored = harness.store.get(&url).await?.unwrap();
    assert_eq!(stored.title, "Office Chair (2026)");
    assert_eq!(stored.current_price, Decimal::from(175));
    assert_eq!(stored.lowest_price, Decimal::from(150));
    assert_eq!(stored.highest_price, Decimal::from(175));
    Ok(())
}

#[tokio::test]
async fn test_refresh_isolates_failing_listings() -> anyhow::Result<()> {
    let harness = TestHarness::new().await?;
    let ok_url = harness.listing_url("A-OK");
    let gone_url = harness.listing_url("B-GONE");
    let broken_url = harness.listing_url("C-BROKEN");

    harness.serve_listing("A-OK", "Desk Lamp", "45", None).await;
    harness.serve_listing("B-GONE", "Monitor", "300", None).await;
    harness.serve_listing("C-BROKEN", "Keyboard", "90", None).await;
    for url in [&ok_url, &gone_url, &broken_url] {
        harness.manager.add_product(url).await?;
    }

    harness.reset_listings().await;
    harness.serve_listing("A-OK", "Desk Lamp", "40", None).await;
    harness.serve_status("B-GONE", 404).await;
    Mock::given(method("GET"))
        .and(path("/dp/C-BROKEN"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Robot check</body></html>"))
        .mount(&harness.server)
        .await;

    let report = harness.manager.refresh_all().await?;

    assert_eq!(report.checked, 3);
    assert_eq!(report.updated, 1);
    assert_eq!(report.notified, 1);
    let failed: Vec<&str> = report.failures.iter().map(|f| f.url.as_str()).collect();
    assert_eq!(failed, vec![gone_url.as_str(), broken_url.as_str()]);
    assert!(report.failures[0].error.contains("Network error"));
    assert!(report.failures[1].error.contains("Could not find product title"));

    // Failed listings keep their previous record untouched
    assert_eq!(harness.store.get(&gone_url).await?.unwrap().current_price, Decimal::from(300));
    assert_eq!(harness.store.get(&broken_url).await?.unwrap().current_price, Decimal::from(90));
    assert_eq!(harness.store.get(&ok_url).await?.unwrap().lowest_price, Decimal::from(40));
    Ok(())
}

#[tokio::test]
async fn test_removed_listing_is_not_refreshed() -> anyhow::Result<()> {
    let harness = TestHarness::new().await?;
    let url = harness.listing_url("SPEAKER");

    harness.serve_listing("SPEAKER", "Bookshelf Speaker", "200", None).await;
    harness.manager.add_product(&url).await?;
    harness.manager.remove_product(&url).await?;

    harness.reset_listings().await;
    harness.serve_listing("SPEAKER", "Bookshelf Speaker", "100", None).await;
    let report = harness.manager.refresh_all().await?;

    assert_eq!(report.checked, 0);
    assert!(harness.sink.alerts().is_empty());
    assert!(harness.store.get(&url).await?.is_none());
    Ok(())
}
