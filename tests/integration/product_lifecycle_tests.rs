use super::*;
use pricedrop_watcher::core::database::ProductStore;
use rust_decimal::Decimal;

#[tokio::test]
async fn test_add_list_remove() -> anyhow::Result<()> {
    let harness = TestHarness::new().await?;
    harness.serve_listing("HEADPHONES", "Noise Cancelling Headphones", "129.99", Some("80.00")).await;
    harness.serve_listing("KETTLE", "Electric Kettle", "34.", None).await;

    let headphones_url = harness.listing_url("HEADPHONES");
    let kettle_url = harness.listing_url("KETTLE");

    let headphones = harness.manager.add_product(&headphones_url).await?;
    assert_eq!(headphones.title, "Noise Cancelling Headphones");
    assert_eq!(headphones.current_price, Decimal::from(12999));
    assert_eq!(headphones.lowest_price, Decimal::from(12999));
    assert_eq!(headphones.highest_price, Decimal::from(12999));
    assert_eq!(headphones.alt_price, Decimal::from(8000));

    let kettle = harness.manager.add_product(&kettle_url).await?;
    assert_eq!(kettle.current_price, Decimal::from(34));
    assert_eq!(kettle.alt_price, Decimal::ZERO);

    let urls: Vec<String> = harness.manager.list_products().await?.into_iter().map(|p| p.url).collect();
    assert_eq!(urls, vec![headphones_url.clone(), kettle_url.clone()]);

    assert!(harness.manager.remove_product(&headphones_url).await?);
    assert!(!harness.manager.remove_product(&headphones_url).await?);
    assert!(harness.manager.get_product(&headphones_url).await?.is_none());
    let remaining = harness.manager.list_products().await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].url, kettle.url);
    assert_eq!(remaining[0].current_price, kettle.current_price);

    // Adding never alerts
    assert!(harness.sink.alerts().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_add_failure_stores_nothing() -> anyhow::Result<()> {
    let harness = TestHarness::new().await?;
    harness.serve_status("GONE", 404).await;
    harness.serve_listing("NOPRICE", "Out of stock thing", "Currently unavailable", None).await;

    let err = harness.manager.add_product(&harness.listing_url("GONE")).await.unwrap_err();
    assert!(matches!(err, AppError::Extraction(_)));

    let err = harness.manager.add_product(&harness.listing_url("NOPRICE")).await.unwrap_err();
    assert!(err.to_string().contains("Could not parse price"));

    assert!(harness.store.list_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_re_add_overwrites_history() -> anyhow::Result<()> {
    let harness = TestHarness::new().await?;
    let url = harness.listing_url("MIXER");

    harness.serve_listing("MIXER", "Stand Mixer", "400", None).await;
    harness.manager.add_product(&url).await?;

    harness.reset_listings().await;
    harness.serve_listing("MIXER", "Stand Mixer", "250", None).await;
    harness.manager.refresh_all().await?;
    assert_eq!(harness.store.get(&url).await?.unwrap().lowest_price, Decimal::from(250));
    assert_eq!(harness.store.get(&url).await?.unwrap().highest_price, Decimal::from(400));

    harness.reset_listings().await;
    harness.serve_listing("MIXER", "Stand Mixer", "300", Some("120")).await;
    let readded = harness.manager.add_product(&url).await?;

    assert_eq!(readded.lowest_price, Decimal::from(300));
    assert_eq!(readded.highest_price, Decimal::from(300));
    assert_eq!(readded.alt_price, Decimal::from(120));
    let stored = harness.manager.list_products().await?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].lowest_price, readded.lowest_price);
    assert_eq!(stored[0].alt_price, readded.alt_price);
    Ok(())
}
