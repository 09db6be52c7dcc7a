use super::*;
use pricedrop_watcher::config::{DiscordConfig, NotificationsConfig};
use pricedrop_watcher::core::database::ProductStore;
use pricedrop_watcher::plugins::NotifierRegistry;
use rust_decimal::Decimal;

async fn discord_harness(webhook_status: u16) -> anyhow::Result<(TestHarness, MockServer)> {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/42/token"))
        .respond_with(ResponseTemplate::new(webhook_status))
        .mount(&webhook)
        .await;

    let config = NotificationsConfig {
        discord: DiscordConfig {
            webhook_url: Some(format!("{}/api/webhooks/42/token", webhook.uri())),
            ..DiscordConfig::default()
        },
        ..NotificationsConfig::default()
    };
    let registry = NotifierRegistry::from_config(&config, reqwest::Client::new());
    assert_eq!(registry.list_sinks(), vec!["log", "discord"]);

    let harness = TestHarness::with_sink(Arc::new(RecordingSink::default()), Arc::new(registry)).await?;
    Ok((harness, webhook))
}

#[tokio::test]
async fn test_drop_is_posted_to_discord() -> anyhow::Result<()> {
    let (harness, webhook) = discord_harness(204).await?;
    let url = harness.listing_url("TV");

    harness.serve_listing("TV", "55in OLED TV", "1,499.00", None).await;
    harness.manager.add_product(&url).await?;
    assert!(webhook.received_requests().await.unwrap().is_empty());

    harness.reset_listings().await;
    harness.serve_listing("TV", "55in OLED TV", "1,199.00", None).await;
    let report = harness.manager.refresh_all().await?;
    assert_eq!(report.notified, 1);

    let requests = webhook.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body)?;
    let embed = &body["embeds"][0];
    assert_eq!(embed["url"], url.as_str());
    assert_eq!(
        embed["description"],
        "55in OLED TV has a new lower price!\nNew Price: $119,900.00"
    );
    Ok(())
}

#[tokio::test]
async fn test_webhook_failure_still_persists_merge() -> anyhow::Result<()> {
    let (harness, webhook) = discord_harness(500).await?;
    let url = harness.listing_url("BLENDER");

    harness.serve_listing("BLENDER", "Blender", "89", None).await;
    harness.manager.add_product(&url).await?;

    harness.reset_listings().await;
    harness.serve_listing("BLENDER", "Blender", "59", None).await;
    let report = harness.manager.refresh_all().await?;

    assert_eq!(webhook.received_requests().await.unwrap().len(), 1);
    assert_eq!(report.notified, 0);
    assert_eq!(report.updated, 1);
    assert!(report.failures.is_empty());
    assert_eq!(harness.store.get(&url).await?.unwrap().lowest_price, Decimal::from(59));
    Ok(())
}
