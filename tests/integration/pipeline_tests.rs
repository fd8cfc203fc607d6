use super::*;
use pricewatch::models::HistoryRecord;
use pricewatch::{HistoryStore, RunMode};
use rust_decimal::Decimal;
use std::fs;

fn seed_history(path: &Path, min: Option<i64>, morning: Option<i64>) -> HistoryStore {
    let store = HistoryStore::new(path);
    store
        .save(&HistoryRecord::new(min.map(Decimal::from), morning.map(Decimal::from)))
        .unwrap();
    store
}

#[tokio::test]
async fn test_morning_records_baseline() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");
    let store = seed_history(&path, Some(500), None);
    let config = get_test_config(&path);
    let pages = [(ROZETKA, selector_page("610")), (VELIKI, json_ld_page("520"))];
    let (monitor, recorder) = create_test_monitor(&config, &pages).await?;

    let report = monitor.run(RunMode::Morning).await;

    assert!(report.history_saved);
    assert_eq!(report.deliveries, 1);
    assert_eq!(report.aggregate.quotes.len(), 3);
    assert_eq!(report.aggregate.quotes[0].value, None);

    let sent = recorder.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("520.00 UAH"));
    assert!(sent[0].contains("Veliki"));
    assert!(sent[0].contains(VELIKI));

    assert_eq!(
        store.load(),
        HistoryRecord::new(Some(Decimal::from(500)), Some(Decimal::from(520)))
    );
    Ok(())
}

#[tokio::test]
async fn test_morning_ignores_stock_outs_of_other_goods() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");
    let config = get_test_config(&path);
    let page = r#"<html><head><script type="application/ld+json">
        {"@type": "Product", "name": "Schwalbe Smart Sam",
         "offers": {"@type": "Offer", "price": "1500",
                    "availability": "https://schema.org/InStock"}}
        </script></head><body><h1>Schwalbe Smart Sam</h1>
        <section class="similar-goods">
          <p>Schwalbe Nobby Nic</p><p>Немає в наявності</p>
        </section>
        </body></html>"#;
    let pages = [(KRUTI, page.to_string())];
    let (monitor, recorder) = create_test_monitor(&config, &pages).await?;

    let report = monitor.run(RunMode::Morning).await;

    assert!(report.history_saved);
    let sent = recorder.sent();
    assert!(sent[0].contains("1500.00 UAH"));
    assert!(sent[0].contains("Product: Schwalbe Smart Sam"));
    assert_eq!(
        HistoryStore::new(&path).load().morning_price,
        Some(Decimal::from(1500))
    );
    Ok(())
}

#[tokio::test]
async fn test_afternoon_drop_below_morning() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");
    let store = seed_history(&path, Some(500), Some(520));
    let config = get_test_config(&path);
    let pages = [(KRUTI, json_ld_page("510")), (ROZETKA, selector_page("530"))];
    let (monitor, recorder) = create_test_monitor(&config, &pages).await?;

    let report = monitor.run(RunMode::Afternoon).await;

    let sent = recorder.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Below this morning: 520.00 → 510.00 UAH"));
    assert!(!sent[0].contains("all-time"));
    assert!(report.history_saved);
    assert_eq!(
        store.load(),
        HistoryRecord::new(Some(Decimal::from(500)), Some(Decimal::from(520)))
    );
    Ok(())
}

#[tokio::test]
async fn test_afternoon_first_run_sets_all_time_low() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");
    let config = get_test_config(&path);
    let pages = [(ROZETKA, selector_page("1 299"))];
    let (monitor, recorder) = create_test_monitor(&config, &pages).await?;

    monitor.run(RunMode::Afternoon).await;

    let sent = recorder.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("New all-time low: — → 1299.00 UAH"));
    assert_eq!(
        HistoryStore::new(&path).load(),
        HistoryRecord::new(Some(Decimal::from(1299)), None)
    );
    Ok(())
}

#[tokio::test]
async fn test_afternoon_without_prices_leaves_file_untouched() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");
    seed_history(&path, Some(500), Some(520));
    let before = fs::read(&path)?;
    let config = get_test_config(&path);
    let (monitor, recorder) = create_test_monitor(&config, &[]).await?;

    let report = monitor.run(RunMode::Afternoon).await;

    assert!(report.notification.is_none());
    assert!(!report.history_saved);
    assert!(recorder.sent().is_empty());
    assert_eq!(fs::read(&path)?, before);
    Ok(())
}

#[tokio::test]
async fn test_afternoon_without_drop_stays_quiet() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");
    seed_history(&path, Some(500), Some(520));
    let config = get_test_config(&path);
    let pages = [(KRUTI, json_ld_page("560"))];
    let (monitor, recorder) = create_test_monitor(&config, &pages).await?;

    let report = monitor.run(RunMode::Afternoon).await;

    assert!(recorder.sent().is_empty());
    assert!(report.history_saved);
    Ok(())
}

#[tokio::test]
async fn test_morning_without_prices_reports_unavailable() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");
    seed_history(&path, Some(500), Some(520));
    let before = fs::read(&path)?;
    let config = get_test_config(&path);
    let pages = [(KRUTI, "<html><body>Немає в наявності</body></html>".to_string())];
    let (monitor, recorder) = create_test_monitor(&config, &pages).await?;

    let report = monitor.run(RunMode::Morning).await;

    assert!(!report.history_saved);
    let sent = recorder.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("unavailable"));
    assert_eq!(fs::read(&path)?, before);
    Ok(())
}

#[tokio::test]
async fn test_quick_report_never_writes() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");
    let config = get_test_config(&path);
    let pages = [(KRUTI, json_ld_page("700")), (ROZETKA, selector_page("450"))];
    let (monitor, recorder) = create_test_monitor(&config, &pages).await?;

    let report = monitor.run(RunMode::Quick).await;

    assert!(!report.history_saved);
    assert!(!path.exists());
    let sent = recorder.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("Current lowest price: 450.00 UAH"));
    assert!(sent[0].contains("• Kruti: 700.00 UAH"));
    assert!(sent[0].contains("• Veliki: no price"));
    Ok(())
}

#[tokio::test]
async fn test_corrupt_history_is_replaced() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");
    fs::write(&path, "not json at all")?;
    let config = get_test_config(&path);
    let pages = [(VELIKI, json_ld_page("480"))];
    let (monitor, recorder) = create_test_monitor(&config, &pages).await?;

    let report = monitor.run(RunMode::Afternoon).await;

    assert!(report.history_saved);
    assert_eq!(recorder.sent().len(), 1);
    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(raw["min_all_time"].as_f64(), Some(480.0));
    Ok(())
}

#[tokio::test]
async fn test_daily_cycle() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");
    let config = get_test_config(&path);

    let (morning, _) = create_test_monitor(&config, &[(KRUTI, json_ld_page("600"))]).await?;
    morning.run(RunMode::Morning).await;

    let (afternoon, recorder) =
        create_test_monitor(&config, &[(KRUTI, json_ld_page("590"))]).await?;
    afternoon.run(RunMode::Afternoon).await;

    let sent = recorder.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Below this morning: 600.00 → 590.00 UAH"));
    assert!(sent[0].contains("New all-time low: — → 590.00 UAH"));
    assert_eq!(
        HistoryStore::new(&path).load(),
        HistoryRecord::new(Some(Decimal::from(590)), Some(Decimal::from(600)))
    );
    Ok(())
}
