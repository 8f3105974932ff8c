use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use folio::store::LotStore;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn mock_chart_day(server: &MockServer, symbol: &str, date_path: &str, close: f64) {
        Mock::given(method("GET"))
            .and(path(format!("/stock/{symbol}/chart/date/{date_path}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"[{{"close": {close}, "symbol": "{symbol}"}}]"#
            )))
            .mount(server)
            .await;
    }

    pub async fn mock_latest_quote(server: &MockServer, symbol: &str, price: f64) {
        Mock::given(method("GET"))
            .and(path(format!("/stock/{symbol}/quote")))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"{{"latestPrice": {price}, "symbol": "{symbol}"}}"#
            )))
            .mount(server)
            .await;
    }

    /// Any chart date not mocked explicitly answers like a non-trading day.
    pub async fn mock_empty_chart_fallback(server: &MockServer) {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(server)
            .await;
    }

    pub fn write_config(dir: &std::path::Path, base_url: &str) -> std::path::PathBuf {
        let config_path = dir.join("config.yaml");
        let data_path = dir.join("data");
        let config = format!(
            "provider:\n  base_url: \"{base_url}\"\n  token: \"test-token\"\ndata_path: \"{}\"\n",
            data_path.display()
        );
        std::fs::write(&config_path, config).unwrap();
        config_path
    }
}

/// Most recent Saturday strictly before today, so the historical weekend
/// branch applies rather than the "today" branch.
fn last_saturday() -> NaiveDate {
    let today = Local::now().date_naive();
    let mut date = today - Duration::days(1);
    while date.weekday() != Weekday::Sat {
        date = date - Duration::days(1);
    }
    date
}

/// A weekday roughly a month back.
fn recent_wednesday() -> NaiveDate {
    let mut date = Local::now().date_naive() - Duration::days(30);
    while date.weekday() != Weekday::Wed {
        date = date - Duration::days(1);
    }
    date
}

#[test_log::test(tokio::test)]
async fn test_buy_on_saturday_prices_with_friday_close() {
    let server = wiremock::MockServer::start().await;
    let saturday = last_saturday();
    let friday = saturday - Duration::days(1);
    test_utils::mock_chart_day(&server, "AAPL", &friday.format("%Y%m%d").to_string(), 150.25)
        .await;
    test_utils::mock_empty_chart_fallback(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = test_utils::write_config(dir.path(), &server.uri());
    let config_arg = config_path.to_str();

    folio::run_command(
        folio::AppCommand::Create {
            name: "tech".to_string(),
        },
        config_arg,
    )
    .await
    .unwrap();

    info!(%saturday, %friday, "Buying on a weekend date");
    folio::run_command(
        folio::AppCommand::Buy {
            portfolio: "tech".to_string(),
            symbol: "AAPL".to_string(),
            quantity: 10,
            date: saturday,
        },
        config_arg,
    )
    .await
    .unwrap();

    let config = folio::config::AppConfig::load_from_path(&config_path).unwrap();
    let store = folio::store::DiskStore::open(&config.data_path().unwrap()).unwrap();
    let lots = store.list_lots("tech").unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].purchase_date, friday);
    assert_eq!(lots[0].purchase_price, 150.25);
}

#[test_log::test(tokio::test)]
async fn test_buy_with_no_data_stores_nothing() {
    let server = wiremock::MockServer::start().await;
    test_utils::mock_empty_chart_fallback(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = test_utils::write_config(dir.path(), &server.uri());
    let config_arg = config_path.to_str();

    folio::run_command(
        folio::AppCommand::Create {
            name: "tech".to_string(),
        },
        config_arg,
    )
    .await
    .unwrap();

    // All probes come back empty; the command reports the failure to the
    // user but exits cleanly.
    folio::run_command(
        folio::AppCommand::Buy {
            portfolio: "tech".to_string(),
            symbol: "NOPE".to_string(),
            quantity: 5,
            date: recent_wednesday(),
        },
        config_arg,
    )
    .await
    .unwrap();

    let config = folio::config::AppConfig::load_from_path(&config_path).unwrap();
    let store = folio::store::DiskStore::open(&config.data_path().unwrap()).unwrap();
    assert!(store.list_lots("tech").unwrap().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_buy_view_sell_flow() {
    let server = wiremock::MockServer::start().await;
    let wednesday = recent_wednesday();
    let date_path = wednesday.format("%Y%m%d").to_string();
    test_utils::mock_chart_day(&server, "AAPL", &date_path, 100.0).await;
    test_utils::mock_chart_day(&server, "MSFT", &date_path, 200.0).await;
    test_utils::mock_latest_quote(&server, "AAPL", 150.0).await;
    test_utils::mock_latest_quote(&server, "MSFT", 180.0).await;
    test_utils::mock_empty_chart_fallback(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = test_utils::write_config(dir.path(), &server.uri());
    let config_arg = config_path.to_str();

    folio::run_command(
        folio::AppCommand::Create {
            name: "tech".to_string(),
        },
        config_arg,
    )
    .await
    .unwrap();
    for (symbol, quantity) in [("AAPL", 10), ("MSFT", 5)] {
        folio::run_command(
            folio::AppCommand::Buy {
                portfolio: "tech".to_string(),
                symbol: symbol.to_string(),
                quantity,
                date: wednesday,
            },
            config_arg,
        )
        .await
        .unwrap();
    }

    folio::run_command(
        folio::AppCommand::View {
            portfolio: "tech".to_string(),
        },
        config_arg,
    )
    .await
    .unwrap();

    folio::run_command(
        folio::AppCommand::Sell {
            portfolio: "tech".to_string(),
            symbol: "MSFT".to_string(),
            date: wednesday,
            price: 200.0,
        },
        config_arg,
    )
    .await
    .unwrap();

    let config = folio::config::AppConfig::load_from_path(&config_path).unwrap();
    let store = folio::store::DiskStore::open(&config.data_path().unwrap()).unwrap();
    let lots = store.list_lots("tech").unwrap();
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].symbol, "AAPL");
}

#[test_log::test(tokio::test)]
async fn test_valuation_numbers_through_http_provider() {
    use folio::quote_provider::Quote;
    use std::sync::Arc;

    let server = wiremock::MockServer::start().await;
    test_utils::mock_latest_quote(&server, "AAPL", 150.0).await;
    test_utils::mock_latest_quote(&server, "MSFT", 180.0).await;

    let cache = Arc::new(folio::cache::Cache::<(String, NaiveDate), Quote>::new());
    let provider = folio::providers::IexProvider::new(&server.uri(), "test-token", cache);

    let date = NaiveDate::from_ymd_opt(2023, 1, 3).unwrap();
    let lots = [
        folio::store::Lot {
            portfolio: "tech".to_string(),
            symbol: "AAPL".to_string(),
            quantity: 10,
            purchase_price: 100.0,
            purchase_date: date,
        },
        folio::store::Lot {
            portfolio: "tech".to_string(),
            symbol: "MSFT".to_string(),
            quantity: 5,
            purchase_price: 200.0,
            purchase_date: date,
        },
    ];

    let valuation = folio::valuation::valuate(&lots, &provider, &|| {})
        .await
        .unwrap();

    assert_eq!(valuation.lots[0].lot.symbol, "AAPL");
    assert_eq!(valuation.lots[0].relative_scale, 1.0);
    assert_eq!(valuation.lots[1].relative_scale, -0.2);
    assert_eq!(valuation.total_dollar_change, 400.0);
    assert_eq!(valuation.total_percent_change, 20.0);
}
