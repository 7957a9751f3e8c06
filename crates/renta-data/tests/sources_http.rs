//! HTTP 소스 통합 테스트 (mockito).

use std::time::Duration;

use chrono::NaiveDate;
use mockito::Matcher;
use renta_core::PipelineError;
use renta_data::provider::{BcvRateFetcher, BinanceP2pClient, BvcClient, SourceError};
use renta_data::{ExchangeRateAggregator, OfficialRateSource, QuoteSource};

const TIMEOUT: Duration = Duration::from_secs(5);

const BCV_PAGE: &str = r#"<html><body>
<div class="view-content">
  <table class="views-table">
    <thead><tr><th>Fecha</th><th>Dólar</th></tr></thead>
    <tbody>
      <tr><td>14-03-2025</td><td>64,7835</td></tr>
      <tr><td>13-03-2025</td><td>64,5000</td></tr>
    </tbody>
  </table>
</div>
</body></html>"#;

const P2P_BODY: &str = r#"{
  "code": "000000",
  "data": [
    {"adv": {"price": "100.00", "surplusAmount": "10", "tradeMethods": [{"tradeMethodName": "Banesco"}]},
     "advertiser": {"nickName": "alpha"}},
    {"adv": {"price": "110.00", "surplusAmount": "", "tradableQuantity": "30"},
     "advertiser": {"userNo": "u2"}},
    {"adv": {"price": "120.00"}, "advertiser": {}},
    {"adv": {"price": "105.00", "surplusAmount": "0"}, "advertiser": {}},
    {"adv": null, "advertiser": null},
    {"adv": {"price": "9999.00", "surplusAmount": "1000"}, "advertiser": {}}
  ]
}"#;

#[tokio::test]
async fn test_bcv_fetch_parses_first_row() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/estadisticas/tasa-de-cambio")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(BCV_PAGE)
        .create_async()
        .await;

    let fetcher = BcvRateFetcher::with_options(
        format!("{}/estadisticas/tasa-de-cambio", server.url()),
        TIMEOUT,
        chrono_tz::America::Caracas,
    )
    .unwrap();

    let rate = fetcher.fetch_official_rate().await.unwrap();
    assert_eq!(rate.date, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
    assert_eq!(rate.rate, 64.7835);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_bcv_server_error_is_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/")
        .with_status(502)
        .create_async()
        .await;

    let fetcher =
        BcvRateFetcher::with_options(server.url(), TIMEOUT, chrono_tz::America::Caracas).unwrap();

    assert!(matches!(fetcher.fetch().await, Err(SourceError::Status(502))));
}

#[tokio::test]
async fn test_p2p_request_and_top_offers() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/search")
        .match_header("accept-language", "es-VE,es;q=0.9,en;q=0.8")
        .match_header("origin", "https://p2p.binance.com")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "asset": "USDT",
            "fiat": "VES",
            "tradeType": "BUY",
            "rows": 20
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(P2P_BODY)
        .expect(2)
        .create_async()
        .await;

    let client =
        BinanceP2pClient::with_options(format!("{}/search", server.url()), TIMEOUT).unwrap();

    let offers = client.top_offers().await.unwrap();
    assert_eq!(offers.len(), 5);
    assert_eq!(offers[0].merchant.as_deref(), Some("alpha"));
    assert_eq!(offers[0].payment_methods, vec!["Banesco"]);
    assert_eq!(offers[1].volume, Some(30.0));
    assert_eq!(offers[1].merchant.as_deref(), Some("u2"));
    assert_eq!(offers[4].price, None);

    // (100×10 + 110×30) / 40, 6번째 광고는 상위 5건 밖
    let average = client.average_buy_price().await.unwrap();
    assert_eq!(average, Some(107.5));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_aggregator_downgrades_malformed_p2p_body() {
    let mut server = mockito::Server::new_async().await;
    let _p2p = server
        .mock("POST", "/")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;
    let mut bcv = mockito::Server::new_async().await;
    let _bcv = bcv
        .mock("GET", "/")
        .with_status(200)
        .with_body(BCV_PAGE)
        .create_async()
        .await;

    let aggregator = ExchangeRateAggregator::new(
        Box::new(
            BcvRateFetcher::with_options(bcv.url(), TIMEOUT, chrono_tz::America::Caracas)
                .unwrap(),
        ),
        Box::new(BinanceP2pClient::with_options(server.url(), TIMEOUT).unwrap()),
    );

    assert!(aggregator.fetch_official_rate().await.is_some());
    assert!(aggregator.fetch_parallel_rate().await.is_none());
}

#[tokio::test]
async fn test_p2p_invalid_json_is_structure_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let client = BinanceP2pClient::with_options(server.url(), TIMEOUT).unwrap();
    let err = client.search().await.unwrap_err();
    assert!(matches!(err, SourceError::Structure(_)));
    assert!(matches!(
        err.into_pipeline("p2p"),
        PipelineError::MalformedPayload { .. }
    ));
}

#[tokio::test]
async fn test_bvc_history_form_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/wp-admin/admin-ajax.php")
        .match_header("referer", "https://www.bolsadecaracas.com/historicos/")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("action".into(), "getHistoricoSimbolo".into()),
            Matcher::UrlEncoded("simbolo".into(), "BNC".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"cur_hist_mov_emisora": [
                ["14-03-25", "1,00", "1,20", "0,20", "20,00", "1,25", "0,98", "12", "3.400", "4.080,00"]
            ]}"#,
        )
        .create_async()
        .await;

    let client = BvcClient::with_options(
        format!("{}/wp-admin/admin-ajax.php", server.url()),
        TIMEOUT,
    )
    .unwrap();

    let rows = client.fetch_symbol("BNC").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].close_price.as_deref(), Some("1,20"));
    assert_eq!(rows[0].amount_traded.as_deref(), Some("4.080,00"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_bvc_non_success_is_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(403)
        .create_async()
        .await;

    let client = BvcClient::with_options(server.url(), TIMEOUT).unwrap();
    assert!(matches!(
        client.fetch_history("BPV").await,
        Err(SourceError::Status(403))
    ));
}

#[tokio::test]
#[ignore] // 실제 네트워크 테스트는 ignore
async fn test_live_sources() {
    let bcv = BcvRateFetcher::new(chrono_tz::America::Caracas).unwrap();
    println!("BCV: {:?}", bcv.fetch().await);

    let p2p = BinanceP2pClient::new().unwrap();
    println!("P2P: {:?}", p2p.average_buy_price().await);

    let bvc = BvcClient::new().unwrap();
    match bvc.fetch_history("BNC").await {
        Ok(rows) => println!("BVC BNC: {} rows, first = {:?}", rows.len(), rows.first()),
        Err(e) => println!("BVC BNC: {}", e),
    }
}
