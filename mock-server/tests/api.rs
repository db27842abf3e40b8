use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_skew, Account, Asset, Ledger, Problem, Transaction, ISSUER};
use serde::Deserialize;
use tower::ServiceExt;

#[derive(Deserialize)]
struct Page<T> {
    #[serde(rename = "_embedded")]
    embedded: Embedded<T>,
}

#[derive(Deserialize)]
struct Embedded<T> {
    records: Vec<T>,
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn get(uri: &str) -> axum::response::Response {
    app()
        .oneshot(Request::builder().uri(uri).body(String::new()).unwrap())
        .await
        .unwrap()
}

async fn records<T: serde::de::DeserializeOwned>(uri: &str) -> Vec<T> {
    let resp = get(uri).await;
    assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    body_json::<Page<T>>(resp).await.embedded.records
}

// --- date header ---

#[tokio::test]
async fn every_response_has_a_date_header() {
    for uri in ["/", "/ledgers", "/accounts/missing", "/broken"] {
        let resp = get(uri).await;
        let date = resp.headers().get(header::DATE).expect("date header");
        assert!(date.to_str().unwrap().ends_with(" GMT"), "{uri}");
    }
}

#[tokio::test]
async fn date_header_is_skewed() {
    let resp = app_with_skew(3600)
        .oneshot(Request::builder().uri("/").body(String::new()).unwrap())
        .await
        .unwrap();
    let date = resp.headers()[header::DATE].to_str().unwrap().to_string();
    let served = chrono::NaiveDateTime::parse_from_str(&date, "%a, %d %b %Y %H:%M:%S GMT")
        .unwrap()
        .and_utc()
        .timestamp();
    let skew = served - chrono::Utc::now().timestamp();
    assert!((3595..=3600).contains(&skew), "skew {skew}");
}

// --- ledgers ---

#[tokio::test]
async fn ledgers_default_page() {
    let ledgers: Vec<Ledger> = records("/ledgers").await;
    assert_eq!(ledgers.len(), 10);
    assert_eq!(ledgers[0].sequence, 1);
}

#[tokio::test]
async fn ledgers_cursor_order_and_limit() {
    let ledgers: Vec<Ledger> = records("/ledgers?cursor=10&limit=3&order=desc").await;
    let sequences: Vec<u32> = ledgers.iter().map(|l| l.sequence).collect();
    assert_eq!(sequences, vec![9, 8, 7]);

    let ledgers: Vec<Ledger> = records("/ledgers?cursor=18&order=asc").await;
    let sequences: Vec<u32> = ledgers.iter().map(|l| l.sequence).collect();
    assert_eq!(sequences, vec![19, 20]);
}

#[tokio::test]
async fn ledgers_limit_over_max_is_a_problem() {
    let resp = get("/ledgers?limit=500").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let problem: Problem = body_json(resp).await;
    assert_eq!(problem.status, 400);
    assert_eq!(problem.type_, "https://stellar.org/horizon-errors/bad_request");
}

#[tokio::test]
async fn ledgers_bad_order_is_a_problem() {
    let resp = get("/ledgers?order=sideways").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- transactions ---

#[tokio::test]
async fn transactions_hide_failed_by_default() {
    let txs: Vec<Transaction> = records("/transactions").await;
    assert_eq!(txs.len(), 6);
    assert!(txs.iter().all(|tx| tx.successful));
}

#[tokio::test]
async fn transactions_include_failed() {
    let txs: Vec<Transaction> = records("/transactions?include_failed=true").await;
    assert_eq!(txs.len(), 9);
}

// --- assets ---

#[tokio::test]
async fn assets_filter_by_code_and_issuer() {
    let all: Vec<Asset> = records("/assets").await;
    assert_eq!(all.len(), 3);

    let usd: Vec<Asset> = records("/assets?asset_code=USD").await;
    assert_eq!(usd.len(), 2);

    let uri = format!("/assets?asset_code=USD&asset_issuer={ISSUER}");
    let exact: Vec<Asset> = records(&uri).await;
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].num_accounts, 12);
}

// --- accounts ---

#[tokio::test]
async fn account_found() {
    let resp = get(&format!("/accounts/{ISSUER}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let account: Account = body_json(resp).await;
    assert_eq!(account.id, ISSUER);
}

#[tokio::test]
async fn account_not_found_is_a_problem() {
    let resp = get("/accounts/GNOPE").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let problem: Problem = body_json(resp).await;
    assert_eq!(problem.title, "Resource Missing");
    assert_eq!(problem.status, 404);
}

// --- misc ---

#[tokio::test]
async fn unknown_route_is_a_not_found_problem() {
    let resp = get("/offers").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let problem: Problem = body_json(resp).await;
    assert_eq!(problem.type_, "https://stellar.org/horizon-errors/not_found");
}

#[tokio::test]
async fn broken_route_returns_plain_text_500() {
    let resp = get("/broken").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_bytes(resp).await;
    assert_eq!(&body[..], b"upstream exploded");
}
