use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const MAX_LIMIT: u32 = 200;
pub const DEFAULT_LIMIT: u32 = 10;

const PROBLEM_BASE: &str = "https://stellar.org/horizon-errors/";
pub const ISSUER: &str = "GCKFBEIYTKP5RDBQMTVVALONAOPBXICILMAF5SJ2XUF6VSVLB6U7ZMCA";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Ledger {
    pub id: String,
    pub paging_token: String,
    pub sequence: u32,
    pub successful_transaction_count: u32,
    pub failed_transaction_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub paging_token: String,
    pub successful: bool,
    pub ledger: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub asset_type: String,
    pub asset_code: String,
    pub asset_issuer: String,
    pub num_accounts: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: String,
    pub sequence: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

/// Canned data plus the skew (seconds) applied to every `Date` header.
#[derive(Debug)]
pub struct Horizon {
    ledgers: Vec<Ledger>,
    transactions: Vec<Transaction>,
    assets: Vec<Asset>,
    accounts: HashMap<String, Account>,
    clock_skew: i64,
}

pub type Db = Arc<Horizon>;

impl Horizon {
    pub fn new(clock_skew: i64) -> Self {
        let ledgers = (1..=20)
            .map(|sequence| Ledger {
                id: format!("ledger-{sequence}"),
                paging_token: sequence.to_string(),
                sequence,
                successful_transaction_count: sequence % 4,
                failed_transaction_count: u32::from(sequence % 5 == 0),
            })
            .collect();
        let transactions = (1..=9)
            .map(|n| Transaction {
                id: format!("tx-{n}"),
                paging_token: n.to_string(),
                successful: n % 3 != 0,
                ledger: n,
            })
            .collect();
        let assets = [("USD", ISSUER, 12), ("EUR", ISSUER, 7), ("USD", "GOTHERISSUER", 1)]
            .into_iter()
            .map(|(code, issuer, num_accounts)| Asset {
                asset_type: "credit_alphanum4".to_string(),
                asset_code: code.to_string(),
                asset_issuer: issuer.to_string(),
                num_accounts,
            })
            .collect();
        let accounts = [Account {
            id: ISSUER.to_string(),
            sequence: "4294967296".to_string(),
        }]
        .into_iter()
        .map(|a| (a.id.clone(), a))
        .collect();
        Self {
            ledgers,
            transactions,
            assets,
            accounts,
            clock_skew,
        }
    }
}

pub fn app() -> Router {
    app_with_skew(0)
}

pub fn app_with_skew(clock_skew: i64) -> Router {
    let db: Db = Arc::new(Horizon::new(clock_skew));
    Router::new()
        .route("/", get(root))
        .route("/ledgers", get(list_ledgers))
        .route("/transactions", get(list_transactions))
        .route("/assets", get(list_assets))
        .route("/accounts/{id}", get(get_account))
        .route("/broken", get(broken))
        .fallback(not_found)
        .layer(middleware::map_response_with_state(db.clone(), date_header))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_skew(listener, 0).await
}

pub async fn run_with_skew(listener: TcpListener, clock_skew: i64) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_skew(clock_skew)).await
}

/// RFC 1123 `Date` value for the current time shifted by `skew` seconds.
pub fn http_date(skew: i64) -> String {
    (Utc::now() + Duration::seconds(skew))
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

async fn date_header(State(db): State<Db>, mut response: Response) -> Response {
    if let Ok(value) = HeaderValue::from_str(&http_date(db.clock_skew)) {
        response.headers_mut().insert(header::DATE, value);
    }
    response
}

fn problem(status: StatusCode, kind: &str, title: &str, detail: &str) -> Response {
    let body = Problem {
        type_: format!("{PROBLEM_BASE}{kind}"),
        title: title.to_string(),
        status: status.as_u16(),
        detail: detail.to_string(),
        extras: None,
    };
    (status, Json(body)).into_response()
}

fn bad_request(detail: &str) -> Response {
    problem(StatusCode::BAD_REQUEST, "bad_request", "Bad Request", detail)
}

fn page<T: Serialize>(records: Vec<T>) -> Response {
    Json(json!({
        "_links": {},
        "_embedded": { "records": records },
    }))
    .into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub cursor: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
    pub include_failed: Option<String>,
}

/// Parsed paging parameters; `cursor` is a numeric paging token.
struct Paging {
    cursor: Option<u32>,
    descending: bool,
    limit: usize,
}

impl Paging {
    fn parse(query: &PageQuery) -> Result<Self, Response> {
        let cursor = match query.cursor.as_deref() {
            None => None,
            Some(raw) => Some(
                raw.parse::<u32>()
                    .map_err(|_| bad_request("cursor must be a paging token"))?,
            ),
        };
        let descending = match query.order.as_deref() {
            None | Some("asc") => false,
            Some("desc") => true,
            Some(_) => return Err(bad_request("order must be asc or desc")),
        };
        let limit = match query.limit.as_deref() {
            None => DEFAULT_LIMIT,
            Some(raw) => match raw.parse::<u32>() {
                Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => limit,
                _ => return Err(bad_request("limit must be between 1 and 200")),
            },
        };
        Ok(Self {
            cursor,
            descending,
            limit: limit as usize,
        })
    }

    fn apply<T: Clone>(&self, items: &[T], token: impl Fn(&T) -> u32) -> Vec<T> {
        let mut selected: Vec<T> = items
            .iter()
            .filter(|&item| match self.cursor {
                None => true,
                Some(cursor) if self.descending => token(item) < cursor,
                Some(cursor) => token(item) > cursor,
            })
            .cloned()
            .collect();
        if self.descending {
            selected.reverse();
        }
        selected.truncate(self.limit);
        selected
    }
}

async fn root() -> Json<Value> {
    Json(json!({
        "horizon_version": "mock",
        "network_passphrase": "Test SDF Network ; September 2015",
    }))
}

async fn list_ledgers(State(db): State<Db>, Query(query): Query<PageQuery>) -> Response {
    match Paging::parse(&query) {
        Ok(paging) => page(paging.apply(&db.ledgers, |l| l.sequence)),
        Err(response) => response,
    }
}

async fn list_transactions(State(db): State<Db>, Query(query): Query<PageQuery>) -> Response {
    let include_failed = match query.include_failed.as_deref() {
        None | Some("false") => false,
        Some("true") => true,
        Some(_) => return bad_request("include_failed must be true or false"),
    };
    let paging = match Paging::parse(&query) {
        Ok(paging) => paging,
        Err(response) => return response,
    };
    let visible: Vec<Transaction> = db
        .transactions
        .iter()
        .filter(|tx| include_failed || tx.successful)
        .cloned()
        .collect();
    page(paging.apply(&visible, |tx| tx.ledger))
}

#[derive(Debug, Default, Deserialize)]
pub struct AssetQuery {
    pub asset_code: Option<String>,
    pub asset_issuer: Option<String>,
}

async fn list_assets(State(db): State<Db>, Query(query): Query<AssetQuery>) -> Response {
    let assets: Vec<Asset> = db
        .assets
        .iter()
        .filter(|a| query.asset_code.as_deref().map_or(true, |code| a.asset_code == code))
        .filter(|a| {
            query
                .asset_issuer
                .as_deref()
                .map_or(true, |issuer| a.asset_issuer == issuer)
        })
        .cloned()
        .collect();
    page(assets)
}

async fn get_account(State(db): State<Db>, Path(id): Path<String>) -> Response {
    match db.accounts.get(&id) {
        Some(account) => Json(account.clone()).into_response(),
        None => not_found().await,
    }
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
}

async fn not_found() -> Response {
    problem(
        StatusCode::NOT_FOUND,
        "not_found",
        "Resource Missing",
        "The resource at the url requested was not found.",
    )
}
