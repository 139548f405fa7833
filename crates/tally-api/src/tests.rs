//! Router tests against an in-memory `SqliteStore`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{TimeZone as _, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tally_core::{
  labels::Labels,
  ledger::{NewBusiness, NewExpense, NewTransaction},
  store::LedgerStore,
};
use tally_store_sqlite::SqliteStore;
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{
  AppState, MAX_BUSINESSES_PER_USER, api_router, auth::hash_password, error::ApiError,
};

struct Harness {
  store: Arc<SqliteStore>,
  app:   Router,
}

async fn harness() -> Harness {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let app = api_router(AppState::new(Arc::clone(&store), Labels::default()));
  Harness { store, app }
}

impl Harness {
  async fn user(&self, email: &str, password: &str) -> Uuid {
    self
      .store
      .create_user(email.into(), hash_password(password).unwrap())
      .await
      .unwrap()
      .id
  }

  async fn business(&self, owner: Uuid, name: &str) -> Uuid {
    self
      .store
      .create_business(owner, NewBusiness::new(name))
      .await
      .unwrap()
      .id
  }

  async fn send(
    &self,
    method: &str,
    uri: &str,
    auth: Option<(&str, &str)>,
    body: Option<Value>,
  ) -> Response {
    self.app.clone().oneshot(request(method, uri, auth, body)).await.unwrap()
  }

  /// Fire `n` copies of a request at once and collect the status codes.
  async fn send_concurrently(
    &self,
    n: usize,
    method: &str,
    uri: &str,
    auth: Option<(&str, &str)>,
    body: Value,
  ) -> Vec<StatusCode> {
    let tasks: Vec<_> = (0..n)
      .map(|_| {
        let app = self.app.clone();
        let req = request(method, uri, auth, Some(body.clone()));
        tokio::spawn(async move { app.oneshot(req).await.unwrap().status() })
      })
      .collect();
    let mut statuses = Vec::with_capacity(n);
    for task in tasks {
      statuses.push(task.await.unwrap());
    }
    statuses
  }
}

fn request(
  method: &str,
  uri: &str,
  auth: Option<(&str, &str)>,
  body: Option<Value>,
) -> Request<Body> {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some((user, pass)) = auth {
    builder = builder.header(
      header::AUTHORIZATION,
      format!("Basic {}", B64.encode(format!("{user}:{pass}"))),
    );
  }
  match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  }
}

fn count(statuses: &[StatusCode], status: StatusCode) -> usize {
  statuses.iter().filter(|s| **s == status).count()
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

const OWNER: (&str, &str) = ("owner@example.com", "secret");
const INTRUDER: (&str, &str) = ("intruder@example.com", "hunter2");

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_then_me() {
  let h = harness().await;

  let resp = h
    .send(
      "POST",
      "/users/register",
      None,
      Some(json!({ "email": "awa@example.com", "password": "pw" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body = json_body(resp).await;
  assert_eq!(body["email"], "awa@example.com");
  assert!(body.get("password_hash").is_none());

  let resp = h.send("GET", "/users/me", Some(("awa@example.com", "pw")), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["email"], "awa@example.com");
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_input() {
  let h = harness().await;
  h.user("awa@example.com", "pw").await;

  let resp = h
    .send(
      "POST",
      "/users/register",
      None,
      Some(json!({ "email": "awa@example.com", "password": "pw" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);

  let resp = h
    .send(
      "POST",
      "/users/register",
      None,
      Some(json!({ "email": "not-an-email", "password": "pw" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_registrations_conflict_instead_of_failing() {
  let h = harness().await;
  let body = json!({ "email": "awa@example.com", "password": "pw" });

  let statuses = h.send_concurrently(6, "POST", "/users/register", None, body).await;
  assert_eq!(count(&statuses, StatusCode::CREATED), 1, "{statuses:?}");
  assert_eq!(count(&statuses, StatusCode::CONFLICT), 5, "{statuses:?}");
}

#[test]
fn store_conflicts_map_to_409() {
  let dup = tally_store_sqlite::Error::DuplicateEmail("awa@example.com".into());
  assert!(matches!(ApiError::store(dup), ApiError::Conflict(_)));

  let missing = tally_store_sqlite::Error::NotFound(Uuid::nil());
  assert!(matches!(ApiError::store(missing), ApiError::Store(_)));
}

#[tokio::test]
async fn bad_credentials_get_401_with_challenge() {
  let h = harness().await;
  h.user(OWNER.0, OWNER.1).await;

  for auth in [None, Some((OWNER.0, "wrong")), Some(("ghost@example.com", "x"))] {
    let resp = h.send("GET", "/users/me", auth, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
    assert!(json_body(resp).await["error"].is_string());
  }
}

// ─── Businesses ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_list_and_detail_business() {
  let h = harness().await;
  let owner = h.user(OWNER.0, OWNER.1).await;

  let resp = h
    .send(
      "POST",
      "/businesses",
      Some(OWNER),
      Some(json!({ "name": "Boutique", "sector": "Commerce" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let created = json_body(resp).await;
  assert_eq!(created["currency"], "FCFA");
  assert_eq!(created["owner_id"], owner.to_string());
  let id = created["id"].as_str().unwrap().to_owned();

  let resp = h.send("GET", "/businesses", Some(OWNER), None).await;
  assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);

  let resp = h
    .send(
      "POST",
      "/transactions",
      Some(OWNER),
      Some(json!({
        "business_id": id, "amount": 1500, "payment_method": "cash", "category": "Vente"
      })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let resp = h.send("GET", &format!("/businesses/{id}"), Some(OWNER), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let details = json_body(resp).await;
  assert_eq!(details["name"], "Boutique");
  assert_eq!(details["transactions_count"], 1);
  assert_eq!(details["total_revenue"].as_f64(), Some(1500.0));
  assert_eq!(details["expenses_count"], 0);
}

#[tokio::test]
async fn business_cap_is_enforced() {
  let h = harness().await;
  let owner = h.user(OWNER.0, OWNER.1).await;
  for i in 0..MAX_BUSINESSES_PER_USER {
    h.business(owner, &format!("B{i}")).await;
  }

  let resp = h
    .send("POST", "/businesses", Some(OWNER), Some(json!({ "name": "One too many" })))
    .await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn business_cap_holds_under_concurrent_creates() {
  let h = harness().await;
  let owner = h.user(OWNER.0, OWNER.1).await;

  let statuses = h
    .send_concurrently(
      MAX_BUSINESSES_PER_USER + 5,
      "POST",
      "/businesses",
      Some(OWNER),
      json!({ "name": "Boutique" }),
    )
    .await;
  assert_eq!(count(&statuses, StatusCode::CREATED), MAX_BUSINESSES_PER_USER);
  assert_eq!(count(&statuses, StatusCode::CONFLICT), 5);
  assert_eq!(
    h.store.list_businesses(owner).await.unwrap().len(),
    MAX_BUSINESSES_PER_USER
  );
}

#[tokio::test]
async fn foreign_business_looks_missing_and_survives_delete() {
  let h = harness().await;
  let owner = h.user(OWNER.0, OWNER.1).await;
  h.user(INTRUDER.0, INTRUDER.1).await;
  let b = h.business(owner, "Boutique").await;

  let resp = h.send("GET", &format!("/businesses/{b}"), Some(INTRUDER), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = h.send("DELETE", &format!("/businesses/{b}"), Some(INTRUDER), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert!(h.store.get_business(b).await.unwrap().is_some());

  let resp = h.send("DELETE", &format!("/businesses/{b}"), Some(OWNER), None).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  assert!(h.store.get_business(b).await.unwrap().is_none());
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_validation() {
  let h = harness().await;
  let owner = h.user(OWNER.0, OWNER.1).await;
  let b = h.business(owner, "Boutique").await;

  let cases = [
    json!({ "business_id": b, "amount": -5, "payment_method": "cash", "category": "Vente" }),
    json!({ "business_id": b, "amount": 5, "payment_method": "cash", "category": "  " }),
    json!({ "business_id": b, "amount": 5, "payment_method": "cheque", "category": "Vente" }),
  ];
  for body in cases {
    let resp = h.send("POST", "/transactions", Some(OWNER), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  let resp = h
    .send(
      "POST",
      "/expenses",
      Some(OWNER),
      Some(json!({ "business_id": b, "amount": -1, "category": "Loyer" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn record_amounts_are_bounded() {
  let h = harness().await;
  let owner = h.user(OWNER.0, OWNER.1).await;
  let b = h.business(owner, "Boutique").await;
  let tx = |amount: Value| {
    json!({ "business_id": b, "amount": amount, "payment_method": "cash", "category": "Vente" })
  };

  for amount in [json!(1_000_000_000_000_i64), json!(10.5), json!(0)] {
    let resp = h.send("POST", "/transactions", Some(OWNER), Some(tx(amount.clone()))).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "{amount}");
  }
  for amount in [json!(1_000_000_000_000.01), json!(0.001), json!(1e15)] {
    let resp = h.send("POST", "/transactions", Some(OWNER), Some(tx(amount.clone()))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{amount}");
  }

  let resp = h
    .send(
      "POST",
      "/expenses",
      Some(OWNER),
      Some(json!({ "business_id": b, "amount": 2_000_000_000_000_i64, "category": "Loyer" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn records_are_scoped_to_the_owner() {
  let h = harness().await;
  let owner = h.user(OWNER.0, OWNER.1).await;
  let intruder = h.user(INTRUDER.0, INTRUDER.1).await;
  let b = h.business(owner, "Boutique").await;
  h.business(intruder, "Ailleurs").await;

  let resp = h
    .send(
      "POST",
      "/expenses",
      Some(INTRUDER),
      Some(json!({ "business_id": b, "amount": 10, "category": "Loyer" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = h
    .send(
      "POST",
      "/expenses",
      Some(OWNER),
      Some(json!({ "business_id": b, "amount": 10, "category": "Loyer" })),
    )
    .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let expense_id = json_body(resp).await["id"].as_str().unwrap().to_owned();

  let resp = h.send("GET", &format!("/expenses/{expense_id}"), Some(INTRUDER), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let resp = h.send("GET", &format!("/expenses/{expense_id}"), Some(OWNER), None).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = h.send("GET", "/expenses", Some(INTRUDER), None).await;
  assert!(json_body(resp).await.as_array().unwrap().is_empty());

  let resp = h.send("GET", &format!("/expenses?business_id={b}"), Some(INTRUDER), None).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = h.send("GET", &format!("/expenses?business_id={b}"), Some(OWNER), None).await;
  assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn transaction_list_spans_owned_businesses() {
  let h = harness().await;
  let owner = h.user(OWNER.0, OWNER.1).await;
  let a = h.business(owner, "A").await;
  let b = h.business(owner, "B").await;
  for id in [a, b] {
    h.store
      .record_transaction(NewTransaction::new(id, Decimal::from(100), "card", "Vente"))
      .await
      .unwrap();
  }

  let resp = h.send("GET", "/transactions", Some(OWNER), None).await;
  assert_eq!(json_body(resp).await.as_array().unwrap().len(), 2);
}

// ─── Analytics ───────────────────────────────────────────────────────────────

async fn seeded(h: &Harness) -> Uuid {
  let owner = h.user(OWNER.0, OWNER.1).await;
  h.user(INTRUDER.0, INTRUDER.1).await;
  let b = h.business(owner, "Boutique").await;
  let when = Utc.with_ymd_and_hms(2025, 2, 3, 9, 0, 0).unwrap();
  for (amount, method) in [(100, "cash"), (200, "mobile_money"), (50, "crypto")] {
    h.store
      .record_transaction(NewTransaction::new(b, Decimal::from(amount), method, "Vente").at(when))
      .await
      .unwrap();
  }
  b
}

const ANALYTICS_PATHS: [&str; 10] = [
  "monthly-revenue",
  "expenses-by-category",
  "payment-methods",
  "top-categories",
  "daily-stats",
  "comparative/2025",
  "cash-flow-analysis",
  "summary",
  "dashboard",
  "reports/summary",
];

#[tokio::test]
async fn every_analytics_route_is_owner_only() {
  let h = harness().await;
  let b = seeded(&h).await;

  for path in ANALYTICS_PATHS {
    let uri = format!("/analytics/{b}/{path}");
    let resp = h.send("GET", &uri, Some(INTRUDER), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");

    let resp = h.send("GET", &uri, Some(OWNER), None).await;
    assert_eq!(resp.status(), StatusCode::OK, "{uri}");
  }

  let missing = Uuid::new_v4();
  let resp = h
    .send("GET", &format!("/analytics/{missing}/summary"), Some(OWNER), None)
    .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cash_flow_route_reports_other_bucket() {
  let h = harness().await;
  let b = seeded(&h).await;

  let resp = h
    .send("GET", &format!("/analytics/{b}/cash-flow-analysis"), Some(OWNER), None)
    .await;
  let body = json_body(resp).await;
  let feb = &body["monthly_breakdown"][0];
  assert_eq!(feb["period"], "2025-02");
  assert_eq!(feb["total"].as_f64(), Some(350.0));
  assert_eq!(feb["other"].as_f64(), Some(50.0));
  assert_eq!(feb["bank_transfer"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn query_parameters_are_range_checked() {
  let h = harness().await;
  let b = seeded(&h).await;

  for query in ["top-categories?limit=0", "top-categories?limit=21", "daily-stats?days=0", "daily-stats?days=366"] {
    let resp = h.send("GET", &format!("/analytics/{b}/{query}"), Some(OWNER), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{query}");
  }

  let resp = h
    .send("GET", &format!("/analytics/{b}/top-categories?limit=1"), Some(OWNER), None)
    .await;
  let body = json_body(resp).await;
  assert_eq!(body["top_sales_categories"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn report_dispatch_by_name() {
  let h = harness().await;
  let b = seeded(&h).await;

  let resp = h
    .send("GET", &format!("/analytics/{b}/reports/payment_methods"), Some(OWNER), None)
    .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let methods = json_body(resp).await;
  let names: Vec<_> = methods
    .as_array()
    .unwrap()
    .iter()
    .map(|m| m["method_name"].as_str().unwrap().to_owned())
    .collect();
  assert_eq!(names, ["Espèces", "crypto", "Mobile Money"]);

  let resp = h
    .send("GET", &format!("/analytics/{b}/reports/comparative?year=2025"), Some(OWNER), None)
    .await;
  let cmp = json_body(resp).await;
  assert_eq!(cmp["previous_year"], 2024);
  assert_eq!(cmp["monthly_comparison"].as_array().unwrap().len(), 12);

  let resp = h
    .send("GET", &format!("/analytics/{b}/reports/forecast"), Some(OWNER), None)
    .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn summary_of_empty_business_has_null_top_method() {
  let h = harness().await;
  let owner = h.user(OWNER.0, OWNER.1).await;
  let b = h.business(owner, "Vide").await;

  let resp = h.send("GET", &format!("/analytics/{b}/summary"), Some(OWNER), None).await;
  let body = json_body(resp).await;
  assert!(body["top_payment_method"].is_null());
  assert_eq!(body["totals"]["profit_margin"].as_f64(), Some(0.0));
}

// ─── User-wide dashboard ─────────────────────────────────────────────────────

#[tokio::test]
async fn user_dashboard_spans_owned_businesses() {
  let h = harness().await;
  let owner = h.user(OWNER.0, OWNER.1).await;
  let intruder = h.user(INTRUDER.0, INTRUDER.1).await;
  let shop = h.business(owner, "Boutique").await;
  let stall = h.business(owner, "Kiosque").await;
  let foreign = h.business(intruder, "Ailleurs").await;

  for (b, amount, method) in
    [(shop, 100, "cash"), (stall, 300, "cash"), (stall, 200, "card"), (foreign, 999, "cash")]
  {
    h.store
      .record_transaction(NewTransaction::new(b, Decimal::from(amount), method, "Vente"))
      .await
      .unwrap();
  }
  for (b, amount, category) in [(shop, 50, "Loyer"), (stall, 100, "Loyer"), (stall, 50, "Transport")] {
    h.store
      .record_expense(NewExpense::new(b, Decimal::from(amount), category))
      .await
      .unwrap();
  }

  let resp = h.send("GET", "/dashboard", Some(OWNER), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["summary"]["total_revenue"].as_f64(), Some(600.0));
  assert_eq!(body["summary"]["total_expenses"].as_f64(), Some(200.0));
  assert_eq!(body["summary"]["net_profit"].as_f64(), Some(400.0));
  assert_eq!(body["summary"]["profit_margin"].as_f64(), Some(66.67));
  assert_eq!(body["cash_flow_by_method"]["cash"].as_f64(), Some(400.0));
  assert_eq!(body["cash_flow_by_method"]["card"].as_f64(), Some(200.0));
  assert_eq!(body["expenses_by_category"]["Loyer"].as_f64(), Some(150.0));
  assert_eq!(body["counts"]["transactions"], 3);
  assert_eq!(body["counts"]["expenses"], 3);

  let resp = h
    .send("GET", &format!("/dashboard?business_id={shop}"), Some(OWNER), None)
    .await;
  let body = json_body(resp).await;
  assert_eq!(body["summary"]["total_revenue"].as_f64(), Some(100.0));
  assert_eq!(body["counts"]["expenses"], 1);

  let resp = h
    .send("GET", &format!("/dashboard?business_id={foreign}"), Some(OWNER), None)
    .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = h.send("GET", "/dashboard", None, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
