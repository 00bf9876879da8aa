//! In-process CouchDB and IAM stand-ins for wire-level client tests.
//!
//! Only the endpoints the client uses are served. `_find` honours `limit`
//! (default 25) and hands back an offset bookmark, so paging is observable.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use barkr::store::CloudantConfig;

pub const API_KEY: &str = "test-api-key";
pub const ACCESS_TOKEN: &str = "fake-access-token";
const DEFAULT_FIND_LIMIT: usize = 25;

#[derive(Default)]
pub struct FakeCouch {
    databases: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    revisions: AtomicUsize,
    pub token_requests: AtomicUsize,
    pub find_bodies: Mutex<Vec<Value>>,
    pub delete_revs: Mutex<Vec<String>>,
}

impl FakeCouch {
    pub fn with_databases(names: &[&str]) -> Arc<Self> {
        let couch = Self::default();
        {
            let mut databases = couch.databases.lock().unwrap();
            for name in names {
                databases.insert(name.to_string(), BTreeMap::new());
            }
        }
        Arc::new(couch)
    }

    fn next_rev(&self, generation: u32) -> String {
        let n = self.revisions.fetch_add(1, AtomicOrdering::SeqCst);
        format!("{}-{:032x}", generation, n)
    }

    /// Store `doc` directly, returning its revision
    pub fn seed(&self, db: &str, mut doc: Value) -> String {
        let rev = self.next_rev(1);
        doc["_rev"] = json!(rev);
        let id = doc["_id"].as_str().unwrap().to_string();
        self.databases
            .lock()
            .unwrap()
            .get_mut(db)
            .unwrap()
            .insert(id, doc);
        rev
    }

    pub fn document(&self, db: &str, id: &str) -> Option<Value> {
        self.databases.lock().unwrap().get(db)?.get(id).cloned()
    }

    pub fn find_requests(&self) -> usize {
        self.find_bodies.lock().unwrap().len()
    }
}

/// Serve both stand-ins and return a config pointing the client at them
pub async fn start(couch: Arc<FakeCouch>) -> CloudantConfig {
    let iam = Router::new()
        .route("/identity/token", post(iam_token))
        .with_state(couch.clone());

    let database = Router::new()
        .route("/:db", get(database_get).post(document_insert))
        .route(
            "/:db/:id",
            get(document_get).post(database_find).delete(document_delete),
        )
        .with_state(couch);

    let iam_url = serve(iam).await;
    let database_url = serve(database).await;

    CloudantConfig {
        account: "fake".to_string(),
        url: Some(database_url),
        api_key: API_KEY.to_string(),
        iam_url: format!("{}/identity/token", iam_url),
    }
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn couch_error(status: StatusCode, error: &str, reason: &str) -> Response {
    (status, Json(json!({"error": error, "reason": reason}))).into_response()
}

fn authorize(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {}", ACCESS_TOKEN);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(couch_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Authentication required.",
        )),
    }
}

// ==================
// IAM
// ==================

async fn iam_token(
    State(couch): State<Arc<FakeCouch>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    couch.token_requests.fetch_add(1, AtomicOrdering::SeqCst);

    let grant_ok = form.get("grant_type").map(String::as_str)
        == Some("urn:ibm:params:oauth:grant-type:apikey");
    let key_ok = form.get("apikey").map(String::as_str) == Some(API_KEY);
    if !grant_ok || !key_ok {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"errorCode": "BXNIM0415E", "errorMessage": "Provided API key could not be found."})),
        )
            .into_response();
    }

    Json(json!({
        "access_token": ACCESS_TOKEN,
        "token_type": "Bearer",
        "expires_in": 3600,
        "expiration": Utc::now().timestamp() + 3600,
    }))
    .into_response()
}

// ==================
// Database
// ==================

async fn database_get(
    State(couch): State<Arc<FakeCouch>>,
    Path(db): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let databases = couch.databases.lock().unwrap();

    if db == "_all_dbs" {
        let mut names: Vec<&String> = databases.keys().collect();
        names.sort();
        return Json(json!(names)).into_response();
    }
    match databases.get(&db) {
        Some(docs) => Json(json!({"db_name": db, "doc_count": docs.len()})).into_response(),
        None => couch_error(StatusCode::NOT_FOUND, "not_found", "Database does not exist."),
    }
}

async fn document_insert(
    State(couch): State<Arc<FakeCouch>>,
    Path(db): Path<String>,
    headers: HeaderMap,
    Json(mut doc): Json<Value>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let rev = couch.next_rev(1);
    let mut databases = couch.databases.lock().unwrap();
    let Some(docs) = databases.get_mut(&db) else {
        return couch_error(StatusCode::NOT_FOUND, "not_found", "Database does not exist.");
    };

    let id = doc["_id"].as_str().unwrap_or("generated").to_string();
    if docs.contains_key(&id) {
        return couch_error(StatusCode::CONFLICT, "conflict", "Document update conflict.");
    }
    doc["_rev"] = json!(rev);
    docs.insert(id.clone(), doc);

    (
        StatusCode::CREATED,
        Json(json!({"ok": true, "id": id, "rev": rev})),
    )
        .into_response()
}

async fn document_get(
    State(couch): State<Arc<FakeCouch>>,
    Path((db, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let databases = couch.databases.lock().unwrap();
    let Some(docs) = databases.get(&db) else {
        return couch_error(StatusCode::NOT_FOUND, "not_found", "Database does not exist.");
    };
    match docs.get(&id) {
        Some(doc) => Json(doc.clone()).into_response(),
        None => couch_error(StatusCode::NOT_FOUND, "not_found", "missing"),
    }
}

async fn document_delete(
    State(couch): State<Arc<FakeCouch>>,
    Path((db, id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let Some(rev) = params.get("rev").cloned() else {
        return couch_error(StatusCode::BAD_REQUEST, "bad_request", "Document rev is missing.");
    };
    couch.delete_revs.lock().unwrap().push(rev.clone());

    let next = couch.next_rev(2);
    let mut databases = couch.databases.lock().unwrap();
    let Some(docs) = databases.get_mut(&db) else {
        return couch_error(StatusCode::NOT_FOUND, "not_found", "Database does not exist.");
    };
    let Some(current) = docs.get(&id).and_then(|d| d["_rev"].as_str()).map(String::from) else {
        return couch_error(StatusCode::NOT_FOUND, "not_found", "missing");
    };
    if current != rev {
        return couch_error(StatusCode::CONFLICT, "conflict", "Document update conflict.");
    }

    docs.remove(&id);
    Json(json!({"ok": true, "id": id, "rev": next})).into_response()
}

async fn database_find(
    State(couch): State<Arc<FakeCouch>>,
    Path((db, action)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    if action != "_find" {
        return couch_error(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", "Only GET,DELETE allowed");
    }
    couch.find_bodies.lock().unwrap().push(body.clone());

    let databases = couch.databases.lock().unwrap();
    let Some(docs) = databases.get(&db) else {
        return couch_error(StatusCode::NOT_FOUND, "not_found", "Database does not exist.");
    };

    let limit = body["limit"].as_u64().map(|n| n as usize).unwrap_or(DEFAULT_FIND_LIMIT);
    let offset = body["bookmark"]
        .as_str()
        .and_then(|b| b.strip_prefix("offset-"))
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(0);

    let page: Vec<Value> = docs
        .values()
        .filter(|doc| selector_matches(&body["selector"], doc))
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    let bookmark = format!("offset-{}", offset + page.len());
    Json(json!({"docs": page, "bookmark": bookmark})).into_response()
}

fn selector_matches(selector: &Value, doc: &Value) -> bool {
    let Some(fields) = selector.as_object() else {
        return true;
    };
    fields.iter().all(|(field, condition)| {
        let actual = &doc[field.as_str()];
        match condition.as_object() {
            Some(ops) if ops.keys().all(|k| k.starts_with('$')) => ops.iter().all(|(op, v)| {
                match (op.as_str(), compare(actual, v)) {
                    ("$eq", Some(ord)) => ord == Ordering::Equal,
                    ("$gte", Some(ord)) => ord != Ordering::Less,
                    ("$lte", Some(ord)) => ord != Ordering::Greater,
                    _ => false,
                }
            }),
            _ => actual == condition,
        }
    })
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
