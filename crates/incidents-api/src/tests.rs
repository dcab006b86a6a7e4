//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use chrono::Duration;
use incidents_core::{ids::is_registration_number, store::IncidentStore as _};
use incidents_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, AuthConfig, CorsError, auth::hash_password, cors_layer, router};

const SECRET: &[u8] = b"router-test-secret";
const FRONTEND: &str = "http://localhost:3000";

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store
    .add_user("admin".into(), hash_password("admin123").unwrap())
    .await
    .unwrap();
  let state = AppState::new(store, AuthConfig::new(SECRET, Duration::minutes(30)));
  router(state, cors_layer(&[FRONTEND.to_owned()]).unwrap())
}

async fn send(
  app: &Router,
  method: Method,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut req = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let req = match body {
    Some(body) => req
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => req.body(Body::empty()).unwrap(),
  };

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };
  (status, json)
}

async fn login(app: &Router) -> String {
  let (status, body) = send(
    app,
    Method::POST,
    "/api/auth/login",
    None,
    Some(json!({ "username": "admin", "password": "admin123" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  body["token"].as_str().unwrap().to_owned()
}

fn person_body(name: &str, role: &str) -> Value {
  json!({
    "name": name,
    "address": "1 Main St",
    "role": role,
    "phone": "555-0100",
    "email": "someone@example.com",
  })
}

fn incident_body(kind: &str, severity: &str, persons: &[&str]) -> Value {
  json!({
    "type": kind,
    "description": "reported at the front desk",
    "location": "Central Station",
    "severity": severity,
    "involvedPersons": persons,
  })
}

// ─── Session ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn root_is_public() {
  let app = app().await;
  let (status, body) = send(&app, Method::GET, "/", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn login_returns_token_and_summary_only() {
  let app = app().await;
  let (status, body) = send(
    &app,
    Method::POST,
    "/api/auth/login",
    None,
    Some(json!({ "username": "admin", "password": "admin123" })),
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);
  assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
  assert_eq!(body["user"]["username"], "admin");
  let user = body["user"].as_object().unwrap();
  assert_eq!(user.len(), 2, "user carries only id and username: {body}");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
  let app = app().await;
  let wrong_password = send(
    &app,
    Method::POST,
    "/api/auth/login",
    None,
    Some(json!({ "username": "admin", "password": "nope" })),
  )
  .await;
  let unknown_user = send(
    &app,
    Method::POST,
    "/api/auth/login",
    None,
    Some(json!({ "username": "mallory", "password": "admin123" })),
  )
  .await;

  assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
  assert_eq!(wrong_password, unknown_user);
  assert_eq!(
    wrong_password.1,
    json!({ "success": false, "message": "Invalid credentials" })
  );
}

#[tokio::test]
async fn verify_and_logout_need_a_token() {
  let app = app().await;
  let token = login(&app).await;

  let (status, body) = send(&app, Method::GET, "/api/auth/verify", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["valid"], true);
  assert_eq!(body["user"]["username"], "admin");

  let (status, body) = send(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);

  let (status, _) = send(&app, Method::GET, "/api/auth/verify", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unrepresentable_token_lifetime_is_a_500() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store
    .add_user("admin".into(), hash_password("admin123").unwrap())
    .await
    .unwrap();
  let auth = AuthConfig::new(SECRET, Duration::minutes(1_000_000_000_000));
  let app = router(AppState::new(store, auth), cors_layer(&[]).unwrap());

  let (status, body) = send(
    &app,
    Method::POST,
    "/api/auth/login",
    None,
    Some(json!({ "username": "admin", "password": "admin123" })),
  )
  .await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["error"], "internal server error");
}

#[tokio::test]
async fn expired_token_is_rejected() {
  let app = app().await;
  let stale = AuthConfig::new(SECRET, Duration::minutes(-5))
    .issue_token("admin")
    .unwrap();
  let (status, _) = send(&app, Method::GET, "/api/persons", Some(&stale), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_reject_anonymous_requests() {
  let app = app().await;
  let routes = [
    (Method::GET, "/api/persons"),
    (Method::POST, "/api/persons"),
    (Method::GET, "/api/persons/person-1"),
    (Method::PUT, "/api/persons/person-1"),
    (Method::DELETE, "/api/persons/person-1"),
    (Method::GET, "/api/incidents"),
    (Method::POST, "/api/incidents"),
    (Method::GET, "/api/incidents/inc-1"),
    (Method::PUT, "/api/incidents/inc-1"),
    (Method::DELETE, "/api/incidents/inc-1"),
    (Method::GET, "/api/incidents/by-person/person-1"),
    (Method::GET, "/api/statistics"),
  ];
  for (method, uri) in routes {
    let (status, _) = send(&app, method.clone(), uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
  }
}

// ─── Persons ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn person_lifecycle() {
  let app = app().await;
  let token = login(&app).await;
  let t = Some(token.as_str());

  let (status, created) =
    send(&app, Method::POST, "/api/persons", t, Some(person_body("Ann", "victim"))).await;
  assert_eq!(status, StatusCode::CREATED);
  let id = created["id"].as_str().unwrap().to_owned();
  let uri = format!("/api/persons/{id}");

  let (status, fetched) = send(&app, Method::GET, &uri, t, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched, created);

  let (status, updated) =
    send(&app, Method::PUT, &uri, t, Some(person_body("Ann Lee", "suspect"))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["registration_number"], created["registration_number"]);
  assert_eq!(updated["role"], "suspect");

  let (status, _) = send(&app, Method::DELETE, &uri, t, None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&app, Method::GET, &uri, t, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = send(&app, Method::DELETE, &uri, t, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_person_input_is_unprocessable() {
  let app = app().await;
  let token = login(&app).await;
  let t = Some(token.as_str());

  let (status, body) =
    send(&app, Method::POST, "/api/persons", t, Some(person_body("Ann", "bystander"))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["error"].as_str().unwrap().contains("bystander"));
  assert_eq!(body["message"], body["error"]);

  let (status, _) =
    send(&app, Method::POST, "/api/persons", t, Some(person_body("  ", "victim"))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, _) = send(
    &app,
    Method::PUT,
    "/api/persons/person-missing",
    t,
    Some(person_body("Ann", "victim")),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_is_a_client_error() {
  let app = app().await;
  let token = login(&app).await;
  let req = Request::builder()
    .method(Method::POST)
    .uri("/api/persons")
    .header(header::AUTHORIZATION, format!("Bearer {token}"))
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{\"name\": "))
    .unwrap();
  let resp = app.oneshot(req).await.unwrap();
  assert!(resp.status().is_client_error(), "{}", resp.status());
}

// ─── Incidents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn jane_doe_scenario() {
  let app = app().await;
  let token = login(&app).await;
  let t = Some(token.as_str());

  let (status, jane) = send(
    &app,
    Method::POST,
    "/api/persons",
    t,
    Some(person_body("Jane Doe", "witness")),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let jane_id = jane["id"].as_str().unwrap();
  assert!(!jane_id.is_empty());
  assert!(is_registration_number("PR", jane["registration_number"].as_str().unwrap()));

  let (status, incident) = send(
    &app,
    Method::POST,
    "/api/incidents",
    t,
    Some(incident_body("theft", "high", &[jane_id])),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert!(is_registration_number("RN", incident["registration_number"].as_str().unwrap()));
  assert_eq!(incident["involvedPersons"], json!([jane_id]));

  // An unrelated incident must not show up for Jane.
  let (status, _) = send(
    &app,
    Method::POST,
    "/api/incidents",
    t,
    Some(incident_body("vandalism", "low", &[])),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, for_jane) = send(
    &app,
    Method::GET,
    &format!("/api/incidents/by-person/{jane_id}"),
    t,
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(for_jane, json!([incident]));

  let (status, _) =
    send(&app, Method::GET, "/api/incidents/by-person/person-missing", t, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn incident_update_keeps_identity_and_date() {
  let app = app().await;
  let token = login(&app).await;
  let t = Some(token.as_str());

  let (_, created) = send(
    &app,
    Method::POST,
    "/api/incidents",
    t,
    Some(incident_body("theft", "low", &[])),
  )
  .await;
  let uri = format!("/api/incidents/{}", created["id"].as_str().unwrap());

  let (status, updated) = send(
    &app,
    Method::PUT,
    &uri,
    t,
    Some(incident_body("robbery", "medium", &[])),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  for field in ["id", "registration_number", "date"] {
    assert_eq!(updated[field], created[field], "{field}");
  }
  assert_eq!(updated["type"], "robbery");
  assert_eq!(updated["severity"], "medium");

  let (_, listed) = send(&app, Method::GET, "/api/incidents", t, None).await;
  assert_eq!(listed, json!([updated]));

  let (status, _) = send(&app, Method::DELETE, &uri, t, None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&app, Method::GET, &uri, t, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_person_or_severity_is_unprocessable() {
  let app = app().await;
  let token = login(&app).await;
  let t = Some(token.as_str());

  let (status, _) = send(
    &app,
    Method::POST,
    "/api/incidents",
    t,
    Some(incident_body("theft", "low", &["person-ghost"])),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, _) = send(
    &app,
    Method::POST,
    "/api/incidents",
    t,
    Some(incident_body("theft", "catastrophic", &[])),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (_, listed) = send(&app, Method::GET, "/api/incidents", t, None).await;
  assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn public_listing_is_narrow_and_anonymous() {
  let app = app().await;
  let token = login(&app).await;
  let t = Some(token.as_str());
  let (_, jane) =
    send(&app, Method::POST, "/api/persons", t, Some(person_body("Jane", "witness"))).await;
  send(
    &app,
    Method::POST,
    "/api/incidents",
    t,
    Some(incident_body("theft", "high", &[jane["id"].as_str().unwrap()])),
  )
  .await;

  let (status, body) = send(&app, Method::GET, "/api/incidents/public", None, None).await;
  assert_eq!(status, StatusCode::OK);

  let entries = body.as_array().unwrap();
  assert_eq!(entries.len(), 1);
  let keys: Vec<&str> = entries[0].as_object().unwrap().keys().map(String::as_str).collect();
  assert_eq!(keys, ["location", "registration_number"]);

  let raw = body.to_string();
  for secret in ["password", "hash", "token", "argon2", "involvedPersons"] {
    assert!(!raw.contains(secret), "public listing leaked {secret:?}: {raw}");
  }
}

// ─── Statistics ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn statistics_with_and_without_range() {
  let app = app().await;
  let token = login(&app).await;
  let t = Some(token.as_str());

  for (kind, severity) in [("theft", "high"), ("theft", "low"), ("arson", "high")] {
    send(&app, Method::POST, "/api/incidents", t, Some(incident_body(kind, severity, &[]))).await;
  }

  let (status, all) = send(&app, Method::GET, "/api/statistics", t, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(all["totalIncidents"], 3);
  assert_eq!(all["byType"], json!({ "arson": 1, "theft": 2 }));
  assert_eq!(all["bySeverity"], json!({ "low": 1, "medium": 0, "high": 2 }));
  assert_eq!(all["byMonth"].as_array().unwrap().len(), 1);
  assert_eq!(all["byMonth"][0]["count"], 3);

  let (status, ranged) = send(
    &app,
    Method::GET,
    "/api/statistics?start_date=1970-01-01&end_date=2999-12-31",
    t,
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(ranged, all);

  let (status, empty) = send(
    &app,
    Method::GET,
    "/api/statistics?start_date=1990-01-01&end_date=1990-12-31",
    t,
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(empty["totalIncidents"], 0);
  assert_eq!(empty["bySeverity"], json!({ "low": 0, "medium": 0, "high": 0 }));

  let (status, _) = send(
    &app,
    Method::GET,
    "/api/statistics?start_date=2024-02-01&end_date=2024-01-01",
    t,
    None,
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn statistics_accepts_percent_encoded_offsets() {
  let app = app().await;
  let token = login(&app).await;
  let t = Some(token.as_str());
  send(&app, Method::POST, "/api/incidents", t, Some(incident_body("theft", "low", &[]))).await;

  // `+` must travel as `%2B`; a bare `+` decodes to a space.
  let (status, encoded) = send(
    &app,
    Method::GET,
    "/api/statistics?start_date=1970-01-01T00:00:00%2B02:00&end_date=2999-12-31T00:00:00%2B02:00",
    t,
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(encoded["totalIncidents"], 1);

  let (status, _) = send(
    &app,
    Method::GET,
    "/api/statistics?start_date=1970-01-01T00:00:00+02:00&end_date=2999-12-31T00:00:00+02:00",
    t,
    None,
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ─── CORS ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn preflight_admits_configured_frontend_only() {
  let app = app().await;

  let preflight = |origin: &str| {
    Request::builder()
      .method(Method::OPTIONS)
      .uri("/api/persons")
      .header(header::ORIGIN, origin)
      .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
      .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
      .body(Body::empty())
      .unwrap()
  };

  let resp = app.clone().oneshot(preflight(FRONTEND)).await.unwrap();
  assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], FRONTEND);

  let resp = app.oneshot(preflight("http://evil.example")).await.unwrap();
  assert!(!resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[test]
fn wildcard_or_malformed_origin_is_a_config_error() {
  assert!(matches!(cors_layer(&["*".to_owned()]), Err(CorsError::Wildcard)));
  assert!(matches!(
    cors_layer(&[FRONTEND.to_owned(), " * ".to_owned()]),
    Err(CorsError::Wildcard)
  ));
  assert!(matches!(
    cors_layer(&["http://bad\norigin".to_owned()]),
    Err(CorsError::InvalidOrigin { .. })
  ));
}
