use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use rusqlite::params;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tower::ServiceExt;

use course_bookings::config::AppConfig;
use course_bookings::db;
use course_bookings::db::queries;
use course_bookings::handlers;
use course_bookings::models::{BookingStatus, Role};
use course_bookings::services::mail::{Email, Mailer};
use course_bookings::state::AppState;

// ── Mock Mailer ──

struct MockMailer {
    sent: Arc<Mutex<Vec<Email>>>,
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ── Fixtures ──

const STUDENT_TOKEN: &str = "student-token";
const OTHER_TOKEN: &str = "other-token";
const MANAGER_TOKEN: &str = "manager-token";

struct Fixture {
    state: Arc<AppState>,
    sent: Arc<Mutex<Vec<Email>>>,
    general_course: i64,
    exam_course: i64,
    homestay: i64,
    transfer: i64,
}

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        mail_api_url: "".to_string(),
        mail_api_key: "".to_string(),
        mail_from: "no-reply@example.com".to_string(),
        booking_key_secret: "test-secret".to_string(),
        email_booking_create_client_confirm: "Your booking request has been sent".to_string(),
        email_booking_create_user: "New booking request".to_string(),
        email_booking_update_user: "Booking updated".to_string(),
    }
}

fn setup() -> Fixture {
    let conn = db::init_db(":memory:").unwrap();

    let student =
        queries::create_user(&conn, "student@example.com", "Ann", "Lee", Role::Student).unwrap();
    queries::create_token(&conn, STUDENT_TOKEN, student).unwrap();
    let other =
        queries::create_user(&conn, "other@example.com", "Bob", "Stone", Role::Student).unwrap();
    queries::create_token(&conn, OTHER_TOKEN, other).unwrap();
    let manager = queries::create_user(
        &conn,
        "manager@school.example.com",
        "Mary",
        "Hall",
        Role::ProviderManager,
    )
    .unwrap();
    queries::create_token(&conn, MANAGER_TOKEN, manager).unwrap();

    conn.execute(
        "INSERT INTO schools (name, fee_price, created_by) VALUES ('London School', '50', ?1)",
        params![manager],
    )
    .unwrap();
    let school = conn.last_insert_rowid();

    let course_with_price = |type_name: &str, unit_price: &str| -> i64 {
        conn.execute("INSERT INTO course_types (name) VALUES (?1)", params![type_name])
            .unwrap();
        let type_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO courses (school_id, type_id) VALUES (?1, ?2)",
            params![school, type_id],
        )
        .unwrap();
        let course = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO course_price_ranges (course_id, unit_price, weeks_count_from, weeks_count_to)
             VALUES (?1, ?2, 1, 52)",
            params![course, unit_price],
        )
        .unwrap();
        course
    };
    let general_course = course_with_price("General English", "100");
    let exam_course = course_with_price("Preparation to exam", "300");

    conn.execute("INSERT INTO accommodation_types (name) VALUES ('Homestay')", [])
        .unwrap();
    let homestay_type = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO accommodations (school_id, type_id) VALUES (?1, ?2)",
        params![school, homestay_type],
    )
    .unwrap();
    let homestay = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO accommodation_price_ranges (accommodation_id, unit_price, weeks_count_from, weeks_count_to)
         VALUES (?1, '50', 1, 52)",
        params![homestay],
    )
    .unwrap();

    conn.execute("INSERT INTO extras (name) VALUES ('Airport transfer')", [])
        .unwrap();
    let extra = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO school_extras (school_id, extra_id, price) VALUES (?1, ?2, '30')",
        params![school, extra],
    )
    .unwrap();
    let transfer = conn.last_insert_rowid();

    conn.execute(
        "INSERT INTO currencies (code, rate) VALUES ('EUR', '1'), ('USD', '1.1')",
        [],
    )
    .unwrap();

    let sent = Arc::new(Mutex::new(vec![]));
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        mailer: Box::new(MockMailer {
            sent: Arc::clone(&sent),
        }),
    });

    Fixture {
        state,
        sent,
        general_course,
        exam_course,
        homestay,
        transfer,
    }
}

// ── Helpers ──

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Token {token}"));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = handlers::router(state.clone()).oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn price(json: &serde_json::Value) -> Decimal {
    json.as_str().unwrap().parse().unwrap()
}

impl Fixture {
    fn booking_body(&self, course: i64) -> serde_json::Value {
        serde_json::json!({
            "course": course,
            "accommodation": self.homestay,
            "start_at": "2025-09-01",
            "weeks_count": 2,
            "person_count": 1,
            "persons": [],
        })
    }

    async fn create_booking(&self, token: &str) -> serde_json::Value {
        let (status, json) = send(
            &self.state,
            request(
                "POST",
                "/api/client/bookings",
                Some(token),
                Some(self.booking_body(self.general_course)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json
    }

    fn set_status(&self, id: i64, status: BookingStatus) {
        let db = self.state.db.lock().unwrap();
        queries::update_booking_status(&db, id, status).unwrap();
    }

    fn sent_templates(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|e| (e.to.clone(), e.template.clone()))
            .collect()
    }
}

// ── Access Control ──

#[tokio::test]
async fn test_health() {
    let fx = setup();
    let (status, json) = send(&fx.state, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_requires_authentication() {
    let fx = setup();
    let res = handlers::router(fx.state.clone())
        .oneshot(request("GET", "/api/client/bookings/my", None, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Token");

    let (status, _) = send(
        &fx.state,
        request("GET", "/api/client/bookings/my", Some("bogus"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_provider_manager_forbidden() {
    let fx = setup();
    let (status, _) = send(
        &fx.state,
        request("GET", "/api/client/bookings/my", Some(MANAGER_TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &fx.state,
        request(
            "POST",
            "/api/client/bookings",
            Some(MANAGER_TOKEN),
            Some(fx.booking_body(fx.general_course)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_non_owner_forbidden() {
    let fx = setup();
    let booking = fx.create_booking(STUDENT_TOKEN).await;
    let uri = format!("/api/client/bookings/{}", booking["id"]);

    let (status, _) = send(&fx.state, request("GET", &uri, Some(OTHER_TOKEN), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &fx.state,
        request(
            "PUT",
            &uri,
            Some(OTHER_TOKEN),
            Some(fx.booking_body(fx.exam_course)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &fx.state,
        request("GET", "/api/client/bookings/9999", Some(STUDENT_TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Create / List / Delete ──

#[tokio::test]
async fn test_create_booking_computes_prices() {
    let fx = setup();
    let json = fx.create_booking(STUDENT_TOKEN).await;

    assert_eq!(json["status"], "new");
    assert_eq!(json["person_count"], 1);
    assert_eq!(json["persons"].as_array().unwrap().len(), 1);
    assert_eq!(json["persons"][0]["gender"], "M");
    assert_eq!(price(&json["course_price"]), dec!(200));
    assert_eq!(price(&json["accommodation_price"]), dec!(100));
    assert_eq!(price(&json["total_price"]), dec!(300));
    assert_eq!(price(&json["fee_price"]), dec!(50));
    assert_eq!(price(&json["rates_prices"]["USD"]["total_price"]), dec!(330));
    assert_eq!(json["school"]["name"], "London School");
    assert_eq!(json["user"]["email"], "student@example.com");
    assert_eq!(json["inactive"], false);
    assert!(!json["key"].as_str().unwrap().is_empty());
    assert!(json["created_at"].as_str().unwrap().ends_with('Z'));

    assert!(fx.sent_templates().is_empty());
}

#[tokio::test]
async fn test_create_reports_missing_fields() {
    let fx = setup();
    let (status, json) = send(
        &fx.state,
        request(
            "POST",
            "/api/client/bookings",
            Some(STUDENT_TOKEN),
            Some(serde_json::json!({})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["course", "accommodation", "start_at", "weeks_count"] {
        assert_eq!(json[field][0], "This field is required.", "{field}");
    }
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let fx = setup();
    let req = Request::builder()
        .method("POST")
        .uri("/api/client/bookings")
        .header("Authorization", format!("Token {STUDENT_TOKEN}"))
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&fx.state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_without_price_range() {
    let fx = setup();
    let mut body = fx.booking_body(fx.general_course);
    body["weeks_count"] = serde_json::json!(60);
    let (status, json) = send(
        &fx.state,
        request("POST", "/api/client/bookings", Some(STUDENT_TOKEN), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["weeks_count"].is_array());
}

#[tokio::test]
async fn test_my_lists_own_bookings_and_delete() {
    let fx = setup();
    let first = fx.create_booking(STUDENT_TOKEN).await;
    fx.create_booking(STUDENT_TOKEN).await;
    fx.create_booking(OTHER_TOKEN).await;

    let (status, json) = send(
        &fx.state,
        request("GET", "/api/client/bookings/my", Some(STUDENT_TOKEN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["school_name"], "London School");
    assert_eq!(list[0]["course_name"], "General English");
    assert_eq!(list[0]["accommodation_name"], "Homestay");

    let (status, json) = send(
        &fx.state,
        request(
            "GET",
            &format!("/api/client/bookings/{}/delete", first["id"]),
            Some(STUDENT_TOKEN),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "success");

    let (_, json) = send(
        &fx.state,
        request("GET", "/api/client/bookings/my", Some(STUDENT_TOKEN), None),
    )
    .await;
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_ne!(list[0]["id"], first["id"]);
}

#[tokio::test]
async fn test_not_viewed_count_and_set_viewed() {
    let fx = setup();
    fx.create_booking(STUDENT_TOKEN).await;
    fx.create_booking(STUDENT_TOKEN).await;
    {
        let db = fx.state.db.lock().unwrap();
        db.execute("UPDATE bookings SET viewed = 0", []).unwrap();
    }

    let count_req = || {
        request(
            "GET",
            "/api/client/bookings/my_not_viewed_count",
            Some(STUDENT_TOKEN),
            None,
        )
    };

    let (status, json) = send(&fx.state, count_req()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["not_viewed_count"], 2);

    let (status, json) = send(
        &fx.state,
        request(
            "POST",
            "/api/client/bookings/my_set_viewed",
            Some(STUDENT_TOKEN),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["not_viewed_count"], 0);

    let (_, json) = send(&fx.state, count_req()).await;
    assert_eq!(json["not_viewed_count"], 0);
}

// ── Update ──

#[tokio::test]
async fn test_update_recomputes_prices_with_persons() {
    let fx = setup();
    let booking = fx.create_booking(STUDENT_TOKEN).await;
    let uri = format!("/api/client/bookings/{}", booking["id"]);

    let mut body = fx.booking_body(fx.exam_course);
    body["bookingsextra_set"] = serde_json::json!([{ "id": fx.transfer }]);
    let (status, json) = send(
        &fx.state,
        request("PUT", &uri, Some(STUDENT_TOKEN), Some(body.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(price(&json["total_price"]), dec!(730));
    assert_eq!(json["person_count"], 1);
    assert_eq!(json["bookingsextra_set"][0]["name"], "Airport transfer");

    let first_person = json["persons"][0]["id"].clone();
    body["persons"] = serde_json::json!([
        { "id": first_person, "first_name": "Ann", "gender": "F" },
        { "first_name": "Kate", "gender": "F", "order": 1 },
    ]);
    let (status, json) = send(
        &fx.state,
        request("PUT", &uri, Some(STUDENT_TOKEN), Some(body.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(price(&json["total_price"]), dec!(1460));
    assert_eq!(json["person_count"], 2);
    assert_eq!(json["persons"][0]["id"], first_person);
    assert_eq!(json["persons"][1]["first_name"], "Kate");

    body["persons"] = serde_json::json!([{ "id": first_person, "gender": "F" }]);
    let (status, json) = send(
        &fx.state,
        request("PUT", &uri, Some(STUDENT_TOKEN), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(price(&json["total_price"]), dec!(730));
    assert_eq!(json["person_count"], 1);
}

#[tokio::test]
async fn test_patch_keeps_current_values() {
    let fx = setup();
    let booking = fx.create_booking(STUDENT_TOKEN).await;
    let uri = format!("/api/client/bookings/{}", booking["id"]);

    let (status, json) = send(
        &fx.state,
        request(
            "PATCH",
            &uri,
            Some(STUDENT_TOKEN),
            Some(serde_json::json!({ "weeks_count": 4 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["course"], fx.general_course);
    assert_eq!(price(&json["course_price"]), dec!(400));
    assert_eq!(price(&json["accommodation_price"]), dec!(200));
    assert_eq!(price(&json["total_price"]), dec!(600));
}

#[tokio::test]
async fn test_update_rejects_unknown_person() {
    let fx = setup();
    let booking = fx.create_booking(STUDENT_TOKEN).await;
    let mut body = fx.booking_body(fx.general_course);
    body["persons"] = serde_json::json!([{ "id": 9999 }]);

    let (status, json) = send(
        &fx.state,
        request(
            "PUT",
            &format!("/api/client/bookings/{}", booking["id"]),
            Some(STUDENT_TOKEN),
            Some(body),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["persons"].is_array());
}

#[tokio::test]
async fn test_update_rejects_repeated_person_id() {
    let fx = setup();
    let booking = fx.create_booking(STUDENT_TOKEN).await;
    let person = booking["persons"][0]["id"].clone();
    let mut body = fx.booking_body(fx.general_course);
    body["persons"] = serde_json::json!([{ "id": person }, { "id": person }]);

    let uri = format!("/api/client/bookings/{}", booking["id"]);
    let (status, json) = send(
        &fx.state,
        request("PUT", &uri, Some(STUDENT_TOKEN), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["persons"].is_array());

    let (_, json) = send(&fx.state, request("GET", &uri, Some(STUDENT_TOKEN), None)).await;
    assert_eq!(json["person_count"], 1);
    assert_eq!(json["persons"].as_array().unwrap().len(), 1);
    assert_eq!(price(&json["total_price"]), dec!(300));
}

#[tokio::test]
async fn test_person_count_upper_bound() {
    let fx = setup();
    let mut body = fx.booking_body(fx.general_course);
    body["person_count"] = serde_json::json!(1_000_000_000);

    let (status, json) = send(
        &fx.state,
        request("POST", "/api/client/bookings", Some(STUDENT_TOKEN), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["person_count"].is_array());
}

#[tokio::test]
async fn test_non_numeric_id_is_not_found() {
    let fx = setup();
    for uri in [
        "/api/client/bookings/abc",
        "/api/client/bookings/abc/delete",
        "/api/client/bookings/abc/chat",
        "/api/client/bookings/abc/review",
    ] {
        let (status, _) = send(&fx.state, request("GET", uri, Some(STUDENT_TOKEN), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

// ── Status & Emails ──

#[tokio::test]
async fn test_first_submission_sends_confirmation_and_notice() {
    let fx = setup();
    let booking = fx.create_booking(STUDENT_TOKEN).await;
    let uri = format!("/api/client/bookings/{}", booking["id"]);

    let (status, json) = send(
        &fx.state,
        request(
            "PUT",
            &uri,
            Some(STUDENT_TOKEN),
            Some(fx.booking_body(fx.general_course)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["status"], "waiting_school");

    let sent = fx.sent_templates();
    assert_eq!(sent.len(), 2);
    assert!(sent.contains(&("student@example.com".to_string(), "booking_confirm".to_string())));
    assert!(sent.contains(&(
        "manager@school.example.com".to_string(),
        "booking_created".to_string()
    )));

    let (status, _) = send(
        &fx.state,
        request(
            "PATCH",
            &uri,
            Some(STUDENT_TOKEN),
            Some(serde_json::json!({ "callback": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let sent = fx.sent_templates();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[2].1, "booking_updated");
}

#[tokio::test]
async fn test_waiting_update_returns_to_waiting_school() {
    let fx = setup();
    let booking = fx.create_booking(STUDENT_TOKEN).await;
    let id = booking["id"].as_i64().unwrap();
    fx.set_status(id, BookingStatus::WaitingUpdate);

    let (status, json) = send(
        &fx.state,
        request(
            "PATCH",
            &format!("/api/client/bookings/{id}"),
            Some(STUDENT_TOKEN),
            Some(serde_json::json!({})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["status"], "waiting_school");

    let sent = fx.sent_templates();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "manager@school.example.com");
    assert_eq!(sent[0].1, "booking_updated");
}

#[tokio::test]
async fn test_locked_statuses_reject_edits() {
    let fx = setup();
    let booking = fx.create_booking(STUDENT_TOKEN).await;
    let id = booking["id"].as_i64().unwrap();

    for locked in [
        BookingStatus::WaitingPayment,
        BookingStatus::OnCourse,
        BookingStatus::Cancelled,
        BookingStatus::Finished,
    ] {
        fx.set_status(id, locked);
        let (status, _) = send(
            &fx.state,
            request(
                "PUT",
                &format!("/api/client/bookings/{id}"),
                Some(STUDENT_TOKEN),
                Some(fx.booking_body(fx.general_course)),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", locked.as_str());

        let (_, json) = send(
            &fx.state,
            request("GET", &format!("/api/client/bookings/{id}"), Some(STUDENT_TOKEN), None),
        )
        .await;
        assert_eq!(json["status"], locked.as_str());
        assert_eq!(json["inactive"], true);
    }

    assert!(fx.sent_templates().is_empty());
}

#[tokio::test]
async fn test_locked_booking_rejects_before_body_is_read() {
    let fx = setup();
    let booking = fx.create_booking(STUDENT_TOKEN).await;
    let id = booking["id"].as_i64().unwrap();

    for locked in [BookingStatus::Finished, BookingStatus::Deleted] {
        fx.set_status(id, locked);
        for method in ["PUT", "PATCH"] {
            let (status, _) = send(
                &fx.state,
                request(
                    method,
                    &format!("/api/client/bookings/{id}"),
                    Some(STUDENT_TOKEN),
                    Some(serde_json::json!({ "weeks_count": "two" })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{method} {}", locked.as_str());
        }
    }
}

#[tokio::test]
async fn test_email_body_keeps_school_name_literal() {
    let fx = setup();
    {
        let db = fx.state.db.lock().unwrap();
        db.execute("UPDATE schools SET name = 'Evil {user_email} School'", [])
            .unwrap();
    }
    let booking = fx.create_booking(STUDENT_TOKEN).await;

    let (status, _) = send(
        &fx.state,
        request(
            "PUT",
            &format!("/api/client/bookings/{}", booking["id"]),
            Some(STUDENT_TOKEN),
            Some(fx.booking_body(fx.general_course)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let sent = fx.sent.lock().unwrap();
    let confirm = sent
        .iter()
        .find(|e| e.template == "booking_confirm")
        .unwrap();
    assert!(confirm.body.contains("at Evil {user_email} School"));
    assert!(!confirm.body.contains("student@example.com"));
}

// ── Chat & Reviews ──

#[tokio::test]
async fn test_chat_records() {
    let fx = setup();
    let booking = fx.create_booking(STUDENT_TOKEN).await;
    let uri = format!("/api/client/bookings/{}/chat", booking["id"]);

    let (status, json) = send(
        &fx.state,
        request(
            "POST",
            &uri,
            Some(STUDENT_TOKEN),
            Some(serde_json::json!({ "message": "When does the course start?" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "When does the course start?");
    assert_eq!(json["booking"], booking["id"]);

    let (status, _) = send(
        &fx.state,
        request(
            "POST",
            &uri,
            Some(STUDENT_TOKEN),
            Some(serde_json::json!({ "message": "   " })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(&fx.state, request("GET", &uri, Some(STUDENT_TOKEN), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["message"], "When does the course start?");
    assert_eq!(json[0]["author"]["first_name"], "Ann");

    let (status, _) = send(&fx.state, request("GET", &uri, Some(OTHER_TOKEN), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Ownership is checked before the body is looked at.
    let (status, _) = send(
        &fx.state,
        request(
            "POST",
            &uri,
            Some(OTHER_TOKEN),
            Some(serde_json::json!({ "message": "" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reviews() {
    let fx = setup();
    let booking = fx.create_booking(STUDENT_TOKEN).await;
    let uri = format!("/api/client/bookings/{}/review", booking["id"]);

    let (status, json) = send(
        &fx.state,
        request(
            "POST",
            &uri,
            Some(STUDENT_TOKEN),
            Some(serde_json::json!({ "data": "{\"rating\": 5, \"comment\": \"Great teachers\"}" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["rating"], 5);
    assert_eq!(json["author"]["email"], "student@example.com");

    let (status, _) = send(
        &fx.state,
        request(
            "POST",
            &uri,
            Some(OTHER_TOKEN),
            Some(serde_json::json!({ "rating": 0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = send(
        &fx.state,
        request(
            "POST",
            &uri,
            Some(STUDENT_TOKEN),
            Some(serde_json::json!({ "rating": 7 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["rating"].is_array());

    let (status, json) = send(&fx.state, request("GET", &uri, Some(STUDENT_TOKEN), None)).await;
    assert_eq!(status, StatusCode::OK);
    let reviews = json.as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["rating"], 5);
    assert_eq!(reviews[0]["comment"], "Great teachers");
}
