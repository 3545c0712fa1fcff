mod common;

use axum::http::StatusCode;
use common::{guest, user, Harness};
use serde_json::{json, Value};
use uuid::Uuid;
use zurusasa_core::NewPaymentMethod;
use zurusasa_shared::models::events::topics;
use zurusasa_shared::pii::Masked;

fn new_card_body(gateway: Value, save_card: bool) -> Value {
    json!({
        "trip_title": "Sunset dhow cruise",
        "amount": 4500,
        "guests": 2,
        "payment_method_id": "new",
        "save_card": save_card,
        "gateway": gateway,
    })
}

fn paid_widget() -> Value {
    json!({
        "status": "success",
        "reference": "ZS_1700000000000_ABCDEFGH",
        "authorization": {"authorization_code": "AUTH_live_1", "last4": "4081", "brand": "visa"}
    })
}

#[tokio::test]
async fn test_new_card_checkout_saves_card() {
    let h = Harness::new();
    let guest = guest();

    let (status, body) = h
        .call("POST", "/v1/checkout", Some(&guest.token), Some(new_card_body(paid_widget(), true)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["card_saved"], true);
    assert_eq!(body["booking"]["status"], "paid");
    assert_eq!(body["booking"]["amount"], 4500);
    assert_eq!(body["booking"]["payment_reference"], "ZS_1700000000000_ABCDEFGH");

    let bookings = h.bookings.all().await;
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].user_id, guest.id);

    let cards = h.payment_methods.all().await;
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].last4, "4081");
    assert_eq!(cards[0].authorization_code.expose(), "AUTH_live_1");

    let topics_seen = h.events.topics().await;
    assert!(topics_seen.contains(&topics::BOOKING_PAID.to_string()));
    assert!(topics_seen.contains(&topics::PAYMENT_METHOD_SAVED.to_string()));
}

#[tokio::test]
async fn test_closed_widget_writes_nothing() {
    let h = Harness::new();
    let guest = guest();

    let (status, body) = h
        .call("POST", "/v1/checkout", Some(&guest.token), Some(new_card_body(json!({"status": "closed"}), true)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert_eq!(h.bookings.insert_attempts().await, 0);
    assert_eq!(h.payment_methods.insert_attempts().await, 0);
}

#[tokio::test]
async fn test_signed_out_checkout_is_rejected() {
    let h = Harness::new();

    let (status, body) = h
        .call("POST", "/v1/checkout", None, Some(new_card_body(paid_widget(), false)))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Please sign in to complete your booking");
    assert_eq!(h.bookings.insert_attempts().await, 0);
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let h = Harness::new();

    let (status, _) = h
        .call("POST", "/v1/checkout", Some("not-a-jwt"), Some(new_card_body(paid_widget(), false)))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_new_card_requires_email() {
    let h = Harness::new();
    let no_email = user(None, None);

    let (status, _) = h
        .call("POST", "/v1/checkout", Some(&no_email.token), Some(new_card_body(paid_widget(), false)))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.bookings.insert_attempts().await, 0);
}

#[tokio::test]
async fn test_missing_widget_result_is_bad_request() {
    let h = Harness::new();
    let guest = guest();

    let mut body = new_card_body(Value::Null, false);
    body.as_object_mut().unwrap().remove("gateway");
    let (status, _) = h.call("POST", "/v1/checkout", Some(&guest.token), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_card_save_failure_keeps_booking() {
    let h = Harness::new();
    let guest = guest();
    h.payment_methods.fail_with("permission denied for table payment_methods").await;

    let (status, body) = h
        .call("POST", "/v1/checkout", Some(&guest.token), Some(new_card_body(paid_widget(), true)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["card_saved"], false);
    assert!(body["warning"].as_str().unwrap().contains("permission denied"));
    assert_eq!(h.bookings.all().await.len(), 1);
}

#[tokio::test]
async fn test_booking_failure_skips_card_save() {
    let h = Harness::new();
    let guest = guest();
    h.bookings.fail_with("insert or update on table \"bookings\" violates foreign key constraint").await;

    let (status, body) = h
        .call("POST", "/v1/checkout", Some(&guest.token), Some(new_card_body(paid_widget(), true)))
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().starts_with("Booking failed:"));
    assert!(body["error"].as_str().unwrap().contains("foreign key"));
    assert_eq!(h.payment_methods.insert_attempts().await, 0);
}

#[tokio::test]
async fn test_saved_card_charge_is_simulated() {
    let h = Harness::new();
    let guest = guest();
    let card = h
        .payment_methods
        .seed(NewPaymentMethod {
            user_id: guest.id,
            provider: "paystack".to_string(),
            gateway_reference: "ZS_OLD".to_string(),
            authorization_code: Masked::new("AUTH_old".to_string()),
            card_brand: "visa".to_string(),
            last4: "4081".to_string(),
        })
        .await;

    let (status, body) = h
        .call(
            "POST",
            "/v1/checkout",
            Some(&guest.token),
            Some(json!({
                "trip_title": "Kisite snorkelling",
                "amount": 3000,
                "guests": 1,
                "payment_method_id": card.id.to_string(),
                "save_card": true,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["card_saved"], false);
    assert!(body["booking"]["payment_reference"].as_str().unwrap().starts_with("SIM_"));
    assert_eq!(h.payment_methods.insert_attempts().await, 0);

    let paid = h.events.payloads(topics::BOOKING_PAID).await;
    assert_eq!(paid[0]["simulated"], true);
}

#[tokio::test]
async fn test_someone_elses_saved_card_is_not_found() {
    let h = Harness::new();
    let owner = guest();
    let other = guest();
    let card = h
        .payment_methods
        .seed(NewPaymentMethod {
            user_id: owner.id,
            provider: "paystack".to_string(),
            gateway_reference: "ZS_OLD".to_string(),
            authorization_code: Masked::new("AUTH_old".to_string()),
            card_brand: "mastercard".to_string(),
            last4: "5559".to_string(),
        })
        .await;

    let (status, _) = h
        .call(
            "POST",
            "/v1/checkout",
            Some(&other.token),
            Some(json!({
                "trip_title": "Kisite snorkelling",
                "amount": 3000,
                "guests": 1,
                "payment_method_id": card.id.to_string(),
            })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(h.bookings.insert_attempts().await, 0);
}

#[tokio::test]
async fn test_retry_with_same_key_is_replayed() {
    let h = Harness::new();
    let guest = guest();
    let key = Uuid::new_v4();

    let mut body = new_card_body(paid_widget(), true);
    body["idempotency_key"] = json!(key);

    let (_, first) = h.call("POST", "/v1/checkout", Some(&guest.token), Some(body.clone())).await;
    let (status, second) = h.call("POST", "/v1/checkout", Some(&guest.token), Some(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["replayed"], true);
    assert_eq!(second["booking"]["id"], first["booking"]["id"]);
    assert_eq!(h.bookings.all().await.len(), 1);
    assert_eq!(h.payment_methods.all().await.len(), 1);
}

#[tokio::test]
async fn test_repeated_callback_without_key_books_once() {
    let h = Harness::new();
    let guest = guest();
    let body = new_card_body(paid_widget(), true);

    let (_, first) = h.call("POST", "/v1/checkout", Some(&guest.token), Some(body.clone())).await;
    let (status, second) = h.call("POST", "/v1/checkout", Some(&guest.token), Some(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["replayed"], false);
    assert_eq!(second["replayed"], true);
    assert_eq!(second["booking"]["id"], first["booking"]["id"]);
    assert_eq!(h.bookings.all().await.len(), 1);
    assert_eq!(h.payment_methods.all().await.len(), 1);
}

#[tokio::test]
async fn test_another_guests_key_is_a_conflict() {
    let h = Harness::new();
    let alice = guest();
    let mallory = guest();
    let key = Uuid::new_v4();

    let mut body = new_card_body(json!({"status": "success", "reference": "ZS_ALICE"}), false);
    body["idempotency_key"] = json!(key);
    let (status, _) = h.call("POST", "/v1/checkout", Some(&alice.token), Some(body)).await;
    assert_eq!(status, StatusCode::OK);

    let mut body = new_card_body(json!({"status": "success", "reference": "ZS_MALLORY"}), false);
    body["idempotency_key"] = json!(key);
    let (status, response) = h.call("POST", "/v1/checkout", Some(&mallory.token), Some(body)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    let text = response.to_string();
    assert!(!text.contains(&alice.id.to_string()));
    assert!(!text.contains("ZS_ALICE"));

    let bookings = h.bookings.all().await;
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].user_id, alice.id);
}

#[tokio::test]
async fn test_oversized_amount_is_rejected() {
    let h = Harness::new();
    let guest = guest();

    let mut body = new_card_body(paid_widget(), false);
    body["amount"] = json!(100_000_000_000_000_000_i64);
    let (status, body) = h.call("POST", "/v1/checkout", Some(&guest.token), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("too large"));
    assert_eq!(h.bookings.insert_attempts().await, 0);
}

#[tokio::test]
async fn test_list_payment_methods_hides_authorization() {
    let h = Harness::new();
    let guest = guest();
    h.payment_methods
        .seed(NewPaymentMethod {
            user_id: guest.id,
            provider: "paystack".to_string(),
            gateway_reference: "ZS_OLD".to_string(),
            authorization_code: Masked::new("AUTH_secret".to_string()),
            card_brand: "visa".to_string(),
            last4: "4081".to_string(),
        })
        .await;

    let (status, body) = h.call("GET", "/v1/payment-methods", Some(&guest.token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["last4"], "4081");
    assert!(!body.to_string().contains("AUTH_secret"));

    let (status, _) = h.call("GET", "/v1/payment-methods", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
