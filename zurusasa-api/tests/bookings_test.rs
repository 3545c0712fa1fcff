mod common;

use axum::http::StatusCode;
use common::{guest, host, Harness, User};
use serde_json::{json, Value};
use zurusasa_catalog::Category;
use zurusasa_core::BookingStatus;
use zurusasa_shared::models::events::topics;

async fn book(h: &Harness, guest: &User, experience_id: uuid::Uuid) -> Value {
    let (status, body) = h
        .call(
            "POST",
            "/v1/checkout",
            Some(&guest.token),
            Some(json!({
                "experience_id": experience_id,
                "trip_title": "Diani beach villa",
                "amount": 12000,
                "guests": 2,
                "gateway": {"status": "success", "reference": format!("ZS_{}", uuid::Uuid::new_v4())},
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    body["booking"].clone()
}

#[tokio::test]
async fn test_guest_lists_and_cancels() {
    let h = Harness::new();
    let host = host();
    let guest = guest();
    let experience = h.seed_experience(host.id, Category::Villa).await;
    let booking = book(&h, &guest, experience.id).await;

    let (status, list) = h.call("GET", "/v1/bookings", Some(&guest.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let uri = format!("/v1/bookings/{}/cancel", booking["id"].as_str().unwrap());
    let (status, cancelled) = h.call("POST", &uri, Some(&guest.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    // Cancelled bookings are no longer upcoming.
    let (status, _) = h.call("POST", &uri, Some(&guest.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert!(h.events.topics().await.contains(&topics::BOOKING_STATUS_CHANGED.to_string()));
}

#[tokio::test]
async fn test_host_approves_then_completes() {
    let h = Harness::new();
    let host = host();
    let guest = guest();
    let experience = h.seed_experience(host.id, Category::Villa).await;
    let booking = book(&h, &guest, experience.id).await;
    let id = booking["id"].as_str().unwrap().to_string();

    let (status, _) = h
        .call("POST", &format!("/v1/bookings/{}/approve", id), Some(&guest.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, approved) = h
        .call("POST", &format!("/v1/bookings/{}/approve", id), Some(&host.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");

    let (status, _) = h
        .call("POST", &format!("/v1/bookings/{}/decline", id), Some(&host.token), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = h
        .call("POST", &format!("/v1/bookings/{}/complete", id), Some(&host.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let stored = h.bookings.all().await;
    assert_eq!(stored[0].status, BookingStatus::Completed);
}

#[tokio::test]
async fn test_other_host_cannot_decline() {
    let h = Harness::new();
    let owner = host();
    let rival = host();
    let guest = guest();
    let experience = h.seed_experience(owner.id, Category::Boats).await;
    let booking = book(&h, &guest, experience.id).await;

    let uri = format!("/v1/bookings/{}/decline", booking["id"].as_str().unwrap());
    let (status, _) = h.call("POST", &uri, Some(&rival.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_booking_and_missing_token() {
    let h = Harness::new();
    let guest = guest();

    let uri = format!("/v1/bookings/{}/cancel", uuid::Uuid::new_v4());
    let (status, _) = h.call("POST", &uri, Some(&guest.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = h.call("GET", "/v1/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}
