mod common;

use axum::http::StatusCode;
use common::{guest, host, Harness};
use serde_json::json;
use zurusasa_catalog::Category;

#[tokio::test]
async fn test_host_publishes_experience() {
    let h = Harness::new();
    let host = host();

    let (status, body) = h
        .call(
            "POST",
            "/v1/host/experiences",
            Some(&host.token),
            Some(json!({
                "category": "apartment",
                "title": "Nyali sea-view apartment",
                "location": "Nyali",
                "current_price": 8000,
                "base_price": 10000
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["price_unit"], "night");
    assert_eq!(body["discount_percent"], 20);
    assert_eq!(body["user_id"], host.id.to_string());
}

#[tokio::test]
async fn test_guest_cannot_publish() {
    let h = Harness::new();
    let guest = guest();

    let (status, _) = h
        .call(
            "POST",
            "/v1/host/experiences",
            Some(&guest.token),
            Some(json!({
                "category": "food",
                "title": "Swahili cooking class",
                "location": "Lamu",
                "current_price": 2500
            })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_listing_filters_by_category() {
    let h = Harness::new();
    let host = host();
    h.seed_experience(host.id, Category::Villa).await;
    h.seed_experience(host.id, Category::Boats).await;

    let (status, all) = h.call("GET", "/v1/experiences", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, boats) = h.call("GET", "/v1/experiences?category=boats", None, None).await;
    assert_eq!(boats.as_array().unwrap().len(), 1);
    assert_eq!(boats[0]["category"], "boats");

    let (status, _) = h.call("GET", "/v1/experiences?category=submarines", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reel_upload_and_feed() {
    let h = Harness::new();
    let host = host();
    let experience = h.seed_experience(host.id, Category::Boats).await;

    let (status, live) = h
        .call(
            "POST",
            "/v1/host/reels",
            Some(&host.token),
            Some(json!({
                "experience_id": experience.id,
                "category": "boats",
                "video_url": "https://cdn.zurusasa.com/reels/dhow.mp4",
                "duration_seconds": 18,
                "is_live": true,
                "latitude": -4.2797,
                "longitude": 39.5950
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(live["verified"], true);

    // Live but without coordinates: not verified.
    let (_, unverified) = h
        .call(
            "POST",
            "/v1/host/reels",
            Some(&host.token),
            Some(json!({
                "experience_id": experience.id,
                "category": "boats",
                "video_url": "https://cdn.zurusasa.com/reels/deck.mp4",
                "duration_seconds": 10,
                "is_live": true
            })),
        )
        .await;
    assert_eq!(unverified["verified"], false);

    let (status, feed) = h.call("GET", "/v1/reels?category=boats", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed.as_array().unwrap().len(), 2);

    let (_, detail) = h.call("GET", &format!("/v1/experiences/{}", experience.id), None, None).await;
    assert_eq!(detail["reels"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_long_reel_is_rejected() {
    let h = Harness::new();
    let host = host();
    let experience = h.seed_experience(host.id, Category::Adventure).await;

    let (status, body) = h
        .call(
            "POST",
            "/v1/host/reels",
            Some(&host.token),
            Some(json!({
                "experience_id": experience.id,
                "category": "adventure",
                "video_url": "https://cdn.zurusasa.com/reels/kitesurf.mp4",
                "duration_seconds": 21
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("20 seconds"));
}

#[tokio::test]
async fn test_unknown_experience_is_not_found() {
    let h = Harness::new();
    let (status, _) = h
        .call("GET", &format!("/v1/experiences/{}", uuid::Uuid::new_v4()), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
