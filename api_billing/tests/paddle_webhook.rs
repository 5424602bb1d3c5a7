#[macro_use]
mod support;

use std::sync::Arc;

use actix_web::{http::StatusCode, test};
use db::memory::MemoryStore;
use serde_json::{Value, json};
use support::{MockProvider, paddle_request, subscription_created};

#[actix_web::test]
async fn signed_subscription_created_upserts_row() {
    let store = Arc::new(MemoryStore::new());
    let app = billing_app!(store.clone(), Arc::new(MockProvider::ok()));

    let req = paddle_request(&subscription_created("evt_1"), 5).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!({ "received": true }));
    let row = store.subscription("u1").expect("row for u1");
    assert_eq!(row.paddle_subscription_id.as_deref(), Some("sub_1"));
    assert_eq!(row.status, "active");
    assert_eq!(row.plan_type, "monthly");
    assert_eq!(store.mutations(), 1);
}

#[actix_web::test]
async fn redelivery_mutates_once() {
    let store = Arc::new(MemoryStore::new());
    let app = billing_app!(store.clone(), Arc::new(MockProvider::ok()));

    for _ in 0..2 {
        let req = paddle_request(&subscription_created("evt_1"), 0).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    assert_eq!(store.mutations(), 1);
}

#[actix_web::test]
async fn missing_signature_is_401_without_side_effects() {
    let store = Arc::new(MemoryStore::new());
    let app = billing_app!(store.clone(), Arc::new(MockProvider::ok()));

    let req = test::TestRequest::post()
        .uri("/api/webhooks/paddle")
        .set_json(subscription_created("evt_1"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.mutations(), 0);
}

#[actix_web::test]
async fn stale_signature_is_401() {
    let store = Arc::new(MemoryStore::new());
    let app = billing_app!(store.clone(), Arc::new(MockProvider::ok()));

    let req = paddle_request(&subscription_created("evt_1"), 181).to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert!(body["error"].as_str().unwrap().contains("Webhook expired"));
    assert!(store.subscription("u1").is_none());
}

#[actix_web::test]
async fn update_to_paused_keeps_other_fields() {
    let store = Arc::new(MemoryStore::new());
    let app = billing_app!(store.clone(), Arc::new(MockProvider::ok()));

    let req = paddle_request(&subscription_created("evt_1"), 0).to_request();
    test::call_service(&app, req).await;

    let mut paused = subscription_created("evt_2");
    paused["event_type"] = json!("subscription.updated");
    paused["data"]["status"] = json!("paused");
    let req = paddle_request(&paused, 0).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let row = store.subscription("u1").unwrap();
    assert_eq!(row.status, "paused");
    assert_eq!(row.plan_type, "monthly");
    assert_eq!(row.paddle_price_id.as_deref(), Some("p1"));
    assert!(!row.cancel_at_period_end);
}

#[actix_web::test]
async fn unknown_event_type_is_acknowledged() {
    let store = Arc::new(MemoryStore::new());
    let app = billing_app!(store.clone(), Arc::new(MockProvider::ok()));

    let event = json!({
        "event_id": "evt_9",
        "event_type": "customer.updated",
        "data": { "id": "ctm_1" }
    });
    let req = paddle_request(&event, 0).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["received"], true);
    assert_eq!(store.mutations(), 0);
}

#[actix_web::test]
async fn malformed_known_event_is_400_and_not_recorded() {
    let store = Arc::new(MemoryStore::new());
    let app = billing_app!(store.clone(), Arc::new(MockProvider::ok()));

    let broken = json!({
        "event_id": "evt_1",
        "event_type": "subscription.created",
        "data": { "status": "active" }
    });
    let res = test::call_service(&app, paddle_request(&broken, 0).to_request()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // the id was not burned by the rejected delivery
    let req = paddle_request(&subscription_created("evt_1"), 0).to_request();
    test::call_service(&app, req).await;
    assert_eq!(store.mutations(), 1);
}

#[actix_web::test]
async fn ledger_outage_does_not_block_reconciliation() {
    let store = Arc::new(MemoryStore::new().with_ledger_down());
    let app = billing_app!(store.clone(), Arc::new(MockProvider::ok()));

    let req = paddle_request(&subscription_created("evt_1"), 0).to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(store.subscription("u1").unwrap().status, "active");
}
