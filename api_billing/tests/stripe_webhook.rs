#[macro_use]
mod support;

use std::sync::Arc;

use actix_web::{http::StatusCode, test};
use db::memory::MemoryStore;
use serde_json::{Value, json};
use support::{
    MockProvider, stripe_checkout_completed, stripe_request, stripe_subscription_event,
};

#[actix_web::test]
async fn missing_stripe_signature_is_400() {
    let store = Arc::new(MemoryStore::new());
    let app = billing_app!(store.clone(), Arc::new(MockProvider::ok()));

    let req = test::TestRequest::post()
        .uri("/api/webhooks/stripe")
        .set_payload(r#"{"id":"evt_1","type":"checkout.session.completed"}"#)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.mutations(), 0);
}

#[actix_web::test]
async fn forged_stripe_signature_is_400() {
    let store = Arc::new(MemoryStore::new());
    let app = billing_app!(store.clone(), Arc::new(MockProvider::ok()));

    let req = test::TestRequest::post()
        .uri("/api/webhooks/stripe")
        .insert_header(("stripe-signature", "t=1700000000,v1=deadbeef"))
        .set_payload(r#"{"id":"evt_1","type":"checkout.session.completed"}"#)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.mutations(), 0);
}

#[actix_web::test]
async fn payment_checkout_records_one_time_purchase() {
    let store = Arc::new(MemoryStore::new());
    let app = billing_app!(store.clone(), Arc::new(MockProvider::ok()));

    let event = stripe_checkout_completed("evt_1", "payment", None);
    let body: Value = test::call_and_read_body_json(&app, stripe_request(&event).to_request()).await;

    assert_eq!(body, json!({ "received": true }));
    let row = store.subscription("u1").expect("row for u1");
    assert_eq!(row.provider, "stripe");
    assert_eq!(row.plan_type, "one_time");
    assert_eq!(row.status, "active");
    assert_eq!(row.price_amount, 4900);
    assert_eq!(row.stripe_checkout_session_id.as_deref(), Some("cs_test_1"));
    assert_eq!(row.stripe_customer_id.as_deref(), Some("cus_1"));
    assert!(row.stripe_subscription_id.is_none());
}

#[actix_web::test]
async fn subscription_checkout_falls_back_to_metadata_user() {
    let store = Arc::new(MemoryStore::new());
    let app = billing_app!(store.clone(), Arc::new(MockProvider::ok()));

    let mut event = stripe_checkout_completed("evt_1", "subscription", Some("sub_s1"));
    event["data"]["object"]["client_reference_id"] = Value::Null;
    let res = test::call_service(&app, stripe_request(&event).to_request()).await;

    assert_eq!(res.status(), StatusCode::OK);
    let row = store.subscription("u1").expect("row from metadata.userId");
    assert_eq!(row.plan_type, "monthly");
    assert_eq!(row.stripe_subscription_id.as_deref(), Some("sub_s1"));
    assert_eq!(row.price_amount, 1900);
}

#[actix_web::test]
async fn stripe_redelivery_mutates_once() {
    let store = Arc::new(MemoryStore::new());
    let app = billing_app!(store.clone(), Arc::new(MockProvider::ok()));

    let event = stripe_checkout_completed("evt_1", "payment", None);
    for _ in 0..2 {
        let res = test::call_service(&app, stripe_request(&event).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    assert_eq!(store.mutations(), 1);
}

#[actix_web::test]
async fn subscription_deleted_cancels_row() {
    let store = Arc::new(MemoryStore::new());
    let app = billing_app!(store.clone(), Arc::new(MockProvider::ok()));

    let checkout = stripe_checkout_completed("evt_1", "subscription", Some("sub_s1"));
    test::call_service(&app, stripe_request(&checkout).to_request()).await;

    let deleted = stripe_subscription_event(
        "evt_2",
        "customer.subscription.deleted",
        "sub_s1",
        "canceled",
    );
    let res = test::call_service(&app, stripe_request(&deleted).to_request()).await;

    assert_eq!(res.status(), StatusCode::OK);
    let row = store.subscription("u1").unwrap();
    assert_eq!(row.status, "canceled");
    assert_eq!(row.plan_type, "monthly");
    assert_eq!(store.mutations(), 2);
}
