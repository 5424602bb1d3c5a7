use std::sync::Arc;

use actix_web::{App, test, web};
use common::{
    env_config::Config,
    jwt::{ClaimsSpec, generate_jwt},
};
use db::{BillingStore, UsageStore, memory::MemoryStore};
use serde_json::{Value, json};

const JWT_SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

fn bearer(user_id: &str) -> (&'static str, String) {
    let token = generate_jwt(
        ClaimsSpec {
            user_id: user_id.to_string(),
            email: None,
        },
        JWT_SECRET,
        "authenticated",
        1,
    )
    .unwrap();
    ("Authorization", format!("Bearer {}", token))
}

macro_rules! tools_app {
    ($store:expr) => {{
        let config = Arc::new(Config {
            jwt_secret: JWT_SECRET.to_string(),
            free_tier_limit: 2,
            ..Default::default()
        });
        let usage: Arc<dyn UsageStore> = $store.clone();
        let billing: Arc<dyn BillingStore> = $store.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::new(usage))
                .app_data(web::Data::new(billing))
                .app_data(web::Data::new(config.clone()))
                .service(
                    web::scope("/api/dashboard")
                        .wrap(api_auth::auth_middleware(config))
                        .service(api_tools::mount_tools())
                        .service(api_tools::mount_usage()),
                ),
        )
        .await
    }};
}

#[actix_web::test]
async fn pricing_returns_projection_and_records_usage() {
    let store = Arc::new(MemoryStore::new());
    let app = tools_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/dashboard/tools/pricing")
        .insert_header(bearer("u1"))
        .set_json(json!({
            "pricing_model": "one_time",
            "one_time_price": 49,
            "target_customers": 100,
            "monthly_churn_rate": 5,
            "conversion_rate": 2.5,
            "monthly_costs": 50,
            "customer_acquisition_cost": 10
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["one_time"]["total_revenue"], 4900);
    assert!(body.get("subscription").is_none());

    let counts = store.usage_counts("u1").await.unwrap();
    assert_eq!(counts.get("pricing_calculator"), Some(&1));
}

#[actix_web::test]
async fn pricing_rejects_negative_churn() {
    let store = Arc::new(MemoryStore::new());
    let app = tools_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/dashboard/tools/pricing")
        .insert_header(bearer("u1"))
        .set_json(json!({
            "pricing_model": "subscription",
            "monthly_price": 19,
            "target_customers": 100,
            "monthly_churn_rate": -1,
            "monthly_costs": 50,
            "customer_acquisition_cost": 10
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn launch_checklist_tracks_completion() {
    let store = Arc::new(MemoryStore::new());
    let app = tools_app!(store);

    let req = test::TestRequest::put()
        .uri("/api/dashboard/tools/launch/3")
        .insert_header(bearer("u1"))
        .set_json(json!({ "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get()
        .uri("/api/dashboard/tools/launch")
        .insert_header(bearer("u1"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total_tasks"], 30);
    assert_eq!(body["completed_tasks"], 1);
    assert_eq!(body["progress"], 3);
    assert_eq!(body["tasks"][2]["day"], 3);
    assert_eq!(body["tasks"][2]["completed"], true);
    assert_eq!(body["tasks"][25]["category"], "launch");

    // another user sees a fresh checklist
    let req = test::TestRequest::get()
        .uri("/api/dashboard/tools/launch")
        .insert_header(bearer("u2"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["completed_tasks"], 0);
}

#[actix_web::test]
async fn launch_day_outside_checklist_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let app = tools_app!(store);

    let req = test::TestRequest::put()
        .uri("/api/dashboard/tools/launch/31")
        .insert_header(bearer("u1"))
        .set_json(json!({ "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn usage_gate_follows_free_tier_limit() {
    let store = Arc::new(MemoryStore::new());
    let app = tools_app!(store);

    for expected in [201, 201] {
        let req = test::TestRequest::post()
            .uri("/api/dashboard/usage/marketing_assets")
            .insert_header(bearer("u1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
    }

    let req = test::TestRequest::get()
        .uri("/api/dashboard/usage/marketing_assets/gate")
        .insert_header(bearer("u1"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body,
        json!({
            "allowed": false,
            "used": 2,
            "limit": 2,
            "remaining": 0,
            "near_limit": true,
            "limit_reached": true,
            "is_pro": false
        })
    );

    let req = test::TestRequest::get()
        .uri("/api/dashboard/usage/stats")
        .insert_header(bearer("u1"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["tools_used"], 1);
    assert_eq!(body["total_tools"], 5);
    let days_active = body["days_active"].as_i64().unwrap();
    assert!(days_active <= 1);
    assert_eq!(body["days_until_launch"], 30 - days_active);
}

#[actix_web::test]
async fn unknown_tool_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let app = tools_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/dashboard/usage/crystal_ball")
        .insert_header(bearer("u1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Bad request: Unknown tool: crystal_ball");
}

#[actix_web::test]
async fn tools_require_authentication() {
    let store = Arc::new(MemoryStore::new());
    let app = tools_app!(store);

    let req = test::TestRequest::get()
        .uri("/api/dashboard/usage/stats")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}
