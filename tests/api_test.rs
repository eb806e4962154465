use std::str::FromStr;

use async_trait::async_trait;
use event_booking_system::{
    build_rocket,
    config::AppConfig,
    models::user::Role,
    utils::jwt::generate_token,
};
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::{Client, LocalResponse};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use test_context::{test_context, AsyncTestContext};

mod common {
    pub mod test_utils;
}
use common::test_utils::{count_rows, insert_event, insert_user, EventSeed, TestDb, VERIFY_BASE_URL};

const JWT_SECRET: &str = "test-secret";

struct ApiContext {
    pool: SqlitePool,
    client: Client,
    customer_token: String,
    organizer_token: String,
    event_id: i64,
}

#[async_trait]
impl AsyncTestContext for ApiContext {
    async fn setup() -> Self {
        let pool = TestDb::new_pool().await.expect("Failed to create test database");
        let customer_id = insert_user(&pool, "Fay Customer", "customer").await.unwrap();
        let organizer_id = insert_user(&pool, "Finn Organizer", "organizer").await.unwrap();
        let event_id = insert_event(&pool, organizer_id, EventSeed::default()).await.unwrap();

        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            jwt_secret: JWT_SECRET.to_string(),
            ticket_verify_base_url: VERIFY_BASE_URL.to_string(),
        };
        let client = Client::tracked(build_rocket(pool.clone(), config))
            .await
            .expect("valid rocket instance");

        ApiContext {
            pool,
            client,
            customer_token: generate_token(customer_id, Role::Customer, JWT_SECRET).unwrap(),
            organizer_token: generate_token(organizer_id, Role::Organizer, JWT_SECRET).unwrap(),
            event_id,
        }
    }

    async fn teardown(self) {
        self.pool.close().await;
    }
}

fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {token}"))
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("Expected a decimal, got {other}"),
    }
}

async fn json_body(response: LocalResponse<'_>) -> Value {
    response.into_json::<Value>().await.expect("JSON body")
}

impl ApiContext {
    async fn create_booking(&self, token: &str, final_amount: &str) -> LocalResponse<'_> {
        self.client
            .post("/api/bookings")
            .header(bearer(token))
            .header(ContentType::JSON)
            .body(
                json!({
                    "event_id": self.event_id,
                    "number_of_tickets": 2,
                    "promo_code": null,
                    "loyalty_used": 0,
                    "total_amount": "2000",
                    "discount_amount": "0",
                    "final_amount": final_amount,
                })
                .to_string(),
            )
            .dispatch()
            .await
    }

    async fn booked_and_paid(&self) -> (i64, Value) {
        let created = json_body(self.create_booking(&self.customer_token, "2000").await).await;
        let booking_id = created["booking_id"].as_i64().unwrap();

        let response = self
            .client
            .post(format!("/api/bookings/{booking_id}/checkout"))
            .header(bearer(&self.customer_token))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        (booking_id, json_body(response).await)
    }
}

#[test_context(ApiContext)]
#[tokio::test]
async fn test_booking_requires_token(ctx: &mut ApiContext) {
    let response = ctx.client.get("/api/bookings").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);

    let response = ctx
        .client
        .get("/api/bookings")
        .header(Header::new("Authorization", "Bearer not-a-token"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[test_context(ApiContext)]
#[tokio::test]
async fn test_only_customers_book(ctx: &mut ApiContext) {
    let response = ctx.create_booking(&ctx.organizer_token, "2000").await;
    assert_eq!(response.status(), Status::Forbidden);
    assert_eq!(count_rows(&ctx.pool, "bookings").await.unwrap(), 0);
}

#[test_context(ApiContext)]
#[tokio::test]
async fn test_checkout_flow(ctx: &mut ApiContext) {
    let (booking_id, checkout) = ctx.booked_and_paid().await;

    assert_eq!(checkout["booking"]["booking_status"], "confirmed");
    assert_eq!(checkout["booking"]["payment_status"], "paid");
    assert_eq!(decimal(&checkout["booking"]["final_amount"]), dec!(2000));
    assert_eq!(checkout["tickets"].as_array().unwrap().len(), 2);

    let response = ctx
        .client
        .get(format!("/api/bookings/{booking_id}"))
        .header(bearer(&ctx.customer_token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let detail = json_body(response).await;
    assert_eq!(detail["event_title"], "Spring Concert");
    assert_eq!(detail["payment"]["payment_method"], "card");

    let response = ctx
        .client
        .get("/api/loyalty")
        .header(bearer(&ctx.customer_token))
        .dispatch()
        .await;
    let loyalty = json_body(response).await;
    assert_eq!(loyalty["balance"], 200);
}

#[test_context(ApiContext)]
#[tokio::test]
async fn test_amount_mismatch_is_unprocessable(ctx: &mut ApiContext) {
    let response = ctx.create_booking(&ctx.customer_token, "1999").await;
    assert_eq!(response.status(), Status::UnprocessableEntity);

    let body = json_body(response).await;
    assert_eq!(body["error"], "Amount calculation mismatch. Please try again.");
}

#[test_context(ApiContext)]
#[tokio::test]
async fn test_ticket_verification(ctx: &mut ApiContext) {
    let (_, checkout) = ctx.booked_and_paid().await;
    let number = checkout["tickets"][0]["ticket_number"].as_str().unwrap().to_string();

    let response = ctx
        .client
        .get(format!("/Tickets/Verify/{number}"))
        .header(bearer(&ctx.organizer_token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let verification = json_body(response).await;
    assert_eq!(verification["admissible"], true);

    let response = ctx
        .client
        .get(format!("/Tickets/Verify/{number}"))
        .header(bearer(&ctx.customer_token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);
}

#[test_context(ApiContext)]
#[tokio::test]
async fn test_organizer_status_update(ctx: &mut ApiContext) {
    let (booking_id, _) = ctx.booked_and_paid().await;
    let path = format!("/api/organizer/bookings/{booking_id}/status");

    let response = ctx
        .client
        .put(path.as_str())
        .header(bearer(&ctx.organizer_token))
        .header(ContentType::JSON)
        .body(json!({ "status": "pending" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    let response = ctx
        .client
        .put(path.as_str())
        .header(bearer(&ctx.organizer_token))
        .header(ContentType::JSON)
        .body(json!({ "status": "Canceled" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(json_body(response).await["booking_status"], "cancelled");

    let response = ctx
        .client
        .get(format!("/api/organizer/events/{}/bookings", ctx.event_id))
        .header(bearer(&ctx.organizer_token))
        .dispatch()
        .await;
    let summary = json_body(response).await;
    assert_eq!(summary["tickets_sold"], 0);
    assert_eq!(summary["bookings"][0]["tickets"][0]["status"], "cancelled");
}

#[test_context(ApiContext)]
#[tokio::test]
async fn test_public_endpoints(ctx: &mut ApiContext) {
    let response = ctx.client.get("/api/events/search?sort=price_desc").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("*")
    );
    assert_eq!(json_body(response).await["count"], 1);

    let response = ctx.client.get("/api/events/search?sort=sideways").dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);

    let response = ctx.client.get("/api/promotions/validate?code=NOPE").dispatch().await;
    assert_eq!(json_body(response).await["valid"], false);

    let response = ctx.client.get("/api/openapi.json").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
}
