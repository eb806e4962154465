use async_trait::async_trait;
use event_booking_system::{
    models::event::{EventSearchQuery, EventSort},
    services::{booking_service::BookingService, event_service::EventService},
    utils::error::AppError,
};
use rust_decimal_macros::dec;
use sqlx::SqlitePool;
use test_context::{test_context, AsyncTestContext};

mod common {
    pub mod test_utils;
}
use common::test_utils::{
    insert_event, insert_user, set_loyalty_points, upcoming_date, EventSeed, TestDb, VERIFY_BASE_URL,
};

struct EventServiceContext {
    pool: SqlitePool,
    event_service: EventService,
    customer_id: i64,
    concert_id: i64,
}

#[async_trait]
impl AsyncTestContext for EventServiceContext {
    async fn setup() -> Self {
        let pool = TestDb::new_pool().await.expect("Failed to create test database");
        let customer_id = insert_user(&pool, "Eve Customer", "customer").await.unwrap();
        let organizer_id = insert_user(&pool, "Otto Organizer", "organizer").await.unwrap();

        let concert_id = insert_event(
            &pool,
            organizer_id,
            EventSeed {
                title: "Jazz Night",
                category: "Music",
                location: "Colombo",
                ticket_price: "2500",
                event_date: upcoming_date(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        insert_event(
            &pool,
            organizer_id,
            EventSeed {
                title: "Cricket Final",
                category: "Sports",
                location: "Kandy",
                ticket_price: "1500",
                event_date: upcoming_date(20),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        insert_event(
            &pool,
            organizer_id,
            EventSeed {
                title: "Book Fair",
                category: "Culture",
                location: "Colombo",
                ticket_price: "500",
                event_date: upcoming_date(5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        // already happened, never listed
        insert_event(
            &pool,
            organizer_id,
            EventSeed {
                title: "Last Year's Gala",
                event_date: upcoming_date(-365),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        sqlx::query("INSERT INTO event_images (event_id, image_url) VALUES (?, ?), (?, ?)")
            .bind(concert_id)
            .bind("/images/jazz-1.jpg")
            .bind(concert_id)
            .bind("/images/jazz-2.jpg")
            .execute(&pool)
            .await
            .unwrap();

        EventServiceContext {
            event_service: EventService::new(pool.clone()),
            pool,
            customer_id,
            concert_id,
        }
    }

    async fn teardown(self) {
        self.pool.close().await;
    }
}

fn titles(response: &event_booking_system::models::event::EventSearchResponse) -> Vec<&str> {
    response.events.iter().map(|e| e.title.as_str()).collect()
}

#[test_context(EventServiceContext)]
#[tokio::test]
async fn test_search_lists_upcoming_by_date(ctx: &mut EventServiceContext) {
    let response = ctx.event_service.search_events(EventSearchQuery::default()).await.unwrap();

    assert_eq!(response.count, 3);
    assert_eq!(titles(&response), vec!["Book Fair", "Jazz Night", "Cricket Final"]);
}

#[test_context(EventServiceContext)]
#[tokio::test]
async fn test_search_filters(ctx: &mut EventServiceContext) {
    let by_location = ctx
        .event_service
        .search_events(EventSearchQuery {
            location: Some("Colombo".into()),
            sort: EventSort::PriceDesc,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(titles(&by_location), vec!["Jazz Night", "Book Fair"]);

    let by_category = ctx
        .event_service
        .search_events(EventSearchQuery {
            category: Some("sports".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(titles(&by_category), vec!["Cricket Final"]);

    let by_price = ctx
        .event_service
        .search_events(EventSearchQuery {
            min_price: Some(dec!(1000)),
            max_price: Some(dec!(2000)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(titles(&by_price), vec!["Cricket Final"]);

    let by_text = ctx
        .event_service
        .search_events(EventSearchQuery {
            search: Some("jazz".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(titles(&by_text), vec!["Jazz Night"]);
    assert_eq!(by_text.events[0].images.len(), 2);
}

#[test_context(EventServiceContext)]
#[tokio::test]
async fn test_event_detail(ctx: &mut EventServiceContext) {
    let detail = ctx.event_service.get_event_detail(ctx.concert_id).await.unwrap();

    assert_eq!(detail.title, "Jazz Night");
    assert_eq!(detail.ticket_price, dec!(2500));
    assert_eq!(detail.available_tickets, 100);
    assert_eq!(detail.location.as_deref(), Some("Colombo"));
    assert_eq!(detail.category.as_deref(), Some("Music"));
    assert_eq!(detail.images, vec!["/images/jazz-1.jpg", "/images/jazz-2.jpg"]);

    let err = ctx.event_service.get_event_detail(9999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test_context(EventServiceContext)]
#[tokio::test]
async fn test_bookable_page(ctx: &mut EventServiceContext) {
    set_loyalty_points(&ctx.pool, ctx.customer_id, 75).await.unwrap();
    let booking_service = BookingService::new(ctx.pool.clone(), VERIFY_BASE_URL);

    let page = booking_service
        .get_bookable_page(ctx.concert_id, ctx.customer_id)
        .await
        .unwrap();
    assert_eq!(page.available_tickets, 100);
    assert_eq!(page.ticket_price, dec!(2500));
    assert_eq!(page.loyalty_balance, 75);
    assert_eq!(page.event.id, ctx.concert_id);
}
