use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use event_booking_system::build_rocket;
use event_booking_system::config::AppConfig;
use event_booking_system::db::Database;

#[rocket::launch]
async fn rocket() -> _ {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("event_booking_system=info,rocket=warn")),
        )
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Connect to the database
    let database = Database::new(&config.database_url, config.database_max_connections)
        .await
        .expect("Failed to connect to database");
    database.migrate().await.expect("Failed to run migrations");

    tracing::info!(database = %config.database_url, "booking service starting");
    build_rocket(database.get_pool().clone(), config)
}
