use std::env;

use event_booking_system::config::{AppConfig, ConfigError};

// Single test so the environment is never mutated concurrently
#[test]
fn test_config_from_env() -> anyhow::Result<()> {
    env::remove_var("JWT_SECRET");
    assert!(matches!(AppConfig::from_env(), Err(ConfigError::Missing("JWT_SECRET"))));

    env::set_var("JWT_SECRET", "s3cret");
    env::remove_var("DATABASE_URL");
    env::remove_var("DATABASE_MAX_CONNECTIONS");
    env::remove_var("TICKET_VERIFY_BASE_URL");

    let config = AppConfig::from_env()?;
    assert_eq!(config.database_url, "sqlite://event_booking.db");
    assert_eq!(config.database_max_connections, 10);
    assert_eq!(config.jwt_secret, "s3cret");
    assert_eq!(config.ticket_verify_base_url, "http://localhost:8000");

    env::set_var("DATABASE_MAX_CONNECTIONS", "many");
    assert!(matches!(
        AppConfig::from_env(),
        Err(ConfigError::Invalid {
            key: "DATABASE_MAX_CONNECTIONS",
            ..
        })
    ));

    env::set_var("DATABASE_MAX_CONNECTIONS", "4");
    env::set_var("TICKET_VERIFY_BASE_URL", "https://tickets.example");
    let config = AppConfig::from_env()?;
    assert_eq!(config.database_max_connections, 4);
    assert_eq!(config.ticket_verify_base_url, "https://tickets.example");
    Ok(())
}
