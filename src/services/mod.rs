pub mod booking_service;
pub mod event_service;
pub mod loyalty_service;
pub mod organizer_service;
pub mod promotion_service;
pub mod ticket_service;
