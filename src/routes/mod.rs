pub mod booking_route;
pub mod event_route;
pub mod organizer_route;
pub mod promotion_route;
pub mod ticket_route;
