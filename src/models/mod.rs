pub mod booking;
pub mod event;
pub mod loyalty;
pub mod payment;
pub mod promotion;
pub mod ticket;
pub mod user;
