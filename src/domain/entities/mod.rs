//! Domain entities - Passengers and the notifications they own

pub mod notification;
pub mod passenger;

pub use notification::{Notification, NotificationDto};
pub use passenger::{CreatePassengerDto, Passenger};
