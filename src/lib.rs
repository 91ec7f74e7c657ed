//! Passenger records and the notifications delivered to them.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::errors::{AppError, ConfigError, StorageError};
pub use application::services::PassengerService;
pub use domain::entities::{CreatePassengerDto, Notification, NotificationDto, Passenger};
pub use domain::traits::PassengerRepository;
