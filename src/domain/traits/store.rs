use async_trait::async_trait;

use crate::application::errors::StorageError;
use crate::domain::entities::{Notification, NotificationDto, Passenger};

/// Storage abstraction for passengers and their notifications.
///
/// Absence is never an error: lookups yield `None`, empty `Vec`s or `false`.
/// Only store failures come back as `Err`.
#[async_trait]
pub trait PassengerRepository: Send + Sync {
    /// Insert or update a passenger together with its attached notifications.
    /// Returns the stored passenger with every id populated.
    async fn persist(&self, passenger: Passenger) -> Result<Passenger, StorageError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Passenger>, StorageError>;

    /// Delete a passenger and every notification it owns.
    /// Returns `false` when there was nothing to delete.
    async fn delete_by_id(&self, id: i64) -> Result<bool, StorageError>;

    /// Delete every passenger (and so every notification). Returns the number
    /// of passengers removed.
    async fn delete_all(&self) -> Result<u64, StorageError>;

    async fn list_all(&self) -> Result<Vec<Passenger>, StorageError>;

    async fn find_passengers_for_flight(
        &self,
        flight_id: i64,
    ) -> Result<Vec<Passenger>, StorageError>;

    /// Notifications owned by a passenger. A missing passenger and a passenger
    /// without notifications both yield an empty list.
    async fn find_notifications_for_passenger(
        &self,
        passenger_id: i64,
    ) -> Result<Vec<Notification>, StorageError>;

    /// Store an independent copy of `notification` for every passenger on the
    /// flight. No matching passenger means nothing is written.
    async fn add_notification_by_flight_id(
        &self,
        flight_id: i64,
        notification: &Notification,
    ) -> Result<(), StorageError>;

    /// Every stored notification paired with its owner's email.
    async fn find_notifications_with_email(&self) -> Result<Vec<NotificationDto>, StorageError>;
}
