use std::sync::Arc;

use crate::application::errors::StorageError;
use crate::domain::entities::{CreatePassengerDto, Notification, NotificationDto, Passenger};
use crate::domain::traits::PassengerRepository;

/// Use-case facade over a passenger repository.
///
/// Storage failures are passed through untouched; absence stays `None`,
/// `false` or an empty list so the caller decides how to report it.
#[derive(Clone)]
pub struct PassengerService {
    repository: Arc<dyn PassengerRepository>,
}

impl PassengerService {
    pub fn new(repository: Arc<dyn PassengerRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_all(&self) -> Result<Vec<Passenger>, StorageError> {
        self.repository.list_all().await
    }

    pub async fn get_passenger(&self, id: i64) -> Result<Option<Passenger>, StorageError> {
        tracing::debug!(passenger_id = id, "Fetching passenger");
        self.repository.find_by_id(id).await
    }

    pub async fn get_passengers_for_flight(
        &self,
        flight_id: i64,
    ) -> Result<Vec<Passenger>, StorageError> {
        tracing::debug!(flight_id, "Fetching passengers for flight");
        self.repository.find_passengers_for_flight(flight_id).await
    }

    pub async fn create_passenger(
        &self,
        dto: CreatePassengerDto,
    ) -> Result<Passenger, StorageError> {
        let passenger = self.repository.persist(Passenger::from_dto(dto)).await?;
        tracing::info!(
            passenger_id = ?passenger.id,
            flight_id = passenger.flight_id,
            "Passenger created"
        );
        Ok(passenger)
    }

    pub async fn delete_passenger(&self, id: i64) -> Result<bool, StorageError> {
        let deleted = self.repository.delete_by_id(id).await?;
        tracing::info!(passenger_id = id, deleted, "Delete passenger");
        Ok(deleted)
    }

    pub async fn delete_all_passengers(&self) -> Result<u64, StorageError> {
        let count = self.repository.delete_all().await?;
        tracing::info!(count, "Deleted all passengers");
        Ok(count)
    }

    pub async fn add_notification_by_flight_id(
        &self,
        flight_id: i64,
        notification: Notification,
    ) -> Result<(), StorageError> {
        tracing::info!(flight_id, message = %notification.message, "Broadcasting notification");
        self.repository.add_notification_by_flight_id(flight_id, &notification).await
    }

    pub async fn find_notifications_for_passenger(
        &self,
        id: i64,
    ) -> Result<Vec<Notification>, StorageError> {
        self.repository.find_notifications_for_passenger(id).await
    }

    pub async fn find_notifications_with_email(
        &self,
    ) -> Result<Vec<NotificationDto>, StorageError> {
        self.repository.find_notifications_with_email().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Canned repository that records every call it receives.
    #[derive(Default)]
    struct StubRepository {
        passengers: Vec<Passenger>,
        notifications: Vec<Notification>,
        delete_result: bool,
        delete_all_result: u64,
        calls: Mutex<Vec<String>>,
    }

    impl StubRepository {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PassengerRepository for StubRepository {
        async fn persist(&self, passenger: Passenger) -> Result<Passenger, StorageError> {
            self.record(format!("persist {}", passenger.email));
            Ok(passenger.with_id(1))
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<Passenger>, StorageError> {
            self.record(format!("find_by_id {}", id));
            Ok(self.passengers.iter().find(|p| p.id == Some(id)).cloned())
        }

        async fn delete_by_id(&self, id: i64) -> Result<bool, StorageError> {
            self.record(format!("delete_by_id {}", id));
            Ok(self.delete_result)
        }

        async fn delete_all(&self) -> Result<u64, StorageError> {
            self.record("delete_all".to_string());
            Ok(self.delete_all_result)
        }

        async fn list_all(&self) -> Result<Vec<Passenger>, StorageError> {
            self.record("list_all".to_string());
            Ok(self.passengers.clone())
        }

        async fn find_passengers_for_flight(
            &self,
            flight_id: i64,
        ) -> Result<Vec<Passenger>, StorageError> {
            self.record(format!("find_passengers_for_flight {}", flight_id));
            Ok(self.passengers.clone())
        }

        async fn find_notifications_for_passenger(
            &self,
            passenger_id: i64,
        ) -> Result<Vec<Notification>, StorageError> {
            self.record(format!("find_notifications_for_passenger {}", passenger_id));
            Ok(self.notifications.clone())
        }

        async fn add_notification_by_flight_id(
            &self,
            flight_id: i64,
            notification: &Notification,
        ) -> Result<(), StorageError> {
            self.record(format!(
                "add_notification_by_flight_id {} {}",
                flight_id, notification.message
            ));
            Ok(())
        }

        async fn find_notifications_with_email(
            &self,
        ) -> Result<Vec<NotificationDto>, StorageError> {
            self.record("find_notifications_with_email".to_string());
            Ok(Vec::new())
        }
    }

    /// Always fails, to check that errors are not swallowed.
    struct FailingRepository;

    #[async_trait]
    impl PassengerRepository for FailingRepository {
        async fn persist(&self, _passenger: Passenger) -> Result<Passenger, StorageError> {
            Err(StorageError::Poisoned)
        }
        async fn find_by_id(&self, _id: i64) -> Result<Option<Passenger>, StorageError> {
            Err(StorageError::Poisoned)
        }
        async fn delete_by_id(&self, _id: i64) -> Result<bool, StorageError> {
            Err(StorageError::Poisoned)
        }
        async fn delete_all(&self) -> Result<u64, StorageError> {
            Err(StorageError::Poisoned)
        }
        async fn list_all(&self) -> Result<Vec<Passenger>, StorageError> {
            Err(StorageError::Poisoned)
        }
        async fn find_passengers_for_flight(
            &self,
            _flight_id: i64,
        ) -> Result<Vec<Passenger>, StorageError> {
            Err(StorageError::Poisoned)
        }
        async fn find_notifications_for_passenger(
            &self,
            _id: i64,
        ) -> Result<Vec<Notification>, StorageError> {
            Err(StorageError::Poisoned)
        }
        async fn add_notification_by_flight_id(
            &self,
            _flight_id: i64,
            _notification: &Notification,
        ) -> Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
        async fn find_notifications_with_email(
            &self,
        ) -> Result<Vec<NotificationDto>, StorageError> {
            Err(StorageError::Poisoned)
        }
    }

    fn test_passenger() -> Passenger {
        Passenger::new("John", "Doe", "john@gmail.com", 1).with_id(1)
    }

    fn test_dto() -> CreatePassengerDto {
        CreatePassengerDto {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john@gmail.com".to_string(),
            flight_id: 1,
        }
    }

    fn service_with(stub: StubRepository) -> (PassengerService, Arc<StubRepository>) {
        let stub = Arc::new(stub);
        (PassengerService::new(stub.clone()), stub)
    }

    #[tokio::test]
    async fn test_list_all() {
        let (service, _) = service_with(StubRepository {
            passengers: vec![test_passenger()],
            ..Default::default()
        });

        let passengers = service.list_all().await.unwrap();
        assert_eq!(passengers, vec![test_passenger()]);
    }

    #[tokio::test]
    async fn test_list_all_empty() {
        let (service, _) = service_with(StubRepository::default());
        assert!(service.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_existing_passenger() {
        let (service, _) = service_with(StubRepository {
            passengers: vec![test_passenger()],
            ..Default::default()
        });

        let found = service.get_passenger(1).await.unwrap();
        assert_eq!(found, Some(test_passenger()));
    }

    #[tokio::test]
    async fn test_get_missing_passenger_is_none() {
        let (service, _) = service_with(StubRepository::default());
        assert_eq!(service.get_passenger(-1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_passengers_for_flight() {
        let (service, stub) = service_with(StubRepository {
            passengers: vec![test_passenger()],
            ..Default::default()
        });

        let passengers = service.get_passengers_for_flight(123).await.unwrap();
        assert_eq!(passengers.len(), 1);
        assert_eq!(stub.calls(), vec!["find_passengers_for_flight 123"]);
    }

    #[tokio::test]
    async fn test_create_passenger_persists_converted_dto() {
        let (service, stub) = service_with(StubRepository::default());

        let created = service.create_passenger(test_dto()).await.unwrap();
        assert_eq!(created, Passenger::from_dto(test_dto()).with_id(1));
        assert_eq!(stub.calls(), vec!["persist john@gmail.com"]);
    }

    #[tokio::test]
    async fn test_delete_passenger_passes_result_through() {
        let (service, _) = service_with(StubRepository {
            delete_result: true,
            ..Default::default()
        });
        assert!(service.delete_passenger(1).await.unwrap());

        let (service, _) = service_with(StubRepository::default());
        assert!(!service.delete_passenger(-1).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_all_passengers_returns_count() {
        let (service, _) = service_with(StubRepository {
            delete_all_result: 1,
            ..Default::default()
        });
        assert_eq!(service.delete_all_passengers().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_add_notification_then_find() {
        let notification = Notification::new("Test message");
        let (service, stub) = service_with(StubRepository {
            notifications: vec![notification.clone()],
            ..Default::default()
        });

        service.add_notification_by_flight_id(123, notification.clone()).await.unwrap();
        let found = service.find_notifications_for_passenger(1).await.unwrap();

        assert!(found.iter().any(|n| n.message == notification.message));
        assert_eq!(
            stub.calls(),
            vec![
                "add_notification_by_flight_id 123 Test message",
                "find_notifications_for_passenger 1",
            ]
        );
    }

    #[tokio::test]
    async fn test_storage_errors_propagate() {
        let service = PassengerService::new(Arc::new(FailingRepository));

        assert!(matches!(service.list_all().await, Err(StorageError::Poisoned)));
        assert!(matches!(service.create_passenger(test_dto()).await, Err(StorageError::Poisoned)));
        assert!(matches!(service.delete_passenger(1).await, Err(StorageError::Poisoned)));
        assert!(matches!(
            service.add_notification_by_flight_id(1, Notification::new("m")).await,
            Err(StorageError::Poisoned)
        ));
    }
}
