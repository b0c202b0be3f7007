use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::domain::{
    DataAccessError, Entity, IsoDateTime, Reservation, ReservationDetails, ReservationError,
    ReservationId, ReservationRepository, ReservationRequest, ReservationSummary,
};

pub const NOT_FOUND_MESSAGE: &str = "This reservation id does not exists.";
pub const READ_FAILED_MESSAGE: &str = "Unable to complete the request. Try again later.";
pub const WRITE_FAILED_MESSAGE: &str = "Unable to complete your transaction, try again later.";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidRequest(#[from] ReservationError),
    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound,
    #[error("{message}")]
    StoreUnavailable {
        message: &'static str,
        #[source]
        source: DataAccessError,
    },
}

impl ServiceError {
    fn read_failed(source: DataAccessError) -> Self {
        error!("予約の取得に失敗しました: {}", source);
        Self::StoreUnavailable {
            message: READ_FAILED_MESSAGE,
            source,
        }
    }

    fn write_failed(source: DataAccessError) -> Self {
        error!("予約の保存に失敗しました: {}", source);
        Self::StoreUnavailable {
            message: WRITE_FAILED_MESSAGE,
            source,
        }
    }
}

/// 予約の検証・保存・照会を行うサービス
pub struct ReservationService<R> {
    repository: R,
}

impl<R> ReservationService<R>
where
    R: ReservationRepository + Send + Sync,
{
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> Result<Vec<ReservationSummary>, ServiceError> {
        self.repository
            .find_all()
            .await
            .map_err(ServiceError::read_failed)
    }

    pub async fn get(&self, id: ReservationId) -> Result<ReservationDetails, ServiceError> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(ServiceError::read_failed)?
            .ok_or(ServiceError::NotFound)
    }

    pub async fn create(&self, payload: &Value) -> Result<Reservation, ServiceError> {
        self.create_at(payload, IsoDateTime::now()).await
    }

    /// `now` を基準に検証して予約を作成する
    pub async fn create_at(
        &self,
        payload: &Value,
        now: IsoDateTime,
    ) -> Result<Reservation, ServiceError> {
        let new = ReservationRequest::parse(payload, now).map_err(|e| {
            debug!("不正な予約リクエスト: {}", e);
            e
        })?;
        let reservation = self
            .repository
            .create(new)
            .await
            .map_err(ServiceError::write_failed)?;
        info!(
            "予約を作成しました: id={} client_id={}",
            reservation.id(),
            reservation.client_id()
        );
        Ok(reservation)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::domain::{NewReservation, Person, PersonId, Version};

    #[derive(Default)]
    struct MemoryRepository {
        persons: Mutex<Vec<Person>>,
        reservations: Mutex<Vec<Reservation>>,
        unavailable: bool,
    }

    impl MemoryRepository {
        fn unavailable() -> Self {
            Self {
                unavailable: true,
                ..Default::default()
            }
        }

        fn check(&self) -> Result<(), DataAccessError> {
            if self.unavailable {
                return Err(DataAccessError::ConnectionError("store is down".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ReservationRepository for MemoryRepository {
        async fn find_all(&self) -> Result<Vec<ReservationSummary>, DataAccessError> {
            self.check()?;
            let persons = self.persons.lock().unwrap();
            Ok(self
                .reservations
                .lock()
                .unwrap()
                .iter()
                .map(|r| ReservationSummary {
                    id: r.id(),
                    name: persons[*r.client_id() as usize - 1].name().to_owned(),
                    size: r.party_size(),
                    time: r.start_datetime(),
                })
                .collect())
        }

        async fn find_by_id(
            &self,
            id: ReservationId,
        ) -> Result<Option<ReservationDetails>, DataAccessError> {
            self.check()?;
            let persons = self.persons.lock().unwrap();
            Ok(self
                .reservations
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id() == id)
                .map(|r| {
                    let client = &persons[*r.client_id() as usize - 1];
                    ReservationDetails {
                        id: r.id(),
                        name: client.name().to_owned(),
                        email: client.email().to_owned(),
                        size: r.party_size(),
                        time: r.start_datetime(),
                        note: r.note().to_owned(),
                    }
                }))
        }

        async fn create(&self, new: NewReservation) -> Result<Reservation, DataAccessError> {
            self.check()?;
            let mut persons = self.persons.lock().unwrap();
            let existing = persons
                .iter()
                .find(|p| p.matches(&new.client.name, &new.client.email))
                .map(|p| p.id());
            let client_id = match existing {
                Some(id) => id,
                None => {
                    let id = PersonId::from(persons.len() as i64 + 1);
                    persons.push(Person::new(
                        id,
                        Version::INITIAL,
                        new.client.name,
                        new.client.email,
                    ));
                    id
                }
            };
            let mut reservations = self.reservations.lock().unwrap();
            let reservation = Reservation::new(
                ReservationId::from(reservations.len() as i64 + 1),
                Version::INITIAL,
                client_id,
                new.start_datetime,
                new.party_size,
                new.note,
            );
            reservations.push(reservation.clone());
            Ok(reservation)
        }
    }

    fn now() -> IsoDateTime {
        "2030-01-01T12:00".parse().unwrap()
    }

    fn payload(name: &str, email: &str) -> Value {
        json!({"name": name, "email": email, "size": "2", "time": "2030-02-14T19:00"})
    }

    #[tokio::test]
    async fn created_reservation_is_listed() {
        let service = ReservationService::new(MemoryRepository::default());
        let created = service
            .create_at(&payload("Batman", "batman@wayneindustries.com"), now())
            .await
            .unwrap();
        assert_eq!(*created.id(), 1);
        assert_eq!(*created.version(), 1);

        let list = service.list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Batman");
        assert_eq!(*list[0].size, 2);

        let details = service.get(created.id()).await.unwrap();
        assert_eq!(details.email, "batman@wayneindustries.com");
        assert_eq!(details.note, "");
    }

    #[tokio::test]
    async fn same_client_is_reused_ignoring_case() {
        let service = ReservationService::new(MemoryRepository::default());
        let first = service
            .create_at(&payload("Batman", "batman@wayneindustries.com"), now())
            .await
            .unwrap();
        let second = service
            .create_at(&payload("BATMAN", "Batman@WayneIndustries.com"), now())
            .await
            .unwrap();
        assert_eq!(first.client_id(), second.client_id());
        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let service = ReservationService::new(MemoryRepository::default());
        let err = service.get(ReservationId::from(42)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
        assert_eq!(err.to_string(), NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_the_store() {
        let service = ReservationService::new(MemoryRepository::unavailable());
        let err = service
            .create_at(&json!({"name": "Batman"}), now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidRequest(ReservationError::MissingField)
        ));
    }

    #[tokio::test]
    async fn store_failures_are_reported_as_unavailable() {
        let service = ReservationService::new(MemoryRepository::unavailable());
        let err = service.list().await.unwrap_err();
        assert_eq!(err.to_string(), READ_FAILED_MESSAGE);
        let err = service.get(ReservationId::from(1)).await.unwrap_err();
        assert_eq!(err.to_string(), READ_FAILED_MESSAGE);
        let err = service
            .create_at(&payload("Batman", "batman@wayneindustries.com"), now())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::StoreUnavailable { .. }));
        assert_eq!(err.to_string(), WRITE_FAILED_MESSAGE);
    }
}
