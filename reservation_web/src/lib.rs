pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use reservation::{
    infrastructure::{SqliteReservationRepository, SqliteStore},
    service::ReservationService,
};

pub use self::error::AppError;

pub const SERVICE_NAME: &str = "reservation";

#[derive(Clone)]
pub struct AppState {
    service: Arc<ReservationService<SqliteReservationRepository>>,
}

impl AppState {
    pub fn new(store: &SqliteStore) -> Self {
        Self {
            service: Arc::new(ReservationService::new(store.reservations())),
        }
    }

    pub fn service(&self) -> &ReservationService<SqliteReservationRepository> {
        &self.service
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/version",
            get(handlers::version).fallback(handlers::method_not_allowed),
        )
        .route(
            "/reservations",
            get(handlers::list_reservations)
                .post(handlers::create_reservation)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/reservations/:id",
            get(handlers::get_reservation).fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::route_not_found)
        .with_state(state)
}
