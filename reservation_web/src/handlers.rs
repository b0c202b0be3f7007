use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use reservation::domain::{ReservationDetails, ReservationId, ReservationSummary};
use serde::Serialize;
use serde_json::Value;

use crate::{AppError, AppState, SERVICE_NAME};

#[derive(Debug, Serialize)]
pub struct VersionInfo {
    service: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Created {
    error: bool,
    msg: &'static str,
    code: u16,
}

pub async fn version() -> Json<VersionInfo> {
    Json(VersionInfo {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn list_reservations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReservationSummary>>, AppError> {
    Ok(Json(state.service().list().await?))
}

pub async fn get_reservation(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<ReservationDetails>, AppError> {
    // パスが UTF-8 として解釈できない場合も存在しない URL として扱う
    let Path(id) = id.map_err(|_| AppError::route_not_found())?;
    let id = parse_id(&id).ok_or_else(AppError::route_not_found)?;
    Ok(Json(state.service().get(id).await?))
}

pub async fn create_reservation(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Created>), AppError> {
    // 不正な JSON は空のリクエストとして扱い、必須項目エラーにする
    let payload = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    state.service().create(&payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(Created {
            error: false,
            msg: "Created",
            code: StatusCode::CREATED.as_u16(),
        }),
    ))
}

pub async fn route_not_found() -> AppError {
    AppError::route_not_found()
}

pub async fn method_not_allowed() -> AppError {
    AppError::method_not_allowed()
}

/// 0 以上の10進整数のみを予約IDとして受け付ける
fn parse_id(segment: &str) -> Option<ReservationId> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse::<i64>().ok().map(ReservationId::from)
}
