use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::domain::{
    DataAccessError, IsoDateTime, NewPerson, NewReservation, PartySize, PersonId, Reservation,
    ReservationDetails, ReservationId, ReservationRepository, ReservationSummary, Version,
};

#[derive(Clone, Debug)]
pub struct SqliteReservationRepository {
    pool: SqlitePool,
}

impl SqliteReservationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SummaryRow {
    id: i64,
    name: String,
    party_size: i64,
    start_datetime: NaiveDateTime,
}

#[derive(FromRow)]
struct DetailsRow {
    id: i64,
    name: String,
    email: String,
    party_size: i64,
    start_datetime: NaiveDateTime,
    note: String,
}

fn party_size(size: i64) -> Result<PartySize, DataAccessError> {
    PartySize::new(size).map_err(|e| DataAccessError::QueryError(Box::new(e)))
}

impl TryFrom<SummaryRow> for ReservationSummary {
    type Error = DataAccessError;

    fn try_from(value: SummaryRow) -> Result<Self, Self::Error> {
        Ok(ReservationSummary {
            id: ReservationId::from(value.id),
            name: value.name,
            size: party_size(value.party_size)?,
            time: IsoDateTime::from(value.start_datetime),
        })
    }
}

impl TryFrom<DetailsRow> for ReservationDetails {
    type Error = DataAccessError;

    fn try_from(value: DetailsRow) -> Result<Self, Self::Error> {
        Ok(ReservationDetails {
            id: ReservationId::from(value.id),
            name: value.name,
            email: value.email,
            size: party_size(value.party_size)?,
            time: IsoDateTime::from(value.start_datetime),
            note: value.note,
        })
    }
}

const FIND_PERSON: &str =
    "SELECT id FROM person WHERE name = ? AND email = ? ORDER BY id LIMIT 1";

/// 既存の顧客を探し、いなければ作成する。
/// 同時に同じ顧客が作成された場合は一意制約により既存の行を返す。
async fn resolve_client(
    conn: &mut SqliteConnection,
    client: &NewPerson,
) -> Result<PersonId, sqlx::Error> {
    let found = sqlx::query_scalar::<_, i64>(FIND_PERSON)
        .bind(&client.name)
        .bind(&client.email)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(id) = found {
        return Ok(PersonId::from(id));
    }
    sqlx::query("INSERT INTO person (version, name, email) VALUES (?, ?, ?) ON CONFLICT DO NOTHING")
        .bind(*Version::INITIAL)
        .bind(&client.name)
        .bind(&client.email)
        .execute(&mut *conn)
        .await?;
    let id = sqlx::query_scalar::<_, i64>(FIND_PERSON)
        .bind(&client.name)
        .bind(&client.email)
        .fetch_one(&mut *conn)
        .await?;
    debug!("顧客を作成しました: {}", id);
    Ok(PersonId::from(id))
}

#[async_trait]
impl ReservationRepository for SqliteReservationRepository {
    async fn find_all(&self) -> Result<Vec<ReservationSummary>, DataAccessError> {
        sqlx::query_as::<_, SummaryRow>(
            "SELECT r.id, p.name, r.party_size, r.start_datetime \
             FROM reservation r JOIN person p ON p.id = r.client_id \
             ORDER BY r.id",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ReservationSummary::try_from)
        .collect()
    }

    async fn find_by_id(
        &self,
        id: ReservationId,
    ) -> Result<Option<ReservationDetails>, DataAccessError> {
        sqlx::query_as::<_, DetailsRow>(
            "SELECT r.id, p.name, p.email, r.party_size, r.start_datetime, r.note \
             FROM reservation r JOIN person p ON p.id = r.client_id \
             WHERE r.id = ?",
        )
        .bind(*id)
        .fetch_optional(&self.pool)
        .await?
        .map(ReservationDetails::try_from)
        .transpose()
    }

    async fn create(&self, new: NewReservation) -> Result<Reservation, DataAccessError> {
        // 書き込みロックを先に取り、同時に作成する他の接続は busy_timeout で待たせる。
        // コミット前にエラーで抜けた場合、トランザクションは drop 時にロールバックされる
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        let client_id = resolve_client(&mut tx, &new.client).await?;
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO reservation (version, client_id, start_datetime, party_size, note) \
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(*Version::INITIAL)
        .bind(*client_id)
        .bind(new.start_datetime.into_inner())
        .bind(*new.party_size)
        .bind(&new.note)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Reservation::new(
            ReservationId::from(id),
            Version::INITIAL,
            client_id,
            new.start_datetime,
            new.party_size,
            new.note,
        ))
    }
}
