use async_trait::async_trait;
use derive_more::{Deref, Display, Error, From};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, DisplayFromStr};

use crate::domain::{DataAccessError, Entity, Id, IsoDateTime, NewPerson, PersonId, Version};

/// 予約リポジトリ
#[async_trait]
pub trait ReservationRepository {
    /// 全ての予約の概要を登録順に取得する
    async fn find_all(&self) -> Result<Vec<ReservationSummary>, DataAccessError>;
    /// IDで予約の詳細を検索する
    async fn find_by_id(
        &self,
        id: ReservationId,
    ) -> Result<Option<ReservationDetails>, DataAccessError>;
    /// 顧客を解決または作成し、予約を一つのトランザクションで保存する
    async fn create(&self, new: NewReservation) -> Result<Reservation, DataAccessError>;
}

/// 予約ID
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Deref, Default,
)]
pub struct ReservationId(i64);

impl Id for ReservationId {
    type Inner = i64;
}

/// 人数
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, Deref)]
pub struct PartySize(i64);

impl PartySize {
    pub fn new(size: i64) -> Result<Self, ReservationError> {
        if size < 1 {
            return Err(ReservationError::PartySizeTooSmall);
        }
        Ok(Self(size))
    }
}

/// 予約エンティティ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    id: ReservationId,
    version: Version,
    client_id: PersonId,
    start_datetime: IsoDateTime,
    party_size: PartySize,
    note: String,
}

impl Reservation {
    pub fn new(
        id: ReservationId,
        version: Version,
        client_id: PersonId,
        start_datetime: IsoDateTime,
        party_size: PartySize,
        note: String,
    ) -> Self {
        Self {
            id,
            version,
            client_id,
            start_datetime,
            party_size,
            note,
        }
    }

    pub fn client_id(&self) -> PersonId {
        self.client_id
    }

    pub fn start_datetime(&self) -> IsoDateTime {
        self.start_datetime
    }

    pub fn party_size(&self) -> PartySize {
        self.party_size
    }

    pub fn note(&self) -> &str {
        &self.note
    }
}

impl Entity for Reservation {
    type Id = ReservationId;

    const ENTITY_NAME: &'static str = "reservation";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }
}

/// 検証済みで未保存の予約
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub client: NewPerson,
    pub start_datetime: IsoDateTime,
    pub party_size: PartySize,
    pub note: String,
}

/// 予約一覧の要素
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationSummary {
    pub id: ReservationId,
    pub name: String,
    pub size: PartySize,
    #[serde_as(as = "DisplayFromStr")]
    pub time: IsoDateTime,
}

/// 予約の詳細
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationDetails {
    pub id: ReservationId,
    pub name: String,
    pub email: String,
    pub size: PartySize,
    #[serde_as(as = "DisplayFromStr")]
    pub time: IsoDateTime,
    pub note: String,
}

/// 予約リクエストの検証エラー
#[derive(Error, Display, Debug, PartialEq, Eq)]
pub enum ReservationError {
    /// 必須項目が不足しています
    #[display(fmt = "Required field must not be null or empty. Required: name, email, size, time")]
    MissingField,
    /// 日時の書式が不正です
    #[display(fmt = "Invalid date format, use: <date: YYYY-MM-DD>T<time: hh:mm>")]
    InvalidTime,
    /// 日時が過去です
    #[display(fmt = "The reservation must be in the future.")]
    TimeNotInFuture,
    /// 人数の書式が不正です
    #[display(fmt = "Invalid party size format, it must be a valid number.")]
    InvalidPartySize,
    /// 人数が1未満です
    #[display(fmt = "Your party size must be of at least 1.")]
    PartySizeTooSmall,
}

pub const REQUIRED_FIELDS: [&str; 4] = ["name", "email", "size", "time"];

/// 予約作成リクエスト
pub struct ReservationRequest;

impl ReservationRequest {
    /// JSON ペイロードを検証し、最初に見つかったエラーを返す
    pub fn parse(payload: &Value, now: IsoDateTime) -> Result<NewReservation, ReservationError> {
        let body = payload.as_object().ok_or(ReservationError::MissingField)?;
        Self::validate_required(body)?;

        let start_datetime = Self::parse_time(&body["time"])?;
        if start_datetime <= now {
            return Err(ReservationError::TimeNotInFuture);
        }
        let party_size = PartySize::new(Self::parse_size(&body["size"])?)?;

        Ok(NewReservation {
            client: NewPerson {
                name: Self::text(&body["name"]),
                email: Self::text(&body["email"]),
            },
            start_datetime,
            party_size,
            note: body.get("note").map(Self::note).unwrap_or_default(),
        })
    }

    fn validate_required(body: &Map<String, Value>) -> Result<(), ReservationError> {
        let complete = REQUIRED_FIELDS
            .iter()
            .all(|field| body.get(*field).map_or(false, |v| !is_empty(v)));
        if !complete {
            return Err(ReservationError::MissingField);
        }
        Ok(())
    }

    fn parse_time(value: &Value) -> Result<IsoDateTime, ReservationError> {
        value
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or(ReservationError::InvalidTime)
    }

    fn parse_size(value: &Value) -> Result<i64, ReservationError> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or(ReservationError::InvalidPartySize)
    }

    fn text(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn note(value: &Value) -> String {
        if is_empty(value) {
            String::new()
        } else {
            Self::text(value)
        }
    }
}

/// JSON の偽値 (null, false, 0, 空文字列, 空配列, 空オブジェクト)
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
