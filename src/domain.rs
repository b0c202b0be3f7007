pub mod person;
pub mod reservation;
pub mod time;

use std::{
    error::Error,
    fmt::{Debug, Display},
    ops::Deref,
    str::FromStr,
};

use derive_more::{Deref, Display, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::person::*;
pub use self::reservation::*;
pub use self::time::*;

pub type BoxError = Box<dyn Error + Send + Sync>;

pub trait Id:
    Copy
    + Eq
    + Deref<Target = Self::Inner>
    + From<Self::Inner>
    + Display
    + Debug
    + Serialize
    + for<'de> Deserialize<'de>
{
    type Inner: FromStr;
}

pub trait Entity: Debug + Clone {
    type Id: Id;

    const ENTITY_NAME: &'static str;

    fn id(&self) -> Self::Id;
    fn version(&self) -> Version;
}

/// 楽観的排他制御のバージョン
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, From, Deref,
)]
pub struct Version(i64);

impl Version {
    pub const INITIAL: Version = Version(1);

    pub fn next(self) -> Self {
        Version(self.0 + 1)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::INITIAL
    }
}

#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error("Database connection error: {0}")]
    ConnectionError(BoxError),
    #[error("Database query error: {0}")]
    QueryError(BoxError),
    #[error("Data write error: {0}")]
    WriteError(BoxError),
    #[error("Version conflict on {entity} {id}: expected version {expected}")]
    Conflict {
        entity: &'static str,
        id: i64,
        expected: Version,
    },
    #[error("Schema migration error: {0}")]
    MigrationError(BoxError),
}
