pub mod core;
pub mod customer;
pub mod reserve;
pub mod search;

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Debug, Display},
    ops::Deref,
    str::FromStr,
};
use thiserror::Error;

use self::core::ReservationError;

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

    /// 未保存の場合は `None`
    fn id(&self) -> Option<Self::Id>;

    fn is_new(&self) -> bool {
        self.id().is_none()
    }
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error("Database connection error: {0}")]
    ConnectionError(BoxError),
    #[error("Database query error: {0}")]
    QueryError(BoxError),
    #[error("Data read error: {0}")]
    ReadError(BoxError),
    #[error("Data write error: {0}")]
    WriteError(BoxError),
    #[error("Client side error: {0}")]
    ClientSideError(BoxError),
}

/// 公開操作が返すエラー
#[derive(Error, Debug)]
pub enum LunchlyError {
    #[error("No such {entity}: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Validation(#[from] ReservationError),
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}

impl LunchlyError {
    pub fn not_found<E: Entity>(id: E::Id) -> Self {
        Self::NotFound {
            entity: E::ENTITY_NAME,
            id: id.to_string(),
        }
    }

    /// HTTPステータス相当のコード
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_) => 400,
            Self::DataAccess(_) => 500,
        }
    }
}
