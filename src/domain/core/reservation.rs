use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use derive_more::{Deref, Display, Error, From};
use serde::{Deserialize, Serialize};

use crate::domain::{DataAccessError, Entity, Id, LunchlyError};

use super::{start_of_day, CustomerId};

/// 予約リポジトリ
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// お客様の全ての予約を取得する
    async fn find_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Reservation>, DataAccessError>;
    /// `after` より後で最も近い予約を取得する
    async fn find_next_by_customer(
        &self,
        customer_id: CustomerId,
        after: DateTime<Utc>,
    ) -> Result<Option<Reservation>, DataAccessError>;
    /// 予約を登録し、採番されたIDを返す
    async fn insert(&mut self, entity: &Reservation) -> Result<ReservationId, DataAccessError>;
    /// 予約を更新する
    async fn update(&mut self, entity: &Reservation) -> Result<(), DataAccessError>;
}

/// 予約ID
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    From,
    Deref,
)]
pub struct ReservationId(i32);

impl Id for ReservationId {
    type Inner = i32;
}

/// 予約エンティティ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    id: Option<ReservationId>,
    customer_id: CustomerId,
    num_guests: i32,
    start_at: DateTime<Utc>,
    notes: Option<String>,
}

impl Reservation {
    pub fn new(
        customer_id: CustomerId,
        num_guests: i32,
        start_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<Self, ReservationError> {
        Self::validate_num_guests(num_guests)?;
        Ok(Self {
            id: None,
            customer_id,
            num_guests,
            start_at,
            notes,
        })
    }

    /// 保存済みの予約を復元する
    pub fn restore(
        id: ReservationId,
        customer_id: CustomerId,
        num_guests: i32,
        start_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<Self, ReservationError> {
        Ok(Self {
            id: Some(id),
            ..Self::new(customer_id, num_guests, start_at, notes)?
        })
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn num_guests(&self) -> i32 {
        self.num_guests
    }

    pub fn start_at(&self) -> DateTime<Utc> {
        self.start_at
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn change_customer_id(&mut self, customer_id: CustomerId) {
        self.customer_id = customer_id;
    }

    /// 1未満の人数は受け付けない
    pub fn change_num_guests(&mut self, num_guests: i32) -> Result<(), ReservationError> {
        Self::validate_num_guests(num_guests)?;
        self.num_guests = num_guests;
        Ok(())
    }

    pub fn change_start_at(&mut self, start_at: DateTime<Utc>) {
        self.start_at = start_at;
    }

    pub fn change_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    /// "April 5th 2024, 3:30 pm" 形式の開始日時
    pub fn formatted_start_at(&self) -> String {
        let day = self.start_at.day();
        format!(
            "{} {}{} {}",
            self.start_at.format("%B"),
            day,
            ordinal_suffix(day),
            self.start_at.format("%Y, %-I:%M %P")
        )
    }

    pub async fn for_customer<R>(
        store: &R,
        customer_id: CustomerId,
    ) -> Result<Vec<Reservation>, LunchlyError>
    where
        R: ReservationRepository + ?Sized,
    {
        Ok(store.find_by_customer(customer_id).await?)
    }

    /// 本日 0:00 より後で最も近い予約
    pub async fn next_for_customer<R>(
        store: &R,
        customer_id: CustomerId,
        now: DateTime<Utc>,
    ) -> Result<Option<Reservation>, LunchlyError>
    where
        R: ReservationRepository + ?Sized,
    {
        Ok(store
            .find_next_by_customer(customer_id, start_of_day(now))
            .await?)
    }

    /// 未保存なら登録してIDを採番し、保存済みなら全項目を更新する
    pub async fn save<R>(&mut self, store: &mut R) -> Result<ReservationId, LunchlyError>
    where
        R: ReservationRepository + ?Sized,
    {
        match self.id {
            Some(id) => {
                store.update(self).await?;
                Ok(id)
            }
            None => {
                let id = store.insert(self).await?;
                self.id = Some(id);
                Ok(id)
            }
        }
    }

    fn validate_num_guests(num_guests: i32) -> Result<(), ReservationError> {
        if num_guests < 1 {
            return Err(ReservationError::InvalidNumGuests);
        }
        Ok(())
    }
}

impl Entity for Reservation {
    type Id = ReservationId;

    const ENTITY_NAME: &'static str = "reservation";

    fn id(&self) -> Option<Self::Id> {
        self.id
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// 予約エラー
#[derive(Error, Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationError {
    /// 人数が不正です
    #[display(fmt = "Invalid number. Number of guests must be greater than 0")]
    InvalidNumGuests,
}
