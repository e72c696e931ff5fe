use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::{Deref, Display, From};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::domain::{DataAccessError, Entity, Id, LunchlyError};

use super::{from_now, Reservation, ReservationRepository};

/// お客様リポジトリ
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// 全てのお客様を姓、名の順で取得する
    async fn find_all(&self) -> Result<Vec<Customer>, DataAccessError>;
    /// IDでお客様を検索する
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DataAccessError>;
    /// 予約件数の多い順にお客様を取得する（予約のないお客様は含まない）
    async fn find_best(&self, limit: usize) -> Result<Vec<Customer>, DataAccessError>;
    /// お客様を登録し、採番されたIDを返す
    async fn insert(&mut self, entity: &Customer) -> Result<CustomerId, DataAccessError>;
    /// お客様を更新する
    async fn update(&mut self, entity: &Customer) -> Result<(), DataAccessError>;
}

/// お客様ID
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
pub struct CustomerId(i32);

impl Id for CustomerId {
    type Inner = i32;
}

/// お客様エンティティ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    id: Option<CustomerId>,
    first_name: String,
    middle_name: Option<String>,
    last_name: String,
    phone: String,
    notes: Option<String>,
    #[serde(default)]
    next_reservation: Option<String>,
}

impl Customer {
    pub fn new(
        first_name: String,
        middle_name: Option<String>,
        last_name: String,
        phone: String,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: None,
            first_name,
            middle_name: middle_name.filter(|m| !m.is_empty()),
            last_name,
            phone,
            notes,
            next_reservation: None,
        }
    }

    /// 保存済みのお客様を復元する
    pub fn restore(
        id: CustomerId,
        first_name: String,
        middle_name: Option<String>,
        last_name: String,
        phone: String,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Some(id),
            ..Self::new(first_name, middle_name, last_name, phone, notes)
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn middle_name(&self) -> Option<&str> {
        self.middle_name.as_deref()
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn next_reservation(&self) -> Option<&str> {
        self.next_reservation.as_deref()
    }

    /// 名、ミドルネーム、姓を空白で連結する。
    ///
    /// ミドルネームがない場合も区切りの空白は残る（"Jane  Doe"）。
    pub fn full_name(&self) -> String {
        format!(
            "{} {} {}",
            self.first_name,
            self.middle_name.as_deref().unwrap_or_default(),
            self.last_name
        )
    }

    pub fn change_first_name(&mut self, first_name: String) {
        self.first_name = first_name;
    }

    pub fn change_middle_name(&mut self, middle_name: Option<String>) {
        self.middle_name = middle_name.filter(|m| !m.is_empty());
    }

    pub fn change_last_name(&mut self, last_name: String) {
        self.last_name = last_name;
    }

    pub fn change_phone(&mut self, phone: String) {
        self.phone = phone;
    }

    pub fn change_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    /// 全てのお客様を取得し、それぞれの次回予約を付与する
    pub async fn all<S>(store: &S, now: DateTime<Utc>) -> Result<Vec<Customer>, LunchlyError>
    where
        S: CustomerRepository + ReservationRepository + ?Sized,
    {
        let customers = store.find_all().await?;
        try_join_all(customers.into_iter().map(|mut customer| async move {
            customer.attach_next_reservation(store, now).await?;
            Ok::<_, LunchlyError>(customer)
        }))
        .await
    }

    pub async fn get<R>(store: &R, id: CustomerId) -> Result<Customer, LunchlyError>
    where
        R: CustomerRepository + ?Sized,
    {
        store
            .find_by_id(id)
            .await?
            .ok_or_else(|| LunchlyError::not_found::<Customer>(id))
    }

    /// 予約件数上位 `n` 名。件数が同じ場合の順序は保証しない。次回予約は付与しない。
    pub async fn best<R>(store: &R, n: usize) -> Result<Vec<Customer>, LunchlyError>
    where
        R: CustomerRepository + ?Sized,
    {
        Ok(store.find_best(n).await?)
    }

    /// このお客様の全ての予約
    pub async fn reservations<R>(&self, store: &R) -> Result<Vec<Reservation>, LunchlyError>
    where
        R: ReservationRepository + ?Sized,
    {
        match self.id {
            Some(id) => Reservation::for_customer(store, id).await,
            None => Ok(Vec::new()),
        }
    }

    /// 次回予約を "Next Reservation: in 3 days" の形式で返す
    pub async fn fetch_next_reservation<R>(
        &self,
        store: &R,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, LunchlyError>
    where
        R: ReservationRepository + ?Sized,
    {
        let Some(id) = self.id else {
            return Ok(None);
        };
        Ok(Reservation::next_for_customer(store, id, now)
            .await?
            .map(|r| format!("Next Reservation: {}", from_now(r.start_at(), now))))
    }

    pub async fn attach_next_reservation<R>(
        &mut self,
        store: &R,
        now: DateTime<Utc>,
    ) -> Result<(), LunchlyError>
    where
        R: ReservationRepository + ?Sized,
    {
        self.next_reservation = self.fetch_next_reservation(store, now).await?;
        Ok(())
    }

    /// 未保存なら登録してIDを採番し、保存済みなら全項目を更新する
    pub async fn save<R>(&mut self, store: &mut R) -> Result<CustomerId, LunchlyError>
    where
        R: CustomerRepository + ?Sized,
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
}

impl Entity for Customer {
    type Id = CustomerId;

    const ENTITY_NAME: &'static str = "customer";

    fn id(&self) -> Option<Self::Id> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use crate::infrastructure::MemoryStore;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 12, 0, 0).unwrap()
    }

    fn customer(first: &str, last: &str) -> Customer {
        Customer::new(
            first.to_owned(),
            None,
            last.to_owned(),
            "555-0100".to_owned(),
            None,
        )
    }

    async fn saved(store: &mut MemoryStore, first: &str, last: &str) -> Customer {
        let mut c = customer(first, last);
        c.save(store).await.unwrap();
        c
    }

    async fn reserve(store: &mut MemoryStore, customer: &Customer, start_at: DateTime<Utc>) {
        let mut r = Reservation::new(customer.id().unwrap(), 2, start_at, None).unwrap();
        r.save(store).await.unwrap();
    }

    #[test]
    fn test_full_name() {
        let c = Customer::new(
            "Jane".to_owned(),
            Some("Q".to_owned()),
            "Doe".to_owned(),
            "555-0100".to_owned(),
            None,
        );
        assert_eq!(c.full_name(), "Jane Q Doe");
    }

    #[test]
    fn test_full_name_without_middle_name() {
        assert_eq!(customer("Jane", "Doe").full_name(), "Jane  Doe");
    }

    #[test]
    fn test_blank_middle_name_is_absent() {
        let mut c = Customer::new(
            "Jane".to_owned(),
            Some(String::new()),
            "Doe".to_owned(),
            String::new(),
            None,
        );
        assert_eq!(c.middle_name(), None);
        c.change_middle_name(Some("Q".to_owned()));
        assert_eq!(c.middle_name(), Some("Q"));
        c.change_middle_name(Some(String::new()));
        assert_eq!(c.middle_name(), None);
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let mut store = MemoryStore::new();
        let mut c = Customer::new(
            "Jane".to_owned(),
            Some("Q".to_owned()),
            "Doe".to_owned(),
            "555-0100".to_owned(),
            Some("window seat".to_owned()),
        );
        assert!(c.is_new());

        let id = c.save(&mut store).await.unwrap();
        assert_eq!(c.id(), Some(id));
        assert_eq!(Customer::get(&store, id).await.unwrap(), c);
    }

    #[tokio::test]
    async fn test_save_updates_existing() {
        let mut store = MemoryStore::new();
        let mut c = saved(&mut store, "Jane", "Doe").await;
        let id = c.id().unwrap();

        c.change_phone("555-0199".to_owned());
        c.change_notes(Some("allergic to nuts".to_owned()));
        assert_eq!(c.save(&mut store).await.unwrap(), id);

        let loaded = Customer::get(&store, id).await.unwrap();
        assert_eq!(loaded.phone(), "555-0199");
        assert_eq!(loaded.notes(), Some("allergic to nuts"));
        assert_eq!(Customer::all(&store, now()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let store = MemoryStore::new();
        let error = Customer::get(&store, CustomerId::from(7)).await.unwrap_err();
        assert!(matches!(error, LunchlyError::NotFound { .. }));
        assert_eq!(error.status(), 404);
    }

    #[tokio::test]
    async fn test_all_sorted_by_last_then_first() {
        let mut store = MemoryStore::new();
        saved(&mut store, "Zoe", "Adams").await;
        saved(&mut store, "Bob", "Smith").await;
        saved(&mut store, "Amy", "Smith").await;
        saved(&mut store, "Carl", "Baker").await;

        let names = Customer::all(&store, now())
            .await
            .unwrap()
            .iter()
            .map(|c| format!("{} {}", c.first_name(), c.last_name()))
            .collect::<Vec<_>>();
        assert_eq!(names, ["Zoe Adams", "Carl Baker", "Amy Smith", "Bob Smith"]);
    }

    #[tokio::test]
    async fn test_all_empty() {
        let store = MemoryStore::new();
        assert!(Customer::all(&store, now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_attaches_next_reservation() {
        let mut store = MemoryStore::new();
        let jane = saved(&mut store, "Jane", "Doe").await;
        let john = saved(&mut store, "John", "Roe").await;
        reserve(&mut store, &jane, now() + Duration::days(3)).await;
        reserve(&mut store, &john, now() - Duration::days(3)).await;

        let customers = Customer::all(&store, now()).await.unwrap();
        assert_eq!(
            customers[0].next_reservation(),
            Some("Next Reservation: in 3 days")
        );
        assert_eq!(customers[1].next_reservation(), None);
    }

    #[tokio::test]
    async fn test_next_reservation_is_nearest() {
        let mut store = MemoryStore::new();
        let jane = saved(&mut store, "Jane", "Doe").await;
        reserve(&mut store, &jane, now() + Duration::days(20)).await;
        reserve(&mut store, &jane, now() + Duration::days(5)).await;
        reserve(&mut store, &jane, now() + Duration::days(10)).await;

        assert_eq!(
            jane.fetch_next_reservation(&store, now()).await.unwrap(),
            Some("Next Reservation: in 5 days".to_owned())
        );
    }

    #[tokio::test]
    async fn test_next_reservation_counts_from_start_of_day() {
        let mut store = MemoryStore::new();
        let jane = saved(&mut store, "Jane", "Doe").await;
        reserve(&mut store, &jane, now() - Duration::hours(3)).await;

        assert_eq!(
            jane.fetch_next_reservation(&store, now()).await.unwrap(),
            Some("Next Reservation: 3 hours ago".to_owned())
        );
    }

    #[tokio::test]
    async fn test_unsaved_customer_has_no_reservations() {
        let store = MemoryStore::new();
        let c = customer("Jane", "Doe");
        assert!(c.reservations(&store).await.unwrap().is_empty());
        assert_eq!(c.fetch_next_reservation(&store, now()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reservations() {
        let mut store = MemoryStore::new();
        let jane = saved(&mut store, "Jane", "Doe").await;
        let john = saved(&mut store, "John", "Roe").await;
        reserve(&mut store, &jane, now()).await;
        reserve(&mut store, &jane, now() + Duration::days(1)).await;
        reserve(&mut store, &john, now()).await;

        let reservations = jane.reservations(&store).await.unwrap();
        assert_eq!(reservations.len(), 2);
        assert!(reservations
            .iter()
            .all(|r| r.customer_id() == jane.id().unwrap()));
    }

    #[tokio::test]
    async fn test_best() {
        let mut store = MemoryStore::new();
        let a = saved(&mut store, "Ann", "A").await;
        let b = saved(&mut store, "Ben", "B").await;
        let c = saved(&mut store, "Cat", "C").await;
        saved(&mut store, "Dan", "D").await;
        for (customer, count) in [(&a, 3), (&b, 1), (&c, 2)] {
            for day in 0..count {
                reserve(&mut store, customer, now() + Duration::days(day + 1)).await;
            }
        }

        let best = Customer::best(&store, 2).await.unwrap();
        assert_eq!(best, vec![a.clone(), c.clone()]);
        assert!(best.iter().all(|c| c.next_reservation().is_none()));

        let ids = Customer::best(&store, 10)
            .await
            .unwrap()
            .iter()
            .map(|c| c.id())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![a.id(), c.id(), b.id()]);
    }

    #[test]
    fn test_serialize_camel_case() {
        let c = Customer::restore(
            CustomerId::from(3),
            "Jane".to_owned(),
            None,
            "Doe".to_owned(),
            "555-0100".to_owned(),
            None,
        );
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["lastName"], "Doe");
        assert!(json["nextReservation"].is_null());
    }
}
