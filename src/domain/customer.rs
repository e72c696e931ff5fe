use chrono::{DateTime, Utc};

use super::core::{
    Customer, CustomerId, CustomerRepository, Reservation, ReservationRepository,
};
use super::search::match_customers;
use super::LunchlyError;

/// 「上位のお客様」に表示する人数
pub const TOP_CUSTOMERS: usize = 10;

/// お客様に関するユースケース
#[derive(Clone)]
pub struct CustomerService<S> {
    store: S,
    clock: fn() -> DateTime<Utc>,
}

impl<S> CustomerService<S>
where
    S: CustomerRepository + ReservationRepository,
{
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Utc::now)
    }

    pub fn with_clock(store: S, clock: fn() -> DateTime<Utc>) -> Self {
        Self { store, clock }
    }

    pub async fn all(&self) -> Result<Vec<Customer>, LunchlyError> {
        Customer::all(&self.store, (self.clock)()).await
    }

    pub async fn get(&self, id: CustomerId) -> Result<Customer, LunchlyError> {
        Customer::get(&self.store, id).await
    }

    pub async fn best(&self, n: usize) -> Result<Vec<Customer>, LunchlyError> {
        Customer::best(&self.store, n).await
    }

    pub async fn top(&self) -> Result<Vec<Customer>, LunchlyError> {
        self.best(TOP_CUSTOMERS).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Customer>, LunchlyError> {
        Ok(match_customers(self.all().await?, query))
    }

    pub async fn reservations(
        &self,
        customer: &Customer,
    ) -> Result<Vec<Reservation>, LunchlyError> {
        customer.reservations(&self.store).await
    }

    pub async fn save(&mut self, customer: &mut Customer) -> Result<CustomerId, LunchlyError> {
        customer.save(&mut self.store).await
    }
}
