//! # Customer Repository
//!
//! Customer directory plus the "recent customers" quick-pick list.
//!
//! ## Recent List
//! ```text
//! add / get_or_create / mark_recent
//!        │
//!        ▼
//!  [newest, ..., oldest]   ← at most 10, no duplicate ids
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::kv::{self, keys};
use till_core::customer::{self, push_recent, NewCustomer};
use till_core::Customer;

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        kv::read_or_else(&self.pool, keys::CUSTOMERS, Vec::new).await
    }

    /// Most recently used first.
    pub async fn recent(&self) -> DbResult<Vec<Customer>> {
        kv::read_or_else(&self.pool, keys::RECENT_CUSTOMERS, Vec::new).await
    }

    async fn touch_recent(&self, customer: Customer) -> DbResult<()> {
        let mut recent = self.recent().await?;
        push_recent(&mut recent, customer);
        kv::write(&self.pool, keys::RECENT_CUSTOMERS, &recent).await
    }

    /// Creates a customer and puts them at the front of the recent list.
    pub async fn add(&self, new: NewCustomer) -> DbResult<Customer> {
        let created = new.into_customer(Utc::now())?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        insert_customer(&mut tx, &created).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %created.id, "Customer added");
        Ok(created)
    }

    /// Exact phone match.
    pub async fn find_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let customers = self.list().await?;
        Ok(customer::find_by_phone(&customers, phone).cloned())
    }

    /// Name/email (case-insensitive) or phone substring. Blank query → none.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Customer>> {
        let customers = self.list().await?;
        Ok(customer::search_customers(&customers, query)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Returns the customer with this phone number, creating one if needed.
    ///
    /// Either way the customer becomes the most recent.
    pub async fn get_or_create(&self, new: NewCustomer) -> DbResult<Customer> {
        if let Some(phone) = new.phone.as_deref().filter(|p| !p.is_empty()) {
            if let Some(existing) = self.find_by_phone(phone).await? {
                debug!(id = %existing.id, "Existing customer matched by phone");
                self.touch_recent(existing.clone()).await?;
                return Ok(existing);
            }
        }

        self.add(new).await
    }

    /// Moves a known customer to the front of the recent list.
    pub async fn mark_recent(&self, customer_id: &str) -> DbResult<()> {
        let customers = self.list().await?;
        let customer = customers
            .into_iter()
            .find(|c| c.id == customer_id)
            .ok_or_else(|| DbError::not_found("Customer", customer_id))?;

        self.touch_recent(customer).await
    }
}

/// Appends `customer` to the directory and the front of the recent list.
///
/// Both blobs are written on `conn`, so a caller holding a transaction
/// commits or drops them together.
pub(crate) async fn insert_customer(conn: &mut SqliteConnection, customer: &Customer) -> DbResult<()> {
    let mut customers: Vec<Customer> = kv::read_or_else(&mut *conn, keys::CUSTOMERS, Vec::new).await?;
    customers.push(customer.clone());
    kv::write(&mut *conn, keys::CUSTOMERS, &customers).await?;

    let mut recent: Vec<Customer> = kv::read_or_else(&mut *conn, keys::RECENT_CUSTOMERS, Vec::new).await?;
    push_recent(&mut recent, customer.clone());
    kv::write(&mut *conn, keys::RECENT_CUSTOMERS, &recent).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use till_core::MAX_RECENT_CUSTOMERS;

    async fn repo() -> CustomerRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().customers()
    }

    fn new_customer(name: &str, phone: Option<&str>) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            phone: phone.map(str::to_string),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_add_and_lookup() {
        let repo = repo().await;
        let ada = repo.add(new_customer("Ada", Some("555-0101"))).await.unwrap();
        repo.add(new_customer("Grace", None)).await.unwrap();

        assert_eq!(repo.list().await.unwrap().len(), 2);
        assert_eq!(repo.find_by_phone("555-0101").await.unwrap().unwrap().id, ada.id);
        assert_eq!(repo.search("ada").await.unwrap().len(), 1);
        assert!(repo.search("").await.unwrap().is_empty());

        let recent = repo.recent().await.unwrap();
        assert_eq!(recent[0].name, "Grace");
        assert_eq!(recent[1].name, "Ada");
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_phone_match() {
        let repo = repo().await;
        let first = repo
            .get_or_create(new_customer("Ada", Some("555-0101")))
            .await
            .unwrap();
        repo.add(new_customer("Grace", None)).await.unwrap();

        let again = repo
            .get_or_create(new_customer("Ada L.", Some("555-0101")))
            .await
            .unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(repo.list().await.unwrap().len(), 2);
        assert_eq!(repo.recent().await.unwrap()[0].id, first.id);
    }

    #[tokio::test]
    async fn test_mark_recent() {
        let repo = repo().await;
        let mut ids = Vec::new();
        for i in 0..12 {
            ids.push(repo.add(new_customer(&format!("C{i}"), None)).await.unwrap().id);
        }
        assert_eq!(repo.recent().await.unwrap().len(), MAX_RECENT_CUSTOMERS);

        repo.mark_recent(&ids[0]).await.unwrap();
        let recent = repo.recent().await.unwrap();
        assert_eq!(recent[0].id, ids[0]);
        assert_eq!(recent.len(), MAX_RECENT_CUSTOMERS);

        assert!(matches!(
            repo.mark_recent("nobody").await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_insert_rolls_back_both_lists() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ada = new_customer("Ada", None).into_customer(Utc::now()).unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        insert_customer(&mut tx, &ada).await.unwrap();
        tx.rollback().await.unwrap();

        let repo = db.customers();
        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.recent().await.unwrap().is_empty());

        let mut tx = db.pool().begin().await.unwrap();
        insert_customer(&mut tx, &ada).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(repo.list().await.unwrap()[0].id, ada.id);
        assert_eq!(repo.recent().await.unwrap()[0].id, ada.id);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let repo = repo().await;
        assert!(matches!(
            repo.add(new_customer("  ", None)).await.unwrap_err(),
            DbError::Core(_)
        ));
        assert!(repo.list().await.unwrap().is_empty());
    }
}
