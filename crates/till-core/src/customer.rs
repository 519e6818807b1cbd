//! # Customers
//!
//! Customer directory rules: creation, search and the "recent customers"
//! quick-pick list shown at checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ValidationError};
use crate::order::random_base36;
use crate::types::Customer;
use crate::MAX_RECENT_CUSTOMERS;

/// Details captured when a customer is first seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl NewCustomer {
    /// Builds a customer with a `cust-<millis>-<random>` id.
    pub fn into_customer(self, now: DateTime<Utc>) -> CoreResult<Customer> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "customer name".to_string(),
            }
            .into());
        }

        Ok(Customer {
            id: format!("cust-{}-{}", now.timestamp_millis(), random_base36(9).to_lowercase()),
            name: self.name.trim().to_string(),
            phone: self.phone.filter(|p| !p.is_empty()),
            email: self.email.filter(|e| !e.is_empty()),
            created_at: now,
        })
    }
}

/// Exact phone lookup.
pub fn find_by_phone<'a>(customers: &'a [Customer], phone: &str) -> Option<&'a Customer> {
    customers
        .iter()
        .find(|c| c.phone.as_deref() == Some(phone))
}

/// Name/email (case-insensitive) or phone (substring) match.
///
/// A blank query matches nobody.
pub fn search_customers<'a>(customers: &'a [Customer], query: &str) -> Vec<&'a Customer> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let lower = query.to_lowercase();

    customers
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&lower)
                || c.phone.as_deref().is_some_and(|p| p.contains(query))
                || c.email
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase().contains(&lower))
        })
        .collect()
}

/// Moves `customer` to the front of the recent list.
///
/// Drops any earlier entry with the same id and keeps at most
/// `MAX_RECENT_CUSTOMERS`.
pub fn push_recent(recent: &mut Vec<Customer>, customer: Customer) {
    recent.retain(|c| c.id != customer.id);
    recent.insert(0, customer);
    recent.truncate(MAX_RECENT_CUSTOMERS);
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: &str, name: &str, phone: Option<&str>) -> Customer {
        Customer {
            id: id.to_string(),
            name: name.to_string(),
            phone: phone.map(str::to_string),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_customer() {
        let c = NewCustomer {
            name: " Ada ".into(),
            phone: Some(String::new()),
            email: None,
        }
        .into_customer(Utc::now())
        .unwrap();

        assert!(c.id.starts_with("cust-"));
        assert_eq!(c.name, "Ada");
        assert_eq!(c.phone, None);

        assert!(NewCustomer::default().into_customer(Utc::now()).is_err());
    }

    #[test]
    fn test_search() {
        let customers = vec![
            customer("1", "Ada", Some("555-0101")),
            customer("2", "Grace", None),
        ];

        assert_eq!(search_customers(&customers, "ADA").len(), 1);
        assert_eq!(search_customers(&customers, "0101")[0].id, "1");
        assert_eq!(search_customers(&customers, "grace@")[0].id, "2");
        assert!(search_customers(&customers, "   ").is_empty());
        assert_eq!(find_by_phone(&customers, "555-0101").unwrap().id, "1");
        assert!(find_by_phone(&customers, "555").is_none());
    }

    #[test]
    fn test_recent_list() {
        let mut recent = Vec::new();
        for i in 0..12 {
            push_recent(&mut recent, customer(&i.to_string(), "C", None));
        }
        assert_eq!(recent.len(), MAX_RECENT_CUSTOMERS);
        assert_eq!(recent[0].id, "11");

        push_recent(&mut recent, customer("5", "C", None));
        assert_eq!(recent[0].id, "5");
        assert_eq!(recent.iter().filter(|c| c.id == "5").count(), 1);
        assert_eq!(recent.len(), MAX_RECENT_CUSTOMERS);
    }
}
