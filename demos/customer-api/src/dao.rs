//! 内存中的客户存储

use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::RwLock;

use crate::model::{CreateCustomer, Customer, UpdateCustomer};

#[derive(Default)]
struct Store {
    customers: BTreeMap<u64, Customer>,
    next_id: u64,
}

/// 客户 DAO
///
/// id 从 1 开始递增，删除后不复用。
#[derive(Default)]
pub struct CustomerDao {
    store: RwLock<Store>,
}

impl CustomerDao {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, input: CreateCustomer) -> Customer {
        let mut store = self.store.write();
        store.next_id += 1;

        let now = Utc::now();
        let customer = Customer {
            id: store.next_id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            created_at: now,
            updated_at: now,
        };
        store.customers.insert(customer.id, customer.clone());
        customer
    }

    /// 只覆盖提供了的字段；id 不存在时返回 None
    pub fn update(&self, id: u64, input: UpdateCustomer) -> Option<Customer> {
        let mut store = self.store.write();
        let customer = store.customers.get_mut(&id)?;

        if let Some(first_name) = input.first_name {
            customer.first_name = first_name;
        }
        if let Some(last_name) = input.last_name {
            customer.last_name = last_name;
        }
        if let Some(email) = input.email {
            customer.email = email;
        }
        customer.updated_at = Utc::now();

        Some(customer.clone())
    }

    pub fn find_all(&self) -> Vec<Customer> {
        self.store.read().customers.values().cloned().collect()
    }

    pub fn find_by_id(&self, id: u64) -> Option<Customer> {
        self.store.read().customers.get(&id).cloned()
    }

    pub fn find_by_email(&self, email: &str) -> Option<Customer> {
        self.store
            .read()
            .customers
            .values()
            .find(|c| c.email == email)
            .cloned()
    }

    pub fn delete(&self, id: u64) -> bool {
        self.store.write().customers.remove(&id).is_some()
    }

    pub fn count(&self) -> usize {
        self.store.read().customers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(first_name: &str, email: &str) -> CreateCustomer {
        CreateCustomer {
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_ids_are_sequential_and_not_reused() {
        let dao = CustomerDao::new();
        let first = dao.create(input("Ada", "ada@example.com"));
        let second = dao.create(input("Grace", "grace@example.com"));
        assert_eq!((first.id, second.id), (1, 2));

        assert!(dao.delete(second.id));
        assert!(!dao.delete(second.id));

        let third = dao.create(input("Alan", "alan@example.com"));
        assert_eq!(third.id, 3);
        assert_eq!(dao.count(), 2);
    }

    #[test]
    fn test_update_only_touches_given_fields() {
        let dao = CustomerDao::new();
        let created = dao.create(input("Ada", "ada@example.com"));

        let updated = dao
            .update(
                created.id,
                UpdateCustomer {
                    last_name: Some("Lovelace".to_string()),
                    ..UpdateCustomer::default()
                },
            )
            .unwrap();

        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.last_name, "Lovelace");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(dao.find_by_id(created.id), Some(updated));

        assert!(dao.update(99, UpdateCustomer::default()).is_none());
    }

    #[test]
    fn test_find_by_email() {
        let dao = CustomerDao::new();
        dao.create(input("Ada", "ada@example.com"));

        assert!(dao.find_by_email("ada@example.com").is_some());
        assert!(dao.find_by_email("grace@example.com").is_none());
        assert_eq!(dao.find_all().len(), 1);
    }
}
