//! 客户业务逻辑

use std::sync::Arc;

use crate::dao::CustomerDao;
use crate::error::CustomerError;
use crate::model::{CreateCustomer, Customer, UpdateCustomer};

pub struct CustomerService {
    dao: Arc<CustomerDao>,
}

impl CustomerService {
    pub fn new(dao: Arc<CustomerDao>) -> Self {
        Self { dao }
    }

    pub fn list(&self) -> Vec<Customer> {
        self.dao.find_all()
    }

    pub fn get(&self, id: u64) -> Result<Customer, CustomerError> {
        self.dao.find_by_id(id).ok_or(CustomerError::NotFound(id))
    }

    /// 邮箱已被占用时返回 `EmailTaken`
    pub fn create(&self, input: CreateCustomer) -> Result<Customer, CustomerError> {
        self.ensure_email_free(&input.email, None)?;

        let customer = self.dao.create(input);
        tracing::info!(id = customer.id, email = %customer.email, "Customer created");
        Ok(customer)
    }

    pub fn update(&self, id: u64, input: UpdateCustomer) -> Result<Customer, CustomerError> {
        if let Some(email) = &input.email {
            self.ensure_email_free(email, Some(id))?;
        }

        let customer = self.dao.update(id, input).ok_or(CustomerError::NotFound(id))?;
        tracing::info!(id, "Customer updated");
        Ok(customer)
    }

    pub fn delete(&self, id: u64) -> Result<(), CustomerError> {
        if !self.dao.delete(id) {
            return Err(CustomerError::NotFound(id));
        }
        tracing::info!(id, "Customer deleted");
        Ok(())
    }

    fn ensure_email_free(&self, email: &str, owner: Option<u64>) -> Result<(), CustomerError> {
        match self.dao.find_by_email(email) {
            Some(existing) if Some(existing.id) != owner => {
                Err(CustomerError::EmailTaken(email.to_string()))
            }
            _ => Ok(()),
        }
    }
}
