//! 业务错误

use griffin_web::WebError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CustomerError {
    #[error("Customer with id {0} not found")]
    NotFound(u64),

    #[error("Email {0} is already in use")]
    EmailTaken(String),
}

impl From<CustomerError> for WebError {
    fn from(err: CustomerError) -> Self {
        match err {
            CustomerError::NotFound(_) => WebError::NotFound(err.to_string()),
            CustomerError::EmailTaken(_) => WebError::Conflict(err.to_string()),
        }
    }
}
