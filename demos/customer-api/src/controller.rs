//! HTTP 控制器

use std::sync::Arc;

use griffin_web::prelude::*;
use serde_json::{json, Value};

use crate::model::{CreateCustomer, Customer, UpdateCustomer};
use crate::service::CustomerService;

/// 健康检查
pub struct RootController;

#[controller("")]
impl RootController {
    #[get_mapping("/")]
    fn index(&self) -> Json<Value> {
        Json(json!({ "message": "API is running" }))
    }
}

pub struct CustomerController {
    service: Arc<CustomerService>,
}

impl CustomerController {
    pub fn new(service: Arc<CustomerService>) -> Self {
        Self { service }
    }
}

#[controller("/customers")]
impl CustomerController {
    #[get_mapping("/")]
    async fn list(&self) -> Json<Vec<Customer>> {
        Json(self.service.list())
    }

    #[get_mapping("/:id")]
    async fn find(&self, PathVariable(id): PathVariable<u64>) -> Result<Json<Customer>, WebError> {
        Ok(Json(self.service.get(id)?))
    }

    #[post_mapping("/")]
    #[use_middleware(ValidateBody::<CreateCustomer>::new())]
    async fn create(
        &self,
        Validated(input): Validated<CreateCustomer>,
    ) -> Result<ResponseEntity<Customer>, WebError> {
        let customer = self.service.create(input)?;
        Ok(ResponseEntity::created(customer))
    }

    #[put_mapping("/:id")]
    #[use_middleware(ValidateBody::<UpdateCustomer>::new())]
    async fn update(
        &self,
        PathVariable(id): PathVariable<u64>,
        Validated(input): Validated<UpdateCustomer>,
    ) -> Result<Json<Customer>, WebError> {
        Ok(Json(self.service.update(id, input)?))
    }

    #[delete_mapping("/:id")]
    async fn delete(&self, PathVariable(id): PathVariable<u64>) -> Result<StatusCode, WebError> {
        self.service.delete(id)?;
        Ok(StatusCode::NO_CONTENT)
    }
}
