//! 客户数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// 客户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 创建客户请求
///
/// 名字去掉首尾空白，邮箱统一为小写，校验在规范化之后进行。
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomer {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[serde(deserialize_with = "normalized_email")]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
}

/// 更新客户请求，未提供的字段保持不变
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomer {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: Option<String>,

    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: Option<String>,

    #[serde(default, deserialize_with = "normalized_email_opt")]
    #[validate(email(message = "A valid email is required"))]
    pub email: Option<String>,
}

fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

fn trimmed_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<String>::deserialize(deserializer).map(|s| s.map(|s| s.trim().to_string()))
}

fn normalized_email<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|s| s.trim().to_lowercase())
}

fn normalized_email_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<String>::deserialize(deserializer).map(|s| s.map(|s| s.trim().to_lowercase()))
}
