//! 客户管理 REST 服务
//!
//! 路由挂在 `server.context-path`（默认 `/api`）下：
//!
//! | 方法 | 路径 | 说明 |
//! |---|---|---|
//! | GET | `/` | 健康检查 |
//! | GET | `/customers` | 客户列表 |
//! | GET | `/customers/:id` | 单个客户 |
//! | POST | `/customers` | 创建客户，返回 201 |
//! | PUT | `/customers/:id` | 更新客户 |
//! | DELETE | `/customers/:id` | 删除客户，返回 204 |

pub mod app;
pub mod controller;
pub mod dao;
pub mod error;
pub mod model;
pub mod service;
