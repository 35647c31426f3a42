//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP 请求委托给应用层的用例服务，
//! 并负责整个服务的装配与启停。

mod app;
mod error;
mod extract;
mod routes;
mod state;

pub use app::ChatApp;
pub use error::{ApiError, ErrorBody};
pub use extract::{UserHeader, USER_HEADER};
pub use routes::{cors_layer, router, with_layers};
pub use state::AppState;
