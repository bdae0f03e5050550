pub mod client;
pub mod dto;
pub mod error;
pub mod session;
pub mod traits;

pub use client::{ClientConfig, HttpDashboardClient};
pub use error::ClientError;
pub use session::{SessionContext, SessionState};
pub use traits::DashboardApi;

pub use dto::*;
pub use reqwest::StatusCode;
