use crate::{
    dto::{AggregatePayload, CurrentUser},
    error::ClientError,
};

/// Backend operations the dashboard depends on.
///
/// Every call carries the session cookie; implementations decide how it is stored.
#[async_trait::async_trait]
pub trait DashboardApi: Send + Sync {
    async fn get_dashboard(&self) -> Result<AggregatePayload, ClientError>;

    async fn login(&self, username: &str, password: &str) -> Result<(), ClientError>;

    async fn logout(&self) -> Result<(), ClientError>;

    async fn current_user(&self) -> Result<CurrentUser, ClientError>;
}
