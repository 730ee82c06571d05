//! Session resolution.

use async_trait::async_trait;

use crate::session::LoginSession;
use crate::traits::Directory;

/// Answers "is there a valid login session right now?".
///
/// Every directory is a resolver; tests substitute their own.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// The current valid session, or `None`.
    async fn resolve(&self) -> Option<LoginSession>;
}

#[async_trait]
impl<D> SessionResolver for D
where
    D: Directory + ?Sized,
{
    async fn resolve(&self) -> Option<LoginSession> {
        self.current_session().await
    }
}
