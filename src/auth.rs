use async_trait::async_trait;

use crate::directory::{Directory, DirectoryError};
use crate::model::User;

/// The authentication contract the session layer consumes. The core only
/// ever sees a resolved `User`; where credentials live is behind this seam.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, login: &str, password: &str) -> Result<User, DirectoryError>;
}

#[async_trait]
impl Authenticator for Directory {
    async fn authenticate(&self, login: &str, password: &str) -> Result<User, DirectoryError> {
        self.lookup(login, password)
    }
}
