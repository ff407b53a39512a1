use std::sync::Arc;

use domains::{Profile, Result, UserRepository};
use uuid::Uuid;

pub struct ProfileService {
    users: Arc<dyn UserRepository>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// The caller's public profile, or `None` if the account no longer exists.
    pub async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let user = self.users.find_by_id(user_id).await?;
        Ok(user.as_ref().map(Profile::from))
    }
}
