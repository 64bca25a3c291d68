//! User administration

use crate::client::HelmetClient;
use crate::error::Result;
use crate::transport::ApiRequest;
use crate::types::{Ack, NewUser, User, UserUpdate};

impl HelmetClient {
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.request(ApiRequest::get("/users")).await
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.request(ApiRequest::get(format!("/users/{}", id))).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.request(ApiRequest::post("/users").json(serde_json::to_value(user)?))
            .await
    }

    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User> {
        self.request(ApiRequest::put(format!("/users/{}", id)).json(serde_json::to_value(update)?))
            .await
    }

    pub async fn delete_user(&self, id: i64) -> Result<Ack> {
        self.request(ApiRequest::delete(format!("/users/{}", id))).await
    }
}
