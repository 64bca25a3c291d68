//! Authentication: login, register, logout, current user

use crate::client::HelmetClient;
use crate::error::Result;
use crate::transport::ApiRequest;
use crate::types::{Ack, LoginResponse, User};

impl HelmetClient {
    /// Sign in and store the returned bearer token
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let response: LoginResponse = self
            .request(ApiRequest::post("/auth/login").json(serde_json::json!({
                "username": username,
                "password": password,
            })))
            .await?;

        self.session().set(response.token)?;
        tracing::info!(user_id = response.user.id, username = %response.user.username, "Signed in");
        Ok(response.user)
    }

    /// Create an account
    pub async fn register(&self, username: &str, password: &str, email: Option<&str>) -> Result<Ack> {
        let mut body = serde_json::json!({
            "username": username,
            "password": password,
        });
        if let Some(email) = email {
            body["email"] = serde_json::Value::String(email.to_string());
        }
        self.request(ApiRequest::post("/auth/register").json(body)).await
    }

    /// Sign out; the local session is cleared even if the request fails
    pub async fn logout(&self) -> Result<Ack> {
        let result = self.request(ApiRequest::post("/auth/logout")).await;
        self.session().clear()?;
        tracing::info!("Signed out");
        result
    }

    /// The signed-in user
    pub async fn current_user(&self) -> Result<User> {
        self.request(ApiRequest::get("/auth/me")).await
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ClientConfig;
    use crate::navigation::MemoryNavigator;
    use crate::session::Session;
    use crate::transport::memory::MemoryTransport;
    use crate::transport::{Method, RequestBody};
    use crate::HelmetClient;
    use std::sync::Arc;

    fn client() -> (HelmetClient, MemoryTransport) {
        let transport = MemoryTransport::new();
        let client = HelmetClient::with_parts(
            ClientConfig::default(),
            Arc::new(transport.clone()),
            Arc::new(Session::in_memory()),
            Arc::new(MemoryNavigator::new("/login")),
        );
        (client, transport)
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let (client, transport) = client();
        transport.respond(
            Method::Post,
            "/auth/login",
            serde_json::json!({
                "token": "jwt-abc",
                "user": {"id": 7, "username": "inspector", "email": null, "role": "user", "created_at": null}
            }),
        );

        let user = client.login("inspector", "pw").await.unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(client.session().get().as_deref(), Some("jwt-abc"));

        let sent = transport.last_request().unwrap();
        assert!(sent.header_value("authorization").is_none());
        match sent.body {
            Some(RequestBody::Json(body)) => assert_eq!(body["username"], "inspector"),
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_login_keeps_signed_out() {
        let (client, transport) = client();
        transport.fail(
            Method::Post,
            "/auth/login",
            401,
            Some(serde_json::json!({"message": "Invalid credentials"})),
        );

        let err = client.login("inspector", "wrong").await.unwrap_err();
        assert_eq!(err.message(), "Invalid credentials");
        assert!(!err.is_session_expired());
        assert!(!client.is_signed_in());
    }

    #[tokio::test]
    async fn test_register_sends_optional_email() {
        let (client, transport) = client();
        transport
            .respond(Method::Post, "/auth/register", serde_json::json!({"message": "User created successfully"}))
            .respond(Method::Post, "/auth/register", serde_json::json!({"message": "User created successfully"}));

        client.register("a", "pw", None).await.unwrap();
        let ack = client.register("b", "pw", Some("b@site.cn")).await.unwrap();
        assert_eq!(ack.message.as_deref(), Some("User created successfully"));

        let sent = transport.requests_to(Method::Post, "/auth/register");
        match (&sent[0].body, &sent[1].body) {
            (Some(RequestBody::Json(first)), Some(RequestBody::Json(second))) => {
                assert!(first.get("email").is_none());
                assert_eq!(second["email"], "b@site.cn");
            }
            other => panic!("unexpected bodies: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_logout_clears_even_on_failure() {
        let (client, transport) = client();
        client.session().set("tok").unwrap();
        transport.fail_network(Method::Post, "/auth/logout", "connection refused");

        assert!(client.logout().await.is_err());
        assert!(!client.is_signed_in());
    }
}
