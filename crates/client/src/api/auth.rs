//! `/api/auth` endpoints.

use foody_core::UserId;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError};

/// A Foody user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Token and profile returned by login and registration.
#[derive(Deserialize)]
pub struct AuthPayload {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

impl std::fmt::Debug for AuthPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthPayload")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Body of `POST /api/auth/register`, already normalised.
#[derive(Serialize)]
pub struct RegisterBody {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    #[serde(serialize_with = "expose")]
    pub password_confirmation: SecretString,
}

impl std::fmt::Debug for RegisterBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterBody")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .finish_non_exhaustive()
    }
}

fn expose<S: serde::Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Avatar image upload.
#[derive(Debug, Clone)]
pub struct Avatar {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Multipart fields for `PUT /api/auth/profile`, already validated.
#[derive(Debug, Clone)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub avatar: Option<Avatar>,
}

impl ProfileForm {
    fn into_multipart(self) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("name", self.name)
            .text("email", self.email)
            .text("phone", self.phone);
        if let Some(avatar) = self.avatar {
            let part = Part::bytes(avatar.bytes)
                .file_name(avatar.file_name)
                .mime_str(&avatar.mime)?;
            form = form.part("avatar", part);
        }
        Ok(form)
    }
}

#[derive(Debug, Deserialize)]
struct UserData {
    user: User,
}

impl ApiClient {
    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthPayload, ApiError> {
        let body = LoginBody {
            email,
            password: password.expose_secret(),
        };
        self.post("/api/auth/login", &body)
            .await?
            .into_data("auth token")
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the registration.
    #[instrument(skip(self, body), fields(email = %body.email))]
    pub async fn register(&self, body: &RegisterBody) -> Result<AuthPayload, ApiError> {
        self.post("/api/auth/register", body)
            .await?
            .into_data("auth token")
    }

    /// The logged-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the user is not logged in.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ApiError> {
        let data: UserData = self.get("/api/auth/me", &[]).await?.into_data("user")?;
        Ok(data.user)
    }

    /// Replace profile fields; returns the updated profile and the server's
    /// message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects the update.
    #[instrument(skip(self, form))]
    pub async fn update_profile(&self, form: ProfileForm) -> Result<(User, String), ApiError> {
        let url = self.url("/api/auth/profile", &[])?;
        let builder = self.request(Method::PUT, url).multipart(form.into_multipart()?);
        let envelope = self.send::<User>(builder).await?;
        let message = envelope.message.clone();
        Ok((envelope.into_data("user")?, message))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_register_body_serializes_passwords() {
        let body = RegisterBody {
            name: "Sari".to_string(),
            email: "sari@foody.id".to_string(),
            phone: "6281234567890".to_string(),
            password: SecretString::from("rahasia123"),
            password_confirmation: SecretString::from("rahasia123"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["password_confirmation"], "rahasia123");
        assert!(!format!("{body:?}").contains("rahasia123"));
    }

    #[test]
    fn test_auth_payload_debug_redacts() {
        let payload: AuthPayload =
            serde_json::from_str(r#"{"token":"jwt-abc","user":null}"#).unwrap();
        assert!(!format!("{payload:?}").contains("jwt-abc"));
    }
}
