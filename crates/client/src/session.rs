//! Authentication session.
//!
//! A login is either remembered (token and profile in durable storage) or
//! session-only (kept in process memory). The two never coexist: saving to
//! one clears the other. The token itself lives in the shared
//! [`Credentials`] cell the API client reads from.

use foody_core::{Email, EmailError, PhoneError, PhoneNumber};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::api::auth::{Avatar, ProfileForm, RegisterBody, User};
use crate::api::{ApiClient, ApiError, Credentials};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::storage::{SharedStorage, StorageError, keys};

const PROFILE_UPDATED: &str = "Profile updated successfully";

/// Login and registration errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Name is required.")]
    NameRequired,

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid phone: {0}")]
    InvalidPhone(#[from] PhoneError),

    #[error("Password is required.")]
    PasswordRequired,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    /// The server answered without a token.
    #[error("Login failed. Please try again.")]
    NoToken,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Api(#[from] ApiError),
}

/// Profile form errors; messages are shown as-is.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Name is required.")]
    NameRequired,

    #[error("Email is required.")]
    EmailRequired,

    #[error("Invalid email format.")]
    InvalidEmail,

    #[error("Mobile phone number is required.")]
    PhoneRequired,

    #[error("Mobile phone number must be 8-15 digits.")]
    InvalidPhone,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Api(#[from] ApiError),
}

/// Registration form as entered.
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: SecretString,
    pub password_confirmation: SecretString,
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .finish_non_exhaustive()
    }
}

impl RegisterForm {
    fn validate(self) -> Result<RegisterBody, AuthError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AuthError::NameRequired);
        }
        let email = Email::parse(&self.email)?;
        let phone = PhoneNumber::parse(&self.phone)?;
        if self.password.expose_secret().is_empty() {
            return Err(AuthError::PasswordRequired);
        }
        if self.password.expose_secret() != self.password_confirmation.expose_secret() {
            return Err(AuthError::PasswordMismatch);
        }

        Ok(RegisterBody {
            name: name.to_string(),
            email: email.into_inner(),
            phone: phone.international(),
            password: self.password,
            password_confirmation: self.password_confirmation,
        })
    }
}

/// Profile edit form as entered.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub avatar: Option<Avatar>,
}

impl ProfileUpdate {
    fn validate(self) -> Result<ProfileForm, ProfileError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ProfileError::NameRequired);
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ProfileError::EmailRequired);
        }
        Email::parse(email).map_err(|_| ProfileError::InvalidEmail)?;
        let phone = self.phone.trim();
        if phone.is_empty() {
            return Err(ProfileError::PhoneRequired);
        }
        PhoneNumber::parse(phone).map_err(|_| ProfileError::InvalidPhone)?;

        Ok(ProfileForm {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            avatar: self.avatar,
        })
    }
}

/// The user's authentication state.
pub struct AuthSession {
    api: ApiClient,
    durable: SharedStorage,
    session: SharedStorage,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("credentials", self.api.credentials())
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// `durable` survives restarts; `session` lives as long as the process.
    #[must_use]
    pub fn new(api: ApiClient, durable: SharedStorage, session: SharedStorage) -> Self {
        Self {
            api,
            durable,
            session,
        }
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        self.api.credentials()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.credentials().is_present()
    }

    /// Load a saved token into the credentials. Durable storage wins over
    /// session storage. Returns true if a token was found.
    pub fn restore(&self) -> bool {
        let token = [&self.durable, &self.session]
            .into_iter()
            .find_map(|storage| match storage.get(keys::AUTH_TOKEN) {
                Ok(token) => token.filter(|t| !t.is_empty()),
                Err(e) => {
                    warn!(error = %e, "Failed to read saved token");
                    None
                }
            });

        match token {
            Some(token) => {
                self.credentials().set(token);
                debug!("Restored saved login");
                true
            }
            None => false,
        }
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid input, rejected credentials, or a
    /// storage failure.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: SecretString,
        remember: bool,
    ) -> Result<Option<User>, AuthError> {
        let email = Email::parse(email)?;
        if password.expose_secret().is_empty() {
            return Err(AuthError::PasswordRequired);
        }

        let payload = self.api.login(email.as_str(), &password).await?;
        self.save(payload.token, payload.user.as_ref(), remember)?;
        info!(remember, "Logged in");
        Ok(payload.user)
    }

    /// Create an account and log in, remembered.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid input or if the server rejects the
    /// registration.
    #[instrument(skip(self, form))]
    pub async fn register(&self, form: RegisterForm) -> Result<Option<User>, AuthError> {
        let body = form.validate()?;
        let payload = self.api.register(&body).await?;
        self.save(payload.token, payload.user.as_ref(), true)?;
        info!("Registered");
        Ok(payload.user)
    }

    /// The logged-in user: the saved profile if readable, else `/api/auth/me`.
    ///
    /// # Errors
    ///
    /// Returns an error if no profile is saved and the fetch fails.
    pub async fn current_user(&self) -> Result<User, AuthError> {
        if let Some(user) = self.saved_user() {
            return Ok(user);
        }
        Ok(self.api.me().await?)
    }

    /// Validate and submit a profile edit. Returns the updated user and
    /// the message to show.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any request, or the server error.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<(User, String), ProfileError> {
        let form = update.validate()?;
        let (user, message) = self.api.update_profile(form).await?;

        let target = if self.durable.get(keys::AUTH_TOKEN)?.is_some() {
            &self.durable
        } else {
            &self.session
        };
        target.set(keys::AUTH_USER, &serde_json::to_string(&user).map_err(ApiError::from)?)?;

        let message = if message.is_empty() {
            PROFILE_UPDATED.to_string()
        } else {
            message
        };
        Ok((user, message))
    }

    /// Forget the login everywhere.
    pub fn logout(&self) {
        for storage in [&self.durable, &self.session] {
            for key in [keys::AUTH_TOKEN, keys::AUTH_USER] {
                if let Err(e) = storage.remove(key) {
                    warn!(error = %e, key, "Failed to remove saved login");
                }
            }
        }
        self.credentials().clear();
        clear_sentry_user();
        info!("Logged out");
    }

    #[must_use]
    pub fn has_seen_onboarding(&self) -> bool {
        matches!(self.durable.get(keys::ONBOARDING_SEEN), Ok(Some(_)))
    }

    pub fn mark_onboarding_seen(&self) {
        if let Err(e) = self.durable.set(keys::ONBOARDING_SEEN, "true") {
            warn!(error = %e, "Failed to save onboarding flag");
        }
    }

    fn save(&self, token: String, user: Option<&User>, remember: bool) -> Result<(), AuthError> {
        if token.is_empty() {
            return Err(AuthError::NoToken);
        }
        let (target, other) = if remember {
            (&self.durable, &self.session)
        } else {
            (&self.session, &self.durable)
        };

        target.set(keys::AUTH_TOKEN, &token)?;
        match user {
            Some(user) => {
                let raw = serde_json::to_string(user).map_err(ApiError::from)?;
                target.set(keys::AUTH_USER, &raw)?;
                set_sentry_user(&user.id, Some(&user.email));
            }
            None => target.remove(keys::AUTH_USER)?,
        }
        other.remove(keys::AUTH_TOKEN)?;
        other.remove(keys::AUTH_USER)?;

        self.credentials().set(token);
        Ok(())
    }

    fn saved_user(&self) -> Option<User> {
        [&self.durable, &self.session].into_iter().find_map(|storage| {
            let raw = storage.get(keys::AUTH_USER).ok().flatten()?;
            serde_json::from_str(&raw).ok()
        })
    }
}
