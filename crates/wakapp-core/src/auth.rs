//! Login, registration and logout.
//!
//! Authentication is external to this client: a login only looks the user
//! up and records the session. Passwords are accepted but never checked.

use crate::api::{ApiClient, NewUser};
use crate::error::{CoreError, Result, ValidationError};
use crate::session::{Identity, Session, SessionBackend};

/// What the login boundary can receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginInput {
    /// A fully known identity, e.g. handed over by another screen.
    Identity(Identity),
    Credentials { username: String, password: String },
}

/// Sign-up form. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    username: String,
    email: String,
    phone: String,
}

impl Registration {
    pub fn new(username: &str, email: &str, phone: &str) -> Result<Self, ValidationError> {
        let required = |field: &'static str, value: &str| {
            let value = value.trim();
            if value.is_empty() {
                Err(ValidationError::EmptyField { field })
            } else {
                Ok(value.to_string())
            }
        };
        Ok(Self {
            username: required("username", username)?,
            email: required("email", email)?,
            phone: required("phone", phone)?,
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    SignedIn(Identity),
    /// The account exists but the service did not hand back an identity.
    Registered,
}

pub struct Auth<'a> {
    api: &'a ApiClient,
}

impl<'a> Auth<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Turn a login input into a known identity.
    pub async fn resolve(&self, input: LoginInput) -> Result<Identity> {
        match input {
            LoginInput::Identity(identity) => Ok(identity),
            LoginInput::Credentials { username, .. } => {
                let wanted = username.trim();
                if wanted.is_empty() {
                    return Err(ValidationError::EmptyField { field: "username" }.into());
                }
                self.api
                    .list_users()
                    .await?
                    .into_iter()
                    .find(|u| u.username == wanted)
                    .ok_or_else(|| CoreError::not_found("user", wanted))
            }
        }
    }

    pub async fn login<B: SessionBackend>(
        &self,
        session: &mut Session<B>,
        input: LoginInput,
    ) -> Result<Identity> {
        let identity = self.resolve(input).await?;
        session.establish(identity.clone())?;
        Ok(identity)
    }

    /// Look the user up by email and sign in.
    ///
    /// Emails match ignoring ASCII case and surrounding whitespace. The email
    /// is remembered for the next login prompt.
    pub async fn login_with_email<B: SessionBackend>(
        &self,
        session: &mut Session<B>,
        email: &str,
    ) -> Result<Identity> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::EmptyField { field: "email" }.into());
        }

        let identity = self
            .api
            .list_users()
            .await?
            .into_iter()
            .find(|u| u.email.trim().eq_ignore_ascii_case(email))
            .ok_or_else(|| CoreError::not_found("user", email))?;

        session.remember_email(email);
        session.establish(identity.clone())?;
        Ok(identity)
    }

    pub async fn register<B: SessionBackend>(
        &self,
        session: &mut Session<B>,
        registration: Registration,
    ) -> Result<RegistrationOutcome> {
        let user = NewUser {
            username: registration.username,
            email: registration.email,
            phone: registration.phone,
        };
        match self.api.create_user(&user).await? {
            Some(identity) => {
                session.remember_email(&user.email);
                session.establish(identity.clone())?;
                Ok(RegistrationOutcome::SignedIn(identity))
            }
            None => {
                tracing::info!(username = %user.username, "registered without an identity; login required");
                Ok(RegistrationOutcome::Registered)
            }
        }
    }

    pub fn logout<B: SessionBackend>(&self, session: &mut Session<B>) -> Result<()> {
        session.clear()
    }
}
