//! Buyer and farmer accounts.

use chrono::Utc;
use common::{User, UserId, UserRole};
use serde::Deserialize;
use store::{MarketStore, StoreError};

use crate::error::{DomainError, Result};
use crate::validation::{is_valid_email, is_valid_phone, non_blank, sanitize};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterAccount {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: UserRole,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
}

impl RegisterAccount {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: None,
            role,
            city: String::new(),
            state: String::new(),
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn located_in(mut self, city: impl Into<String>, state: impl Into<String>) -> Self {
        self.city = city.into();
        self.state = state.into();
        self
    }
}

pub struct AccountService<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> AccountService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates an account. Emails are stored lower-cased.
    #[tracing::instrument(skip(self, cmd), fields(role = %cmd.role))]
    pub async fn register(&self, cmd: RegisterAccount) -> Result<User> {
        let name = sanitize(&cmd.name);
        if name.is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        let email = cmd.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(DomainError::validation("invalid email"));
        }
        let phone = non_blank(cmd.phone.as_deref());
        if let Some(ref phone) = phone
            && !is_valid_phone(phone)
        {
            return Err(DomainError::validation("invalid phone number"));
        }

        let user = User {
            id: UserId::new(),
            name,
            email,
            phone,
            role: cmd.role,
            city: sanitize(&cmd.city),
            state: sanitize(&cmd.state),
            created_at: Utc::now(),
        };
        self.store.insert_user(&user).await.map_err(|e| match e {
            StoreError::UniqueViolation { constraint } if constraint.contains("phone") => {
                DomainError::AlreadyRegistered("phone")
            }
            StoreError::UniqueViolation { .. } => DomainError::AlreadyRegistered("email"),
            other => DomainError::Store(other),
        })?;

        tracing::info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    pub async fn get(&self, user_id: UserId) -> Result<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(DomainError::NotFound("user"))
    }
}
