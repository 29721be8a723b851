//! The authenticated caller.
//!
//! Authentication happens upstream; the gateway forwards the caller as
//! `x-actor-id` (a user UUID) and `x-actor-role` (`farmer` or `buyer`).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{UserId, UserRole};

use crate::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Any authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: UserRole,
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| ApiError::Unauthenticated(format!("missing {name} header")))?
        .to_str()
        .map_err(|_| ApiError::BadRequest(format!("invalid {name} header")))
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = uuid::Uuid::parse_str(header(parts, ACTOR_ID_HEADER)?.trim())
            .map_err(|_| ApiError::BadRequest(format!("invalid {ACTOR_ID_HEADER} header")))?;
        let role = header(parts, ACTOR_ROLE_HEADER)?
            .parse::<UserRole>()
            .map_err(|_| ApiError::BadRequest(format!("invalid {ACTOR_ROLE_HEADER} header")))?;
        Ok(Actor {
            id: UserId::from_uuid(id),
            role,
        })
    }
}

/// A caller acting as a farmer.
#[derive(Debug, Clone, Copy)]
pub struct Farmer(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Farmer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let actor = Actor::from_request_parts(parts, state).await?;
        match actor.role {
            UserRole::Farmer => Ok(Farmer(actor.id)),
            _ => Err(ApiError::Forbidden("farmer access required".to_string())),
        }
    }
}

/// A caller acting as a buyer.
#[derive(Debug, Clone, Copy)]
pub struct Buyer(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Buyer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let actor = Actor::from_request_parts(parts, state).await?;
        match actor.role {
            UserRole::Buyer => Ok(Buyer(actor.id)),
            _ => Err(ApiError::Forbidden("buyer access required".to_string())),
        }
    }
}
