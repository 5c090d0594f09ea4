use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use serde::{Serialize, Deserialize};
use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, errors::Error};
use chrono::{Utc, Duration};
use mongodb::bson::oid::ObjectId;
use std::env;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub name: String,
    pub exp: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub exp: usize,
}

pub fn generate_access_token(user_id: &str, name: &str) -> String {
    let expiration = Utc::now() + Duration::hours(2);
    let access_claims = AccessClaims {
        sub: user_id.to_owned(),
        name: name.to_owned(),
        exp: expiration.timestamp() as usize,
    };
    let secret = env::var("ACCESS_TOKEN_SECRET").expect("Access token secret not found in .env");

    encode(
        &Header::default(),
        &access_claims,
        &EncodingKey::from_secret(secret.as_ref()),
    ).expect("Failed to generate access token.")
}

pub fn verify_access_token(token: &str) -> Result<AccessClaims, Error> {
    let secret = env::var("ACCESS_TOKEN_SECRET")
        .expect("❌ Access token secret not found in .env");

    let token_data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

pub fn generate_refresh_token(user_id: &str) -> String {
    let expiration = Utc::now() + Duration::days(7);
    let refresh_claims = RefreshClaims {
        sub: user_id.to_owned(),
        exp: expiration.timestamp() as usize,
    };
    let secret = env::var("REFRESH_TOKEN_SECRET").expect("Refresh token secret not found in .env");

    encode(
        &Header::default(),
        &refresh_claims,
        &EncodingKey::from_secret(secret.as_ref()),
    ).expect("Failed to generate refresh token.")
}

pub fn verify_refresh_token(token: &str) -> Option<RefreshClaims> {
    let secret = env::var("REFRESH_TOKEN_SECRET").expect("Refresh token secret not found in .env");
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Caller identity resolved from the `Authorization: Bearer` header.
pub struct AuthUser(pub ObjectId);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::NotAuthenticated)?;

        let claims = verify_access_token(token).map_err(|_| AppError::NotAuthenticated)?;

        ObjectId::parse_str(&claims.sub)
            .map(AuthUser)
            .map_err(|_| AppError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_secrets() {
        unsafe {
            env::set_var("ACCESS_TOKEN_SECRET", "test-access-secret");
            env::set_var("REFRESH_TOKEN_SECRET", "test-refresh-secret");
        }
    }

    #[test]
    fn access_token_round_trips() {
        set_secrets();
        let user_id = ObjectId::new().to_hex();
        let token = generate_access_token(&user_id, "ada");
        let claims = verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.name, "ada");
    }

    #[test]
    fn garbage_access_token_is_rejected() {
        set_secrets();
        assert!(verify_access_token("not-a-token").is_err());
    }

    #[test]
    fn refresh_token_round_trips() {
        set_secrets();
        let user_id = ObjectId::new().to_hex();
        let token = generate_refresh_token(&user_id);
        let claims = verify_refresh_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
    }
}
