use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

fn make_claims(
    user_id: u64,
    username: String,
    role: u8,
    subject_id: Option<u64>,
    school_id: Option<u64>,
    ttl: usize,
    token_type: TokenType,
) -> Claims {
    Claims {
        user_id,
        sub: username,
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
        subject_id,
        school_id,
    }
}

pub fn generate_access_token(
    user_id: u64,
    username: String,
    role: u8,
    subject_id: Option<u64>,
    school_id: Option<u64>,
    secret: &str,
    ttl: usize,
) -> String {
    let claims = make_claims(user_id, username, role, subject_id, school_id, ttl, TokenType::Access);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn generate_refresh_token(
    user_id: u64,
    username: String,
    role: u8,
    subject_id: Option<u64>,
    school_id: Option<u64>,
    secret: &str,
    ttl: usize,
) -> (String, Claims) {
    let claims = make_claims(user_id, username, role, subject_id, school_id, ttl, TokenType::Refresh);

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap();

    (token, claims)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
