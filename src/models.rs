use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Deserialize)]
pub struct UserReq {
    pub username: String,
    pub password: String,
    pub role_id: u8,
}

#[derive(Deserialize)]
pub struct LoginReqDto {
    pub username: String,
    pub password: String
}

#[derive(FromRow)]
pub struct UserSql {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub role_id: u8,
    /// Attendance subject this account belongs to, if any.
    pub subject_id: Option<u64>,
    pub school_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8,        // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this user is linked to an attendance subject
    pub subject_id: Option<u64>,
    pub school_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
