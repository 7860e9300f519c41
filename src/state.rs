use jsonwebtoken::DecodingKey;

use crate::db::{DbPool, OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    /// Prepared once at startup so request handling never touches the
    /// raw secret.
    pub jwt_key: DecodingKey,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, jwt_secret: &str) -> Self {
        Self {
            pool,
            orm,
            jwt_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }
}
