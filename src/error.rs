use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("bad input: {0}")]
    BadInput(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("resource not found")]
    ResourceNotFound,

    #[error("login already taken")]
    Conflict,

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("session token: {0}")]
    Token(String),

    #[error("config: {0}")]
    Config(String),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VaultError>;
