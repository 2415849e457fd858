/// Database models for the vault.
///
/// These structs map directly to PostgreSQL tables and are used
/// for both reading and writing via sqlx.
use sqlx::FromRow;

/// Discriminant for the two payload kinds a resource can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[repr(i32)]
pub enum ResourceKind {
    Piece = 1,
    Blob = 2,
}

/// A registered identity.
#[derive(Debug, Clone, FromRow)]
pub struct Identity {
    pub login: String,
    /// Base64-wrapped bcrypt hash of the password.
    pub passw: String,
}

/// A catalog entry as listed to its owner. Payload references never
/// leave the state layer.
#[derive(Debug, Clone, FromRow)]
pub struct ResourceEntry {
    pub id: i64,
    pub kind: ResourceKind,
    pub meta: String,
}

/// The owner-gated view of one resource, resolved before payload access.
#[derive(Debug, Clone, FromRow)]
pub struct OwnedResource {
    pub meta: String,
    pub payload_ref: i32,
}

/// An encrypted piece payload row.
#[derive(Debug, FromRow)]
pub struct PieceRow {
    pub ciphertext: Vec<u8>,
    pub salt: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// A blob payload row; the ciphertext lives in the file at `location`.
#[derive(Debug, FromRow)]
pub struct BlobRow {
    pub location: String,
    pub salt: Vec<u8>,
    pub iv: Vec<u8>,
}
