use crate::error::ApiError;
use actix_web::web;
use bcrypt::BcryptError;

/// bcrypt work factor applied to every stored password.
pub const HASH_COST: u32 = 12;

pub fn hash(plaintext: &str) -> Result<String, BcryptError> {
    bcrypt::hash(plaintext, HASH_COST)
}

pub fn verify(plaintext: &str, digest: &str) -> Result<bool, BcryptError> {
    bcrypt::verify(plaintext, digest)
}

/// Hash on the blocking pool; a failure aborts the surrounding write.
pub async fn hash_blocking(plaintext: String) -> Result<String, ApiError> {
    let digest = web::block(move || hash(&plaintext)).await??;
    Ok(digest)
}

/// Verify on the blocking pool. An unreadable digest counts as a mismatch.
pub async fn verify_blocking(plaintext: String, digest: String) -> Result<bool, ApiError> {
    let matches = web::block(move || verify(&plaintext, &digest)).await?;
    Ok(matches.unwrap_or(false))
}
