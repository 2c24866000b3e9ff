use std::sync::LazyLock;

use anyhow::Context;

/// bcrypt work factor used for every stored hash.
pub const HASH_COST: u32 = bcrypt::DEFAULT_COST;

// Compared against when the email is unknown, so a miss costs as much as a
// wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| bcrypt::hash("l10n-api-dummy-password", HASH_COST).ok());

/// Hash a password on the blocking pool.
pub async fn hash(password: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, HASH_COST))
        .await
        .context("password hashing task failed")?
        .context("bcrypt hash")
}

/// Check a password against a stored hash on the blocking pool.
///
/// A malformed stored hash is reported as an error, not as a mismatch.
pub async fn verify(password: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .context("password verification task failed")?
        .context("bcrypt verify")
}

/// Compute the dummy hash up front, so the first unknown-email login does not
/// pay for hashing it on top of the verify.
pub async fn warm_up() -> anyhow::Result<()> {
    let ready = tokio::task::spawn_blocking(|| LazyLock::force(&DUMMY_HASH).is_some())
        .await
        .context("password warm-up task failed")?;
    anyhow::ensure!(ready, "failed to compute dummy password hash");
    Ok(())
}

/// Burn the same CPU time as `verify` without a real hash.
pub async fn verify_dummy(password: String) {
    let _ = tokio::task::spawn_blocking(move || {
        if let Some(hash) = DUMMY_HASH.as_deref() {
            let _ = bcrypt::verify(password, hash);
        }
    })
    .await;
}
