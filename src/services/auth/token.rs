//! Signed bearer tokens (compact JWS, HS256).
//!
//! The token is the only thing that carries identity between requests: the
//! server keeps no session state, so everything needed to rebuild `Claims` is
//! inside the signed payload.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use super::claims::Claims;
use super::role::Role;

/// Lifetime of every issued token. Fixed at 14 days.
pub const TOKEN_TTL_SECONDS: i64 = 14 * 24 * 60 * 60;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
#[error("failed to sign token: {0}")]
pub struct SigningError(#[from] jsonwebtoken::errors::Error);

/// Why a presented token was rejected.
///
/// The sub-kinds exist for logs only. Callers must treat all of them as
/// "not authenticated".
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("malformed token: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),
    #[error("unexpected signing algorithm")]
    UnexpectedAlgorithm,
    #[error("invalid signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for VerificationError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::UnexpectedAlgorithm
            }
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed(e),
        }
    }
}

/// Encodes and verifies tokens with a process-wide symmetric secret.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        // Only HS256 is accepted. A token whose header names any other
        // algorithm is rejected before the MAC is even looked at.
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Mint a token for a user, expiring `TOKEN_TTL_SECONDS` from now.
    pub fn issue(&self, subject: Uuid, email: &str, role: Role) -> Result<String, SigningError> {
        let expires_at = now() + TOKEN_TTL_SECONDS;
        self.encode(&Claims::new(subject, email, role, expires_at))
    }

    /// Sign an already prepared claim set.
    pub fn encode(&self, claims: &Claims) -> Result<String, SigningError> {
        let token = jsonwebtoken::encode(&Header::new(ALGORITHM), claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify a token and return its claims.
    ///
    /// `jsonwebtoken` checks the header algorithm, the MAC and `exp < now`.
    /// The boundary instant itself (`exp == now`) is rejected here as well.
    pub fn decode(&self, token: &str) -> Result<Claims, VerificationError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;

        if data.claims.expires_at <= now() {
            return Err(VerificationError::Expired);
        }

        Ok(data.claims)
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
