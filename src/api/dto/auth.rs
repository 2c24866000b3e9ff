/*
 * Responsibility
 * - POST /auth/init, POST /auth/login の request body
 * - 入力バリデーション (メッセージは配列でそのまま 400 の body になる)
 */
use serde::Deserialize;

use crate::error::AppError;

/// Email + password. Missing fields decode as empty strings so they surface
/// as validation messages instead of decoder errors.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();

        if self.email.is_empty() {
            errors.push("email is required".to_string());
        } else if !is_email(&self.email) {
            errors.push(format!("email: {} does not validate as email", self.email));
        }

        if self.password.is_empty() {
            errors.push("password is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

// local@domain.tld, no whitespace. Deliverability is not our problem.
fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    fn messages(c: &Credentials) -> Vec<String> {
        match c.validate() {
            Err(AppError::Validation(m)) => m,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_credentials_pass() {
        assert!(creds("a@b.com", "x").validate().is_ok());
    }

    #[test]
    fn empty_fields_are_reported_together() {
        let m = messages(&creds("", ""));
        assert_eq!(m, vec!["email is required", "password is required"]);
    }

    #[test]
    fn malformed_email() {
        for bad in ["not-an-email", "a@b", "@b.com", "a@.com", "a@b.com.", "a b@c.com", "a@b@c.com"] {
            let m = messages(&creds(bad, "x"));
            assert_eq!(m.len(), 1, "{bad}");
            assert!(m[0].contains("does not validate as email"), "{bad}");
        }
    }

    #[test]
    fn missing_fields_decode_as_empty() {
        let c: Credentials = serde_json::from_str(r#"{"email":"a@b.com"}"#).unwrap();
        assert_eq!(c.password, "");
        assert_eq!(messages(&c), vec!["password is required"]);
    }
}
