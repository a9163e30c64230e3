use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Password hashing and bearer token issuance. Tokens are HS256 JWTs whose
/// subject is the user id.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| anyhow::anyhow!("password hashing failed: {err}"))?;
        Ok(hash.to_string())
    }

    /// Checks the password against the stored hash. The configured master
    /// password, when set, is accepted for any account.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        if let Some(master) = &self.config.master_password {
            if password == master {
                return true;
            }
        }
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn issue_token(&self, user_id: &str) -> AppResult<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: crate::utils::now_unix() + self.config.token_ttl_secs,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|err| anyhow::anyhow!("token signing failed: {err}"))?;
        Ok(token)
    }

    /// Returns the user id carried by a valid, unexpired token.
    pub fn verify_token(&self, token: &str) -> AppResult<String> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidCredentials("invalid or expired token".into()))?;
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            token_ttl_secs: 3600,
            master_password: None,
        }
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let auth = AuthService::new(test_config());
        let hash = auth.hash_password("hunter2").unwrap();
        assert!(auth.verify_password("hunter2", &hash));
        assert!(!auth.verify_password("hunter3", &hash));
        assert!(!auth.verify_password("hunter2", "not-a-phc-string"));
    }

    #[test]
    fn master_password_unlocks_any_account() {
        let mut config = test_config();
        config.master_password = Some("skeleton-key".into());
        let auth = AuthService::new(config);
        let hash = auth.hash_password("hunter2").unwrap();
        assert!(auth.verify_password("skeleton-key", &hash));
        assert!(!auth.verify_password("wrong", &hash));
    }

    #[test]
    fn token_round_trip_carries_user_id() {
        let auth = AuthService::new(test_config());
        let token = auth.issue_token("user-42").unwrap();
        assert_eq!(auth.verify_token(&token).unwrap(), "user-42");
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut config = test_config();
        config.token_ttl_secs = -120;
        let auth = AuthService::new(config);
        let token = auth.issue_token("user-42").unwrap();
        assert!(matches!(
            auth.verify_token(&token),
            Err(AppError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let auth = AuthService::new(test_config());
        assert!(auth.verify_token("not.a.token").is_err());
        // Tokens signed with another secret must not validate.
        let other = AuthService::new(AuthConfig {
            jwt_secret: "other-secret".into(),
            token_ttl_secs: 3600,
            master_password: None,
        });
        let token = other.issue_token("user-42").unwrap();
        assert!(auth.verify_token(&token).is_err());
    }
}
