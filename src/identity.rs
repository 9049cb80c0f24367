// Identity boundary - resolves opaque bearer tokens to user ids. The rest
// of the application only sees the trait; the bundled registry keeps tokens
// in process memory and any real session backend can replace it.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppResult;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` means the token is unknown or expired - the caller treats the
    /// request as unauthenticated.
    async fn resolve(&self, token: &str) -> AppResult<Option<Uuid>>;
}

#[derive(Default)]
pub struct TokenRegistry {
    tokens: RwLock<HashMap<String, Uuid>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn issue(&self, user_id: Uuid) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.write().await.insert(token.clone(), user_id);
        token
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.tokens.write().await.remove(token).is_some()
    }
}

#[async_trait]
impl IdentityProvider for TokenRegistry {
    async fn resolve(&self, token: &str) -> AppResult<Option<Uuid>> {
        Ok(self.tokens.read().await.get(token).copied())
    }
}

/// Salted credential digests for stored user records.
pub mod credential {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use rand::RngCore;
    use sha2::{Digest, Sha256};

    fn digest(salt: &[u8], password: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        hasher.finalize().to_vec()
    }

    pub fn hash(password: &str) -> String {
        let mut salt = [0u8; 16];
        rand::rng().fill_bytes(&mut salt);
        format!(
            "{}${}",
            STANDARD.encode(salt),
            STANDARD.encode(digest(&salt, password))
        )
    }

    pub fn verify(password: &str, stored: &str) -> bool {
        let Some((salt, expected)) = stored.split_once('$') else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (STANDARD.decode(salt), STANDARD.decode(expected)) else {
            return false;
        };
        digest(&salt, password) == expected
    }

    #[cfg(test)]
    mod tests {
        use super::{hash, verify};

        #[test]
        fn hash_round_trip() {
            let stored = hash("correct horse");
            assert!(verify("correct horse", &stored));
            assert!(!verify("wrong horse", &stored));
        }

        #[test]
        fn rejects_malformed_stored_value() {
            assert!(!verify("anything", "not-a-digest"));
        }
    }
}
