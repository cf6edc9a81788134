use dashmap::DashMap;
use rand::Rng;
use rand::distributions::Alphanumeric;
use uuid::Uuid;

/// In-memory bearer tokens for the admin dashboard. Tokens die with the
/// process; admins simply log in again after a restart.
#[derive(Debug, Default)]
pub struct AdminTokens {
    tokens: DashMap<String, Uuid>,
}

impl AdminTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, admin_id: Uuid) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();
        self.tokens.insert(token.clone(), admin_id);
        token
    }

    pub fn verify(&self, token: &str) -> Option<Uuid> {
        self.tokens.get(token).map(|entry| *entry.value())
    }

    pub fn revoke(&self, token: &str) {
        self.tokens.remove(token);
    }
}

pub mod password {
    use rand::Rng;
    use rand::distributions::Alphanumeric;
    use sha2::{Digest, Sha256};

    /// Hashes as `salt$hex(sha256(salt + password))`.
    pub fn hash(password: &str) -> String {
        let salt: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        format!("{salt}${}", digest(&salt, password))
    }

    pub fn verify(password: &str, stored: &str) -> bool {
        match stored.split_once('$') {
            Some((salt, expected)) => digest(salt, password) == expected,
            None => false,
        }
    }

    fn digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify_until_revoked() {
        let tokens = AdminTokens::new();
        let admin_id = Uuid::new_v4();

        let token = tokens.issue(admin_id);
        assert_eq!(tokens.verify(&token), Some(admin_id));
        assert_eq!(tokens.verify("forged"), None);

        tokens.revoke(&token);
        assert_eq!(tokens.verify(&token), None);
    }

    #[test]
    fn password_hashes_are_salted_and_verifiable() {
        let first = password::hash("wachtwoord");
        let second = password::hash("wachtwoord");
        assert_ne!(first, second);

        assert!(password::verify("wachtwoord", &first));
        assert!(password::verify("wachtwoord", &second));
        assert!(!password::verify("fout", &first));
        assert!(!password::verify("wachtwoord", "malformed"));
    }
}
