use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::dev_print;

/// Synchronous credential check invoked once per completed login or
/// registration form submission.
pub trait UserVerifier: Send + Sync {
    /// Returns `true` when `username`/`password` log in successfully
    /// (`is_login`) or are registered successfully (`!is_login`).
    fn verify(&self, username: &str, password: &str, is_login: bool) -> bool;
}

impl<F> UserVerifier for F
where
    F: Fn(&str, &str, bool) -> bool + Send + Sync,
{
    fn verify(&self, username: &str, password: &str, is_login: bool) -> bool {
        self(username, password, is_login)
    }
}

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<String, String>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users<I, U, P>(users: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        let store = Self::new();
        for (user, password) in users {
            store.users.insert(user.into(), password.into());
        }
        store
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserVerifier for MemoryUserStore {
    fn verify(&self, username: &str, password: &str, is_login: bool) -> bool {
        if username.is_empty() || password.is_empty() {
            return false;
        }
        dev_print!("verify user: {} (login: {})", username, is_login);

        if is_login {
            return self
                .users
                .get(username)
                .map(|stored| stored.value() == password)
                .unwrap_or(false);
        }

        match self.users.entry(username.to_owned()) {
            Entry::Occupied(_) => {
                dev_print!("user {} already registered", username);
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(password.to_owned());
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_checks_password() {
        let store = MemoryUserStore::with_users([("alice", "secret")]);
        assert!(store.verify("alice", "secret", true));
        assert!(!store.verify("alice", "wrong", true));
        assert!(!store.verify("bob", "secret", true));
    }

    #[test]
    fn register_inserts_once() {
        let store = MemoryUserStore::new();
        assert!(store.verify("carol", "pw", false));
        assert!(store.contains("carol"));
        assert!(!store.verify("carol", "other", false));
        assert!(store.verify("carol", "pw", true));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn empty_credentials_never_verify() {
        let store = MemoryUserStore::with_users([("dave", "pw")]);
        assert!(!store.verify("", "pw", true));
        assert!(!store.verify("dave", "", true));
        assert!(!store.verify("", "", false));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn closures_are_verifiers() {
        let always = |_: &str, _: &str, login: bool| login;
        assert!(always.verify("x", "y", true));
        assert!(!always.verify("x", "y", false));
    }
}
