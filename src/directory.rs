use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::limits::*;
use crate::model::User;

/// In-memory user directory. Logins are unique; passwords are opaque
/// strings compared verbatim.
pub struct Directory {
    users: DashMap<String, User>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    UnknownUser,
    WrongPassword,
    AlreadyRegistered,
    LimitExceeded(&'static str),
}

impl std::fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryError::UnknownUser => write!(f, "unknown user"),
            DirectoryError::WrongPassword => write!(f, "wrong password"),
            DirectoryError::AlreadyRegistered => write!(f, "login already registered"),
            DirectoryError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for DirectoryError {}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn register(&self, login: &str, password: &str) -> Result<(), DirectoryError> {
        self.insert(User::new(login, password))
    }

    pub fn create_admin(&self, login: &str, password: &str) -> Result<(), DirectoryError> {
        self.insert(User::admin(login, password))
    }

    fn insert(&self, user: User) -> Result<(), DirectoryError> {
        if user.login.is_empty() {
            return Err(DirectoryError::LimitExceeded("empty login"));
        }
        if user.login.len() > MAX_LOGIN_LEN {
            return Err(DirectoryError::LimitExceeded("login too long"));
        }
        if self.users.len() >= MAX_USERS {
            return Err(DirectoryError::LimitExceeded("too many users"));
        }
        match self.users.entry(user.login.clone()) {
            Entry::Occupied(_) => Err(DirectoryError::AlreadyRegistered),
            Entry::Vacant(v) => {
                v.insert(user);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, login: &str, password: &str) -> Result<User, DirectoryError> {
        let user = self
            .users
            .get(login)
            .ok_or(DirectoryError::UnknownUser)?;
        if user.password != password {
            return Err(DirectoryError::WrongPassword);
        }
        Ok(user.clone())
    }

    /// Credential-checked self-removal.
    pub fn remove(&self, login: &str, password: &str) -> Result<(), DirectoryError> {
        // Verify first so a wrong password can't delete the account.
        self.lookup(login, password)?;
        self.users.remove(login);
        Ok(())
    }
}
