//! Access configuration and the per-request gate decision.
//!
//! The board runs under exactly one access policy, loaded once at startup
//! from a TOML file:
//!
//! ```toml
//! policy = "credential"
//!
//! [users.asher]
//! password = "..."
//! role = "H"
//! ```
//!
//! or
//!
//! ```toml
//! policy = "token"
//! token = "..."
//! ```
//!
//! [`AccessConfig::evaluate`] is pure: it looks at the path, the `token`
//! query parameter and what the session already holds, and returns a
//! [`Verdict`]. Applying the verdict (redirects, cookies, status codes) is the
//! HTTP layer's job.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::AccessConfigError;
use crate::role::Role;

/// Paths every policy lets through untouched.
const ALWAYS_EXEMPT: &[&str] = &["/robots.txt", "/health"];
const STATIC_PREFIX: &str = "/static";
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AccessPolicy {
    /// Username/password table; a successful login sets the session flag.
    Credential { users: BTreeMap<String, Account> },
    /// One shared secret presented as `?token=` or remembered in session.
    Token { secret: String },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PolicyKind {
    Credential,
    Token,
}

#[derive(Debug, Deserialize)]
struct AccessFile {
    policy: PolicyKind,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    users: BTreeMap<String, Account>,
}

/// What the gate knows about a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateInput<'a> {
    pub path: &'a str,
    /// Every value of the `token` query parameter, in order. Empty when the
    /// parameter is absent.
    pub query_tokens: &'a [&'a str],
    pub logged_in: bool,
    pub session_token: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    /// Admit and store this token in the session for later requests.
    AdmitRemember(String),
    /// Credential policy, no login yet.
    RedirectToLogin,
    /// Token policy, wrong or missing token. The session must be cleared.
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessConfig {
    policy: AccessPolicy,
}

impl AccessConfig {
    pub fn credential(
        users: impl IntoIterator<Item = (String, Account)>,
    ) -> Result<Self, AccessConfigError> {
        let users: BTreeMap<_, _> = users.into_iter().collect();
        if users.is_empty() {
            return Err(AccessConfigError::NoUsers);
        }
        Ok(Self {
            policy: AccessPolicy::Credential { users },
        })
    }

    pub fn token(secret: impl Into<String>) -> Result<Self, AccessConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AccessConfigError::MissingToken);
        }
        Ok(Self {
            policy: AccessPolicy::Token { secret },
        })
    }

    /// Read and validate the access file at `path`.
    pub fn load(path: &Path) -> Result<Self, AccessConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| AccessConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: AccessFile = toml::from_str(&text).map_err(|source| AccessConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        match file.policy {
            PolicyKind::Credential => Self::credential(file.users),
            PolicyKind::Token => Self::token(file.token.unwrap_or_default()),
        }
    }

    pub fn is_token_policy(&self) -> bool {
        matches!(self.policy, AccessPolicy::Token { .. })
    }

    /// Role for a matching username/password pair. Always `None` under the
    /// token policy.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<Role> {
        match &self.policy {
            AccessPolicy::Credential { users } => users
                .get(username)
                .filter(|account| account.password == password)
                .map(|account| account.role),
            AccessPolicy::Token { .. } => None,
        }
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        if ALWAYS_EXEMPT.contains(&path) || is_static(path) {
            return true;
        }
        matches!(self.policy, AccessPolicy::Credential { .. }) && path == LOGIN_PATH
    }

    pub fn evaluate(&self, input: GateInput<'_>) -> Verdict {
        if self.is_exempt(input.path) {
            return Verdict::Admit;
        }
        match &self.policy {
            AccessPolicy::Credential { .. } => {
                if input.logged_in {
                    Verdict::Admit
                } else {
                    Verdict::RedirectToLogin
                }
            }
            // A presented parameter always wins over what the session holds,
            // and every repetition of it must match.
            AccessPolicy::Token { secret } => match input.query_tokens {
                [] => match input.session_token {
                    Some(t) if t == secret => Verdict::Admit,
                    _ => Verdict::Forbidden,
                },
                presented if presented.iter().all(|t| *t == secret) => {
                    if input.session_token == Some(secret.as_str()) {
                        Verdict::Admit
                    } else {
                        Verdict::AdmitRemember(secret.clone())
                    }
                }
                _ => Verdict::Forbidden,
            },
        }
    }
}

fn is_static(path: &str) -> bool {
    path == STATIC_PREFIX
        || path
            .strip_prefix(STATIC_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'))
}
