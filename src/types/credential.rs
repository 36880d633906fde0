//! Credential candidates.
//!
//! A `Credential` is an immutable username/password pair. `CredentialSource`
//! holds the ordered candidate lists handed to the scheduler; where they came
//! from does not matter to the engine. A source built from `user:password`
//! lines also keeps those pairs, which are tried as listed instead of being
//! crossed.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A username/password pair under test.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credential {
    username: String,
    password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Whether both fields fit on one protocol command line.
    pub fn is_line_safe(&self) -> bool {
        is_line_safe(&self.username) && is_line_safe(&self.password)
    }

    /// Parse a `user:password` line. The password may itself contain colons.
    pub fn parse_pair(line: &str) -> Option<Self> {
        let (user, pass) = line.trim().split_once(':')?;
        if user.is_empty() {
            return None;
        }
        Some(Self::new(user, pass))
    }
}

// Passwords stay out of debug output and logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:***", self.username)
    }
}

const DEFAULT_USERS: &[&str] = &["admin", "root", "test", "user", "guest"];
const DEFAULT_PASSWORDS: &[&str] = &["admin", "password", "123456", "test", "1234"];

/// Ordered, de-duplicated username and password candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSource {
    users: Vec<String>,
    passwords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pairs: Vec<Credential>,
}

impl CredentialSource {
    /// Build from raw lists, trimming entries and keeping first occurrences.
    ///
    /// Blank usernames are dropped; blank passwords are kept once since an
    /// empty password is a legitimate candidate. Entries holding a CR or LF
    /// are dropped.
    pub fn new<U, P>(users: U, passwords: P) -> Self
    where
        U: IntoIterator,
        U::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let users = dedup_ordered(users.into_iter().map(|u| u.as_ref().trim().to_string()))
            .into_iter()
            .filter(|u| !u.is_empty() && is_line_safe(u))
            .collect();
        let passwords = dedup_ordered(passwords.into_iter().map(|p| p.as_ref().trim().to_string()))
            .into_iter()
            .filter(|p| is_line_safe(p))
            .collect();
        Self {
            users,
            passwords,
            pairs: Vec::new(),
        }
    }

    /// A small built-in list of common default accounts.
    pub fn builtin() -> Self {
        Self::new(DEFAULT_USERS, DEFAULT_PASSWORDS)
    }

    /// Build from newline-separated wordlist contents, skipping blank lines
    /// and `#` comments.
    pub fn from_wordlists(users: &str, passwords: &str) -> Self {
        Self::new(wordlist_lines(users), wordlist_lines(passwords))
    }

    /// Build from `user:password` lines.
    ///
    /// The pairs are kept in file order and are what gets tried. The user
    /// and password lists are filled from them for reporting.
    pub fn from_pairs(text: &str) -> Self {
        let mut seen = HashSet::new();
        let pairs: Vec<Credential> = wordlist_lines(text)
            .filter_map(Credential::parse_pair)
            .filter(|c| c.is_line_safe() && seen.insert(c.clone()))
            .collect();
        let mut source = Self::new(
            pairs.iter().map(Credential::username),
            pairs.iter().map(Credential::password),
        );
        source.pairs = pairs;
        source
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    pub fn passwords(&self) -> &[String] {
        &self.passwords
    }

    /// Explicit pairs, empty unless built by `from_pairs`.
    pub fn pairs(&self) -> &[Credential] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && (self.users.is_empty() || self.passwords.is_empty())
    }
}

fn is_line_safe(field: &str) -> bool {
    !field.contains(['\r', '\n'])
}

fn wordlist_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
}

fn dedup_ordered(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}
