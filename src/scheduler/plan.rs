//! Credential attempt plans.

use crate::types::Credential;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// How credential pairs are drawn from the candidate lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AttackMode {
    /// Every user with every password.
    #[default]
    Exhaustive,
    /// The first few passwords across every user, in random order.
    Spray,
}

impl fmt::Display for AttackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhaustive => write!(f, "exhaustive"),
            Self::Spray => write!(f, "spray"),
        }
    }
}

impl FromStr for AttackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exhaustive" | "brute" => Ok(Self::Exhaustive),
            "spray" => Ok(Self::Spray),
            _ => Err(format!("unknown attack mode: {}", s)),
        }
    }
}

/// Users × passwords, user-major.
pub fn plan_exhaustive<U, P>(users: &[U], passwords: &[P]) -> Vec<Credential>
where
    U: AsRef<str>,
    P: AsRef<str>,
{
    users
        .iter()
        .flat_map(|user| {
            passwords
                .iter()
                .map(move |pass| Credential::new(user.as_ref(), pass.as_ref()))
        })
        .collect()
}

/// The first `top_k` passwords against every user, shuffled.
///
/// Yields `min(top_k, passwords) × users` pairs.
pub fn plan_spray<U, P>(users: &[U], passwords: &[P], top_k: usize) -> Vec<Credential>
where
    U: AsRef<str>,
    P: AsRef<str>,
{
    let top = &passwords[..top_k.min(passwords.len())];
    let mut plan: Vec<Credential> = top
        .iter()
        .flat_map(|pass| {
            users
                .iter()
                .map(move |user| Credential::new(user.as_ref(), pass.as_ref()))
        })
        .collect();
    plan.shuffle(&mut rand::thread_rng());
    plan
}

/// Listed pairs whose password is among the first `top_k` distinct
/// passwords, shuffled.
pub fn plan_pairs_spray(pairs: &[Credential], top_k: usize) -> Vec<Credential> {
    let mut seen = HashSet::new();
    let top: HashSet<&str> = pairs
        .iter()
        .map(Credential::password)
        .filter(|pass| seen.insert(*pass))
        .take(top_k)
        .collect();
    let mut plan: Vec<Credential> = pairs
        .iter()
        .filter(|c| top.contains(c.password()))
        .cloned()
        .collect();
    plan.shuffle(&mut rand::thread_rng());
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const USERS: &[&str] = &["admin", "root", "guest"];
    const PASSWORDS: &[&str] = &["123456", "password", "admin", "letmein", "qwerty", "welcome", "x"];

    #[test]
    fn test_exhaustive_is_user_major_product() {
        let plan = plan_exhaustive(USERS, PASSWORDS);
        assert_eq!(plan.len(), USERS.len() * PASSWORDS.len());
        assert_eq!(plan[0], Credential::new("admin", "123456"));
        assert_eq!(plan[1], Credential::new("admin", "password"));
        assert_eq!(plan[PASSWORDS.len()], Credential::new("root", "123456"));
    }

    #[test]
    fn test_spray_uses_top_k_passwords() {
        let plan = plan_spray(USERS, PASSWORDS, 5);
        assert_eq!(plan.len(), 5 * USERS.len());

        let unique: HashSet<_> = plan.iter().cloned().collect();
        assert_eq!(unique.len(), plan.len());
        assert!(plan.iter().all(|c| PASSWORDS[..5].contains(&c.password())));
    }

    #[test]
    fn test_spray_with_fewer_passwords_than_k() {
        let plan = plan_spray(USERS, &["only"], 5);
        assert_eq!(plan.len(), USERS.len());
    }

    #[test]
    fn test_pairs_spray_never_invents_pairs() {
        let pairs = vec![
            Credential::new("alice", "summer"),
            Credential::new("bob", "winter"),
            Credential::new("carol", "summer"),
            Credential::new("dave", "spring"),
        ];

        let plan = plan_pairs_spray(&pairs, 2);
        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|c| pairs.contains(c)));
        assert!(!plan.contains(&Credential::new("dave", "spring")));
        assert_eq!(plan_pairs_spray(&pairs, 10).len(), 4);
    }

    #[test]
    fn test_empty_lists_give_empty_plans() {
        let none: &[&str] = &[];
        assert!(plan_exhaustive(none, PASSWORDS).is_empty());
        assert!(plan_spray(USERS, none, 5).is_empty());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("spray".parse::<AttackMode>().unwrap(), AttackMode::Spray);
        assert_eq!(AttackMode::default().to_string(), "exhaustive");
        assert!("dictionary".parse::<AttackMode>().is_err());
    }
}
