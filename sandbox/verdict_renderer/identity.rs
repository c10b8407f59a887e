use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const INBOXES: [&str; 14] = [
    "headless.bot",
    "selenium.runner",
    "tor-browser-user",
    "incognito-tab",
    "vpn-enjoyer",
    "proxy.chain",
    "cookie-tamperer",
    "suspicious-login",
    "high-risk-device",
    "fraud-monitor",
    "velocity-spammer",
    "suspicious.behavior",
    "device-farm-node",
    "credential-stuffer",
];

const DOMAINS: [&str; 6] = [
    "torland.net",
    "vpntunnels.io",
    "incognito.cloud",
    "bot-traffic.lol",
    "risky-login.dev",
    "tamperlab.app",
];

const PHRASES: [&str; 5] = [
    "correct-horse-battery-staple",
    "password123",
    "hunter2",
    "letmein!",
    "fingerprint-ftw",
];

/// Placeholder credentials pre-filled into the login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// `<inbox>@<domain>`.
    pub email: String,
    /// `<phrase>-<100..=999>`.
    pub password: String,
}

impl Identity {
    /// Creates an identity from explicit values.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Produces themed throwaway identities. Not cryptographic.
#[derive(Debug, Clone)]
pub struct IdentityGenerator {
    rng: SmallRng,
}

impl IdentityGenerator {
    /// Seeds from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Deterministic generator for reproducible runs.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Draws the next identity.
    pub fn generate(&mut self) -> Identity {
        let inbox = INBOXES.choose(&mut self.rng).copied().unwrap_or(INBOXES[0]);
        let domain = DOMAINS.choose(&mut self.rng).copied().unwrap_or(DOMAINS[0]);
        let phrase = PHRASES.choose(&mut self.rng).copied().unwrap_or(PHRASES[0]);
        let suffix: u16 = self.rng.gen_range(100..=999);
        Identity::new(format!("{inbox}@{domain}"), format!("{phrase}-{suffix}"))
    }
}

impl Default for IdentityGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities_follow_the_shape() {
        let mut generator = IdentityGenerator::seeded(7);
        for _ in 0..200 {
            let identity = generator.generate();
            let (inbox, domain) = identity.email.split_once('@').unwrap();
            assert!(INBOXES.contains(&inbox));
            assert!(DOMAINS.contains(&domain));
            let (phrase, suffix) = identity.password.rsplit_once('-').unwrap();
            assert!(PHRASES.contains(&phrase), "{phrase}");
            let suffix: u16 = suffix.parse().unwrap();
            assert!((100..=999).contains(&suffix));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = IdentityGenerator::seeded(42);
        let mut b = IdentityGenerator::seeded(42);
        for _ in 0..10 {
            assert_eq!(a.generate(), b.generate());
        }
    }
}
