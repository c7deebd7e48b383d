use std::fmt;

use serde::{Deserialize, Serialize};

/// Caller identity taken verbatim from the bearer token.
///
/// Tokens are issued and verified by the authentication service; this crate
/// only carries them through so writes can be attributed in logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never echo whole tokens into logs.
        let shown: String = self.0.chars().take(8).collect();
        if shown.len() < self.0.len() {
            write!(f, "{}…", shown)
        } else {
            write!(f, "{}", shown)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_truncates_long_tokens() {
        let actor = Actor::new("abcdefghijklmnop");
        assert_eq!(actor.to_string(), "abcdefgh…");
        assert_eq!(actor.as_str(), "abcdefghijklmnop");
    }

    #[test]
    fn display_keeps_short_tokens() {
        assert_eq!(Actor::new("nurse-1").to_string(), "nurse-1");
    }
}
