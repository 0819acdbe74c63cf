//! Literal hex-prefix difficulty target derived from a coin or fiat ticker.

use crate::constants::TARGET_WIDTH;
use crate::error::{MinerError, Result};
use serde::Serialize;
use std::fmt;

const NOT_A_LETTER: u8 = u8::MAX;

/// ASCII byte -> 0-based alphabet index, case-insensitive.
const ALPHABET_INDEX: [u8; 128] = {
    let mut table = [NOT_A_LETTER; 128];
    let mut i = 0u8;
    while i < 26 {
        table[(b'a' + i) as usize] = i;
        table[(b'A' + i) as usize] = i;
        i += 1;
    }
    table
};

fn alphabet_index(c: char) -> Option<u8> {
    let idx = *ALPHABET_INDEX.get(c as usize)?;
    (idx != NOT_A_LETTER).then_some(idx)
}

/// A digest is accepted when its hex text starts with `prefix`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DifficultyTarget {
    ticker: Option<String>,
    prefix: String,
}

impl DifficultyTarget {
    /// Encodes each letter as its two-digit alphabet index (`A` = `00`).
    /// Three-letter tickers get a leading `00` block; four-letter tickers are
    /// used as-is. Anything else is rejected.
    pub fn from_ticker(ticker: &str) -> Result<Self> {
        let invalid = || MinerError::InvalidCurrencyCode(ticker.to_string());

        let mut encoded = String::with_capacity(TARGET_WIDTH);
        for c in ticker.chars() {
            let idx = alphabet_index(c).ok_or_else(invalid)?;
            encoded.push(char::from(b'0' + idx / 10));
            encoded.push(char::from(b'0' + idx % 10));
        }

        let prefix = match encoded.len() {
            6 => format!("00{encoded}"),
            8 => encoded,
            _ => return Err(invalid()),
        };
        debug_assert_eq!(prefix.len(), TARGET_WIDTH);

        Ok(Self {
            ticker: Some(ticker.to_string()),
            prefix,
        })
    }

    /// Uses `prefix` verbatim. An empty prefix accepts every digest.
    pub fn from_prefix(prefix: impl Into<String>) -> Self {
        Self {
            ticker: None,
            prefix: prefix.into(),
        }
    }

    pub fn matches(&self, digest: &str) -> bool {
        digest.starts_with(&self.prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn ticker(&self) -> Option<&str> {
        self.ticker.as_deref()
    }
}

impl fmt::Display for DifficultyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ticker {
            Some(t) => write!(f, "{t} ({})", self.prefix),
            None => write!(f, "{}", self.prefix),
        }
    }
}
