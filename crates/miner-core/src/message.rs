//! Transaction segments: amount validation, identity hashing and the
//! `msgN: input: ..., user: ..., recipient: ..., blockId: ...` line format.

use crate::constants::BLOCK_ID;
use crate::error::{MinerError, Result};
use crate::{sha256_hex, Transaction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A non-negative amount, kept verbatim as the digits that were submitted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(String);

impl Amount {
    /// Accepts `^[0-9]+$` and nothing else: no sign, no whitespace, no exponent.
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MinerError::InvalidAmount(input.to_string()));
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Amount {
    type Err = MinerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Amount {
    type Error = MinerError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds transactions and renders them into message segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageBuilder {
    block_id: String,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self {
            block_id: BLOCK_ID.to_string(),
        }
    }
}

impl MessageBuilder {
    pub fn with_block_id(block_id: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
        }
    }

    /// Validates `amount` and hashes both identities. Nothing is produced on
    /// an invalid amount, so callers never consume a sequence index for it.
    pub fn build(
        &self,
        sender: &str,
        recipient: &str,
        amount: &str,
        sequence_index: u64,
    ) -> Result<Transaction> {
        let amount = Amount::parse(amount)?;
        Ok(Transaction {
            sequence_index,
            sender_hash: sha256_hex(sender),
            recipient_hash: sha256_hex(recipient),
            amount,
        })
    }

    pub fn render(&self, tx: &Transaction) -> String {
        format!(
            "msg{}: input: {}, user: {}, recipient: {}, blockId: {}",
            tx.sequence_index, tx.amount, tx.sender_hash, tx.recipient_hash, self.block_id
        )
    }
}
