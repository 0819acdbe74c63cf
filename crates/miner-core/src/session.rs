//! Immutable session ledger and the frozen payload handed to the search.

use crate::error::{MinerError, Result};
use crate::message::MessageBuilder;
use crate::target::DifficultyTarget;
use crate::Transaction;
use std::sync::Arc;
use tracing::debug;

/// Ordered transactions plus the target being mined for.
///
/// Appending returns a new `Session`; an existing value never changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    target: DifficultyTarget,
    builder: MessageBuilder,
    transactions: Vec<Transaction>,
    message: String,
}

impl Session {
    pub fn new(target: DifficultyTarget) -> Self {
        Self::with_builder(target, MessageBuilder::default())
    }

    pub fn with_builder(target: DifficultyTarget, builder: MessageBuilder) -> Self {
        Self {
            target,
            builder,
            transactions: Vec::new(),
            message: String::new(),
        }
    }

    /// Returns a new session with one more transaction appended. The sequence
    /// index is assigned here; on error `self` is untouched and the index is
    /// not consumed.
    pub fn with_transaction(&self, sender: &str, recipient: &str, amount: &str) -> Result<Self> {
        let tx = self
            .builder
            .build(sender, recipient, amount, self.next_sequence_index())?;
        let segment = self.builder.render(&tx);
        debug!(
            index = tx.sequence_index,
            segment = %segment,
            "appending transaction segment"
        );

        let mut next = self.clone();
        next.message.push('\n');
        next.message.push_str(&segment);
        next.transactions.push(tx);
        Ok(next)
    }

    pub fn next_sequence_index(&self) -> u64 {
        self.transactions.len() as u64 + 1
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn target(&self) -> &DifficultyTarget {
        &self.target
    }

    /// Cumulative message: one `\n`-prefixed segment per transaction.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Freezes the message into the bytes that get hashed ahead of each nonce.
    pub fn payload(&self) -> Result<Payload> {
        if self.is_empty() {
            return Err(MinerError::EmptySession);
        }
        Ok(Payload::from_message(&self.message))
    }
}

/// JSON string encoding of a session message, shared read-only by workers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload(Arc<[u8]>);

impl Payload {
    pub fn from_message(message: &str) -> Self {
        let encoded = serde_json::to_vec(message).expect("a str always encodes as JSON");
        Self(encoded.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
