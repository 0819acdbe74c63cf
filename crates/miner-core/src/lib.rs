use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod constants;
pub mod error;
pub mod message;
pub mod mine;
pub mod search;
pub mod session;
pub mod target;

pub use error::{MinerError, Result};
pub use message::{Amount, MessageBuilder};
pub use mine::{mine_session, mine_session_with_cancel};
pub use search::{
    CandidateHasher, MiningResult, NonceSearchEngine, SearchConfig, SearchMode, SearchSpace,
    SearchStatus, Sha256Hasher,
};
pub use session::{Payload, Session};
pub use target::DifficultyTarget;

pub type Hash = [u8; 32];

/// One entry in a session ledger. Identities are only ever held hashed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub(crate) sequence_index: u64,
    pub(crate) sender_hash: String,
    pub(crate) recipient_hash: String,
    pub(crate) amount: Amount,
}

impl Transaction {
    pub fn sequence_index(&self) -> u64 {
        self.sequence_index
    }

    pub fn sender_hash(&self) -> &str {
        &self.sender_hash
    }

    pub fn recipient_hash(&self) -> &str {
        &self.recipient_hash
    }

    pub fn amount(&self) -> &Amount {
        &self.amount
    }
}

pub fn sha256(bytes: impl AsRef<[u8]>) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_ref());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// Lowercase hex SHA-256, the form every digest in this crate is compared in.
pub fn sha256_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(sha256(bytes))
}
