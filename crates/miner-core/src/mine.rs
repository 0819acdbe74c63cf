use crate::{
    error::Result,
    search::{CandidateHasher, MiningResult, NonceSearchEngine},
    session::Session,
};
use std::sync::atomic::AtomicBool;
use tracing::info;

/// Freezes `session` and searches for a nonce satisfying its target.
/// Fails only when the session has no transactions.
pub fn mine_session<H: CandidateHasher>(
    session: &Session,
    engine: &NonceSearchEngine<H>,
) -> Result<MiningResult> {
    let never = AtomicBool::new(false);
    mine_session_with_cancel(session, engine, &never)
}

pub fn mine_session_with_cancel<H: CandidateHasher>(
    session: &Session,
    engine: &NonceSearchEngine<H>,
    cancel: &AtomicBool,
) -> Result<MiningResult> {
    let payload = session.payload()?;
    let config = engine.config();

    info!(
        "Mining {} transaction(s) for target {} over nonces [{}, {}) ({} mode)",
        session.transactions().len(),
        session.target(),
        config.space.start,
        config.space.end,
        config.mode
    );

    let result = engine.search_with_cancel(&payload, session.target(), cancel);

    match (result.nonce(), result.accepted_digest()) {
        (Some(nonce), Some(digest)) => info!(
            "Mined nonce {} with hash {} in {:.3}s ({} candidates)",
            nonce,
            digest,
            result.elapsed_seconds(),
            result.candidates_tested()
        ),
        _ => info!(
            "No nonce found ({}) after {:.3}s ({} candidates)",
            result.status(),
            result.elapsed_seconds(),
            result.candidates_tested()
        ),
    }

    Ok(result)
}
