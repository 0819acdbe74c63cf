//! Interactive session entry: one question per line, answers read from any
//! `BufRead` so the flow can be driven from tests.

use anyhow::{bail, Context, Result};
use miner_core::{Amount, DifficultyTarget, Session};
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurrencyKind {
    Crypto,
    Fiat,
}

impl FromStr for CurrencyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "crypto" => Ok(CurrencyKind::Crypto),
            "fiat" => Ok(CurrencyKind::Fiat),
            other => bail!("currency type {other:?} is neither crypto nor fiat"),
        }
    }
}

impl CurrencyKind {
    fn ticker_question(self) -> &'static str {
        match self {
            CurrencyKind::Crypto => "What coin are you selling? (3-4 letters, e.g. BTC) ",
            CurrencyKind::Fiat => "What fiat are you selling? (3-4 letters, e.g. USD) ",
        }
    }
}

struct Prompter<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<R: BufRead, W: Write> Prompter<'_, R, W> {
    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line).context("reading answer")? == 0 {
            bail!("input ended while waiting for: {}", question.trim_end());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Asks for the target (unless `preset` is given) and then for transactions
/// until the user answers `n`. Invalid answers abort the whole entry.
pub fn collect_session<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    preset: Option<DifficultyTarget>,
) -> Result<Session> {
    let mut prompter = Prompter { input, output };

    let target = match preset {
        Some(target) => target,
        None => {
            let kind: CurrencyKind = prompter.ask("Buying coin from crypto or fiat? ")?.parse()?;
            let ticker = prompter.ask(kind.ticker_question())?;
            DifficultyTarget::from_ticker(&ticker)?
        }
    };

    let mut session = Session::new(target);
    loop {
        let user = prompter.ask("Username: ")?;
        let amount = prompter.ask("Enter amount sending: ")?;
        Amount::parse(&amount)?;
        let recipient = prompter.ask("Enter recipient: ")?;
        let again = prompter.ask("Do you want to add another transaction? (y/n) ")?;

        session = session.with_transaction(&user, &recipient, &amount)?;
        if let (Some(tx), Some(segment)) = (
            session.transactions().last(),
            session.message().rsplit('\n').next(),
        ) {
            info!(index = tx.sequence_index(), segment = %segment, "transaction added");
        }

        match again.as_str() {
            "y" => continue,
            "n" => break,
            other => bail!("invalid response {other:?}: expected y or n"),
        }
    }
    Ok(session)
}
