use anyhow::{bail, Context, Result};
use clap::Parser;
use miner_core::{
    mine_session_with_cancel, DifficultyTarget, MiningResult, NonceSearchEngine, SearchConfig,
    SearchMode, Session,
};
use std::{
    fs,
    future::Future,
    io,
    path::PathBuf,
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::task::JoinHandle;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

mod prompt;

#[derive(Parser, Debug)]
#[command(name = "miner-cli")]
#[command(about = "Build a transaction session and search for a proof-of-work nonce")]
struct Cli {
    /// Coin or fiat ticker whose encoding is the target prefix (e.g. BTC)
    #[arg(long, conflicts_with = "prefix")]
    coin: Option<String>,

    /// Literal hex prefix to use as the target instead of a ticker
    #[arg(long)]
    prefix: Option<String>,

    /// Transaction as SENDER:RECIPIENT:AMOUNT; repeat for more. Omit to be prompted.
    #[arg(long = "tx", value_name = "SENDER:RECIPIENT:AMOUNT")]
    txs: Vec<TxSpec>,

    /// JSON file with search settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// First nonce of the search range
    #[arg(long)]
    start: Option<u64>,

    /// End of the search range (exclusive)
    #[arg(long)]
    end: Option<u64>,

    /// Partition width; the first nonce of every partition is skipped
    #[arg(long)]
    partition: Option<u64>,

    /// sequential, parallel or parallel-any
    #[arg(long)]
    mode: Option<SearchMode>,

    /// Worker threads for parallel modes
    #[arg(long)]
    threads: Option<usize>,

    /// Nonces per work unit
    #[arg(long)]
    chunk_size: Option<u64>,

    /// Give up after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct TxSpec {
    sender: String,
    recipient: String,
    amount: String,
}

impl FromStr for TxSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split(':').collect::<Vec<_>>().as_slice() {
            [sender, recipient, amount] if !sender.is_empty() && !recipient.is_empty() => {
                Ok(TxSpec {
                    sender: sender.to_string(),
                    recipient: recipient.to_string(),
                    amount: amount.to_string(),
                })
            }
            _ => Err(format!("expected SENDER:RECIPIENT:AMOUNT, got {s:?}")),
        }
    }
}

impl Cli {
    fn search_config(&self) -> Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => SearchConfig::default(),
        };

        if let Some(start) = self.start {
            config.space.start = start;
        }
        if let Some(end) = self.end {
            config.space.end = end;
        }
        if let Some(partition) = self.partition {
            config.space.partition = partition;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        config.threads = self.threads.or(config.threads);
        config.timeout_ms = self.timeout_ms.or(config.timeout_ms);
        Ok(config)
    }

    fn target(&self) -> Result<Option<DifficultyTarget>> {
        Ok(match (&self.coin, &self.prefix) {
            (Some(coin), _) => Some(DifficultyTarget::from_ticker(coin)?),
            (None, Some(prefix)) => Some(DifficultyTarget::from_prefix(prefix.as_str())),
            (None, None) => None,
        })
    }

    fn session(&self) -> Result<Session> {
        let target = self.target()?;
        if self.txs.is_empty() {
            let stdin = io::stdin();
            return prompt::collect_session(&mut stdin.lock(), &mut io::stdout(), target);
        }

        let Some(target) = target else {
            bail!("--coin or --prefix is required when transactions are given with --tx");
        };
        self.txs.iter().try_fold(Session::new(target), |session, tx| {
            Ok(session.with_transaction(&tx.sender, &tx.recipient, &tx.amount)?)
        })
    }
}

fn report(target: &DifficultyTarget, result: &MiningResult) {
    println!("target: {target}");
    println!("status: {}", result.status());
    if let (Some(nonce), Some(digest), Some(token)) = (
        result.nonce(),
        result.accepted_digest(),
        result.nonce_token(),
    ) {
        println!("nonce: {nonce}");
        println!("hash: {digest}");
        println!("token: {token}");
    }
    println!("elapsed: {:.3}s", result.elapsed_seconds());
    println!(
        "candidates: {} ({:.0} H/s)",
        result.candidates_tested(),
        result.hash_rate()
    );
}

/// Waits for the blocking search, setting `cancel` once `interrupt` resolves
/// `Ok`. An interrupt that fails to install is ignored.
async fn await_search(
    mut search: JoinHandle<miner_core::Result<MiningResult>>,
    interrupt: impl Future<Output = io::Result<()>>,
    cancel: &AtomicBool,
) -> Result<MiningResult> {
    tokio::pin!(interrupt);
    let result = tokio::select! {
        joined = &mut search => joined??,
        Ok(()) = &mut interrupt => {
            warn!("interrupt received, cancelling search");
            cancel.store(true, Ordering::Relaxed);
            search.await??
        }
    };
    Ok(result)
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    let engine = NonceSearchEngine::new(cli.search_config()?)?;
    // interactive entry reads stdin
    let session = tokio::task::spawn_blocking(move || cli.session()).await??;
    let target = session.target().clone();

    let cancel = Arc::new(AtomicBool::new(false));
    let search = tokio::task::spawn_blocking({
        let cancel = cancel.clone();
        move || mine_session_with_cancel(&session, &engine, &cancel)
    });
    let result = await_search(search, tokio::signal::ctrl_c(), &cancel).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        report(&target, &result);
    }
    Ok(())
}
