use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::tx::{TF_CLEAR_FREEZE, TF_SET_NO_RIPPLE};

/// Runtime configuration, read from the environment with network-policy
/// defaults matching the public XRPL mainnet.
#[derive(Debug, Clone)]
pub struct Config {
    pub websocket_url: String,
    /// Entries requested per account_lines page (XRPL allows 10..=400)
    pub page_limit: u32,
    /// Per-page read timeout during the scan
    pub page_timeout: Duration,
    /// Delay before re-requesting a timed-out page
    pub page_retry_backoff: Duration,
    /// Cap on timeout retries per page; None retries indefinitely
    pub max_page_retries: Option<u32>,
    /// Fixed delay after every submission
    pub submit_pacing: Duration,
    /// Emit a progress line and re-sample the account every N items
    pub progress_interval: usize,
    /// Reserve released per retired ledger object, in XRP
    pub reserve_per_object: Decimal,
    /// TrustSet flags asserted on every retirement
    pub trust_set_flags: u32,
    /// Upper bound on the autofilled fee, in drops
    pub fee_cap_drops: u64,
    /// LastLedgerSequence = current ledger index + this offset
    pub last_ledger_offset: u32,
    pub finality_poll_interval: Duration,
    /// Deadline for the validation wait; None waits until ledger expiry
    pub finality_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Ok(Self {
            websocket_url: std::env::var("XRPL_WEBSOCKET_URL")
                .unwrap_or_else(|_| "wss://xrpl.ws/".to_string()),
            page_limit: env_parse("SWEEP_PAGE_LIMIT", 400)?,
            page_timeout: Duration::from_secs(env_parse("SWEEP_PAGE_TIMEOUT_SECS", 30)?),
            page_retry_backoff: Duration::from_secs(env_parse("SWEEP_PAGE_BACKOFF_SECS", 2)?),
            max_page_retries: env_parse_opt("SWEEP_MAX_PAGE_RETRIES")?,
            submit_pacing: Duration::from_millis(env_parse("SWEEP_SUBMIT_PACING_MS", 100)?),
            progress_interval: env_parse("SWEEP_PROGRESS_INTERVAL", 10)?,
            reserve_per_object: std::env::var("SWEEP_RESERVE_PER_OBJECT")
                .map(|raw| {
                    raw.parse::<Decimal>().map_err(|e| {
                        config::ConfigError::Message(format!(
                            "SWEEP_RESERVE_PER_OBJECT: {}",
                            e
                        ))
                    })
                })
                .unwrap_or(Ok(dec!(0.2)))?,
            trust_set_flags: env_parse("SWEEP_TRUST_SET_FLAGS", TF_SET_NO_RIPPLE | TF_CLEAR_FREEZE)?,
            fee_cap_drops: env_parse("SWEEP_FEE_CAP_DROPS", 1_000)?,
            last_ledger_offset: env_parse("SWEEP_LAST_LEDGER_OFFSET", 20)?,
            finality_poll_interval: Duration::from_secs(env_parse(
                "SWEEP_FINALITY_POLL_SECS",
                1,
            )?),
            finality_timeout: match env_parse_opt("SWEEP_FINALITY_TIMEOUT_SECS")? {
                // 0 disables the deadline; the LastLedgerSequence expiry
                // still bounds the wait
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => Some(Duration::from_secs(120)),
            },
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, config::ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| config::ConfigError::Message(format!("{}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

fn env_parse_opt<T: std::str::FromStr>(key: &str) -> Result<Option<T>, config::ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| config::ConfigError::Message(format!("{}: {}", key, e))),
        Err(_) => Ok(None),
    }
}
