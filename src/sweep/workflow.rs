use rust_decimal::Decimal;
use tracing::debug;

use crate::client::requests::Command;
use crate::client::{Finality, FinalityPolicy, LedgerClient};
use crate::config::Config;
use crate::error::{AppError, AppResult, ClientError};
use crate::ledger::models::{RetirementOutcome, TrustLine};
use crate::tx::{sign_trust_set, TrustSet};
use crate::wallet::Wallet;

const ENGINE_SUCCESS: &str = "tesSUCCESS";
/// The line does not exist or is already at the target state
const ENGINE_NO_LINE_REDUNDANT: &str = "tecNO_LINE_REDUNDANT";

/// Retire one trust line: build a limit-zeroing TrustSet, autofill the
/// protocol fields from live ledger state, sign, submit, and block until
/// the network settles it. Strictly sequential per account; never called
/// concurrently. No retry here — the caller decides whether to continue.
pub async fn retire<C: LedgerClient + ?Sized>(
    client: &C,
    wallet: &Wallet,
    config: &Config,
    line: &TrustLine,
) -> AppResult<RetirementOutcome> {
    let info = client
        .request(Command::AccountInfo {
            account: wallet.address().to_string(),
        })
        .await?;
    if !info.is_successful() {
        return Ok(RetirementOutcome::Failed(format!(
            "account_info: {}",
            info.error_code()
        )));
    }
    let sequence = info.result["account_data"]["Sequence"]
        .as_u64()
        .ok_or_else(|| {
            ClientError::MalformedResponse("account_info missing Sequence".to_string())
        })? as u32;
    let current_ledger = info.result["ledger_current_index"].as_u64().ok_or_else(|| {
        ClientError::MalformedResponse("account_info missing ledger_current_index".to_string())
    })? as u32;

    let fee_drops = match open_ledger_fee(client).await? {
        Ok(fee) => fee.min(config.fee_cap_drops),
        Err(reason) => return Ok(RetirementOutcome::Failed(reason)),
    };

    let tx = TrustSet {
        account: wallet.address().to_string(),
        flags: config.trust_set_flags,
        sequence,
        fee_drops,
        last_ledger_sequence: current_ledger + config.last_ledger_offset,
        limit_currency: line.currency.clone(),
        limit_issuer: line.issuer.clone(),
        limit_value: Decimal::ZERO,
        quality_in: 0,
        quality_out: 0,
    };
    // an unencodable line (bad currency or issuer) fails this item only
    let signed = match sign_trust_set(&tx, wallet) {
        Ok(signed) => signed,
        Err(e) => return Ok(RetirementOutcome::Failed(format!("encode: {}", e))),
    };
    debug!("submitting {} for {}/{}", signed.hash, line.currency, line.issuer);

    let policy = FinalityPolicy {
        poll_interval: config.finality_poll_interval,
        timeout: config.finality_timeout,
    };
    let finality = match client
        .submit_and_wait(&signed.blob, &signed.hash, tx.last_ledger_sequence, &policy)
        .await
    {
        Ok(finality) => finality,
        // a submit-level rejection is a per-item failure, not a run abort
        Err(AppError::Client(ClientError::Rejected(code))) => {
            return Ok(RetirementOutcome::Failed(format!("submit: {}", code)))
        }
        Err(e) => return Err(e),
    };
    Ok(classify(&finality))
}

/// Map a settled submission onto the three reportable outcomes
pub fn classify(finality: &Finality) -> RetirementOutcome {
    match finality {
        Finality::Validated { code } | Finality::Rejected { code } => match code.as_str() {
            ENGINE_SUCCESS => RetirementOutcome::Success,
            ENGINE_NO_LINE_REDUNDANT => RetirementOutcome::AlreadyRetired,
            other => RetirementOutcome::Failed(other.to_string()),
        },
        Finality::Expired => RetirementOutcome::Failed(
            "expired: ledger passed LastLedgerSequence without inclusion".to_string(),
        ),
        Finality::TimedOut => {
            RetirementOutcome::Failed("outcome unknown: finality wait timed out".to_string())
        }
    }
}

/// Current open-ledger fee in drops; an unsuccessful or malformed fee
/// response is reported as a per-item failure reason.
async fn open_ledger_fee<C: LedgerClient + ?Sized>(client: &C) -> AppResult<Result<u64, String>> {
    let response = client.request(Command::Fee).await?;
    if !response.is_successful() {
        return Ok(Err(format!("fee: {}", response.error_code())));
    }
    match response.result["drops"]["open_ledger_fee"]
        .as_str()
        .and_then(|raw| raw.parse::<u64>().ok())
    {
        Some(fee) => Ok(Ok(fee)),
        None => Ok(Err("fee: malformed open_ledger_fee".to_string())),
    }
}
