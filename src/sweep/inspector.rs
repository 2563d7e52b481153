use crate::client::requests::Command;
use crate::client::LedgerClient;
use crate::error::{AppResult, ClientError};
use crate::ledger::models::AccountSnapshot;

/// Fetch the account's owner count and spendable balance. An explicit
/// server-side failure (e.g. actNotFound) returns None; the caller
/// decides whether that is fatal. No retry here — the read is cheap and
/// idempotent, retry policy belongs to the caller.
pub async fn fetch_account_snapshot<C: LedgerClient + ?Sized>(
    client: &C,
    address: &str,
) -> AppResult<Option<AccountSnapshot>> {
    let response = client
        .request(Command::AccountInfo {
            account: address.to_string(),
        })
        .await?;
    if !response.is_successful() {
        return Ok(None);
    }

    let data = &response.result["account_data"];
    let owner_count = data["OwnerCount"].as_u64().unwrap_or(0) as u32;
    let balance_drops = data["Balance"]
        .as_str()
        .and_then(|raw| raw.parse::<u64>().ok())
        .ok_or_else(|| {
            ClientError::MalformedResponse("account_data missing Balance".to_string())
        })?;

    Ok(Some(AccountSnapshot {
        owner_count,
        balance_drops,
    }))
}
