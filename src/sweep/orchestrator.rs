use rust_decimal::Decimal;
use tokio::time::sleep;
use tracing::warn;

use crate::client::LedgerClient;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::ledger::models::{FinalReport, RetirementOutcome, Tally};
use crate::sweep::inspector::fetch_account_snapshot;
use crate::sweep::scanner::scan_zero_balance_lines;
use crate::sweep::workflow::retire;
use crate::wallet::Wallet;

/// Drives the whole run: baseline snapshot, one full scan, sequential
/// paced retirement of every candidate, and the closing reserve delta.
pub struct Sweeper<'a, C: LedgerClient + ?Sized> {
    client: &'a C,
    wallet: &'a Wallet,
    config: &'a Config,
}

impl<'a, C: LedgerClient + ?Sized> Sweeper<'a, C> {
    pub fn new(client: &'a C, wallet: &'a Wallet, config: &'a Config) -> Self {
        Self {
            client,
            wallet,
            config,
        }
    }

    pub async fn run(&self) -> AppResult<FinalReport> {
        println!("Wallet address: {}", self.wallet.address());
        println!("{}", "-".repeat(50));

        let initial = fetch_account_snapshot(self.client, self.wallet.address())
            .await?
            .ok_or_else(|| AppError::AccountNotFound(self.wallet.address().to_string()))?;
        println!("Initial OwnerCount: {}", initial.owner_count);
        println!("Balance: {} XRP", initial.balance_xrp());

        println!("\nFetching trust lines...");
        let scan = scan_zero_balance_lines(self.client, self.config, self.wallet.address()).await?;
        if !scan.complete {
            warn!("the scan was truncated by a server error; sweeping the partial set");
        }
        println!("Found {} trust lines with zero balance", scan.lines.len());

        if scan.lines.is_empty() {
            println!("No trust lines to remove");
            return Ok(FinalReport {
                candidates: 0,
                scan_complete: scan.complete,
                tally: Tally::default(),
                initial_owner_count: initial.owner_count,
                final_owner_count: None,
                released_reserve: None,
                deletion_ready: false,
            });
        }

        println!("\nRemoving {} trust lines...", scan.lines.len());
        println!("{}", "-".repeat(50));

        let total = scan.lines.len();
        let mut tally = Tally::default();
        for (index, line) in scan.lines.iter().enumerate() {
            if index % self.config.progress_interval == 0 {
                let percent = ((index + 1) as f64 / total as f64) * 100.0;
                println!("\nProgress: {:.1}% ({}/{})", percent, index + 1, total);
                // observability only; a failed re-sample is simply not shown
                if let Ok(Some(current)) =
                    fetch_account_snapshot(self.client, self.wallet.address()).await
                {
                    println!("Current OwnerCount: {}", current.owner_count);
                }
            }

            let outcome = retire(self.client, self.wallet, self.config, line).await?;
            if let RetirementOutcome::Failed(reason) = &outcome {
                println!(
                    "Failed to remove {}...{}: {}",
                    truncated(&line.currency),
                    truncated(&line.issuer),
                    reason
                );
            }
            tally = tally.record(&outcome);

            sleep(self.config.submit_pacing).await;
        }

        println!("\n{}", "=".repeat(50));
        println!("RESULTS:");
        println!("Successfully removed: {}", tally.succeeded);
        println!("Already removed: {}", tally.already_retired);
        println!("Failed: {}", tally.failed);

        let closing = match fetch_account_snapshot(self.client, self.wallet.address()).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("could not fetch the closing snapshot: {}", e);
                None
            }
        };
        let (final_owner_count, released_reserve, deletion_ready) = match closing {
            Some(snapshot) => {
                println!(
                    "\nOwnerCount: {} -> {}",
                    initial.owner_count, snapshot.owner_count
                );
                let released = (Decimal::from(initial.owner_count)
                    - Decimal::from(snapshot.owner_count))
                    * self.config.reserve_per_object;
                println!("Released reserve: {} XRP", released);
                if snapshot.owner_count == 0 {
                    println!("\nAccount is ready for deletion!");
                }
                (
                    Some(snapshot.owner_count),
                    Some(released),
                    snapshot.owner_count == 0,
                )
            }
            None => (None, None, false),
        };

        Ok(FinalReport {
            candidates: total,
            scan_complete: scan.complete,
            tally,
            initial_owner_count: initial.owner_count,
            final_owner_count,
            released_reserve,
            deletion_ready,
        })
    }
}

fn truncated(value: &str) -> &str {
    &value[..value.len().min(8)]
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::testing::{MockLedgerClient, Step};
    use crate::client::requests::Command;
    use crate::client::LedgerResponse;
    use crate::wallet::address;
    use rust_decimal_macros::dec;

    fn wallet() -> Wallet {
        let mut payload = vec![0x01, 0xE1, 0x4B];
        payload.extend_from_slice(&[0x77u8; 16]);
        Wallet::from_seed(&address::encode_base58check(&payload)).unwrap()
    }

    fn config() -> Config {
        use std::time::Duration;
        Config {
            websocket_url: String::new(),
            page_limit: 400,
            page_timeout: Duration::from_secs(30),
            page_retry_backoff: Duration::from_secs(2),
            max_page_retries: None,
            submit_pacing: Duration::from_millis(100),
            progress_interval: 10,
            reserve_per_object: dec!(0.2),
            trust_set_flags: 2_228_224,
            fee_cap_drops: 1_000,
            last_ledger_offset: 20,
            finality_poll_interval: Duration::from_secs(1),
            finality_timeout: Some(Duration::from_secs(120)),
        }
    }

    fn account_info(owner_count: u32) -> Step {
        Step::Respond(LedgerResponse::success(json!({
            "account_data": {
                "OwnerCount": owner_count,
                "Balance": "20000000",
                "Sequence": 5,
            },
            "ledger_current_index": 100,
        })))
    }

    fn one_zero_line() -> Step {
        Step::Respond(LedgerResponse::success(json!({
            "lines": [{
                "currency": "USD",
                "account": address::classic_address(&[0x02u8; 33]),
                "balance": "0",
            }],
        })))
    }

    fn successful_retirement() -> Vec<Step> {
        vec![
            account_info(10), // autofill
            Step::Respond(LedgerResponse::success(json!({
                "drops": { "open_ledger_fee": "10" },
            }))),
            Step::Respond(LedgerResponse::success(
                json!({ "engine_result": "tesSUCCESS" }),
            )),
            Step::Respond(LedgerResponse::success(json!({
                "validated": true,
                "meta": { "TransactionResult": "tesSUCCESS" },
            }))),
        ]
    }

    #[tokio::test]
    async fn empty_candidate_set_short_circuits() {
        let client = MockLedgerClient::new(vec![
            account_info(10),
            Step::Respond(LedgerResponse::success(json!({ "lines": [] }))),
        ]);
        let wallet = wallet();
        let config = config();

        let report = Sweeper::new(&client, &wallet, &config).run().await.unwrap();
        assert_eq!(report.candidates, 0);
        assert_eq!(report.tally, Tally::default());
        assert!(report.released_reserve.is_none());
        // snapshot + scan only: no submission side effects at all
        assert_eq!(client.request_count(), 2);
        assert!(!client
            .requests
            .lock()
            .unwrap()
            .iter()
            .any(|r| matches!(r, Command::Submit { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn reserve_delta_uses_the_per_object_cost() {
        let mut steps = vec![
            account_info(10), // baseline
            one_zero_line(),
            account_info(10), // progress re-sample at item 0
        ];
        steps.extend(successful_retirement());
        steps.push(account_info(8)); // closing snapshot
        let client = MockLedgerClient::new(steps);
        let wallet = wallet();
        let config = config();

        let report = Sweeper::new(&client, &wallet, &config).run().await.unwrap();
        assert_eq!(report.tally.succeeded, 1);
        assert_eq!(report.initial_owner_count, 10);
        assert_eq!(report.final_owner_count, Some(8));
        assert_eq!(report.released_reserve, Some(dec!(0.4)));
        assert!(!report.deletion_ready);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_owner_count_signals_deletion_readiness() {
        let mut steps = vec![
            account_info(1),
            one_zero_line(),
            // progress re-sample fails; silently ignored
            Step::Respond(LedgerResponse::failure("tooBusy")),
        ];
        steps.extend(successful_retirement());
        steps.push(account_info(0));
        let client = MockLedgerClient::new(steps);
        let wallet = wallet();
        let config = config();

        let report = Sweeper::new(&client, &wallet, &config).run().await.unwrap();
        assert_eq!(report.final_owner_count, Some(0));
        assert_eq!(report.released_reserve, Some(dec!(0.2)));
        assert!(report.deletion_ready);
    }

    #[tokio::test]
    async fn missing_account_at_startup_is_fatal() {
        let client = MockLedgerClient::new(vec![Step::Respond(LedgerResponse::failure(
            "actNotFound",
        ))]);
        let wallet = wallet();
        let config = config();

        let error = Sweeper::new(&client, &wallet, &config).run().await.unwrap_err();
        assert!(matches!(error, AppError::AccountNotFound(_)));
    }
}
