use serde_json::Value;
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::client::requests::Command;
use crate::client::LedgerClient;
use crate::config::Config;
use crate::error::{AppResult, ClientError};
use crate::ledger::models::{ScanOutcome, TrustLine, TrustLineRecord};

/// Walk the account's trust lines page by page and collect those whose
/// balance is exactly zero, in server order.
///
/// A timed-out page is re-requested at the same cursor after a fixed
/// backoff; the read is idempotent, so no entries are skipped or
/// duplicated. A non-timeout unsuccessful response ends the scan with
/// whatever was accumulated, flagged `complete: false`.
pub async fn scan_zero_balance_lines<C: LedgerClient + ?Sized>(
    client: &C,
    config: &Config,
    address: &str,
) -> AppResult<ScanOutcome> {
    let mut lines: Vec<TrustLine> = Vec::new();
    let mut marker: Option<Value> = None;
    let mut retries: u32 = 0;

    loop {
        let command = Command::AccountLines {
            account: address.to_string(),
            limit: config.page_limit,
            marker: marker.clone(),
        };
        let response = match timeout(config.page_timeout, client.request(command)).await {
            Ok(result) => result?,
            Err(_) => {
                retries += 1;
                if let Some(max) = config.max_page_retries {
                    if retries > max {
                        return Err(ClientError::RetriesExhausted(retries).into());
                    }
                }
                warn!("timeout while fetching trust lines, retrying");
                sleep(config.page_retry_backoff).await;
                // cursor deliberately not advanced
                continue;
            }
        };
        retries = 0;

        if !response.is_successful() {
            warn!(
                "trust line scan stopped early: {}; returning partial results",
                response.error_code()
            );
            return Ok(ScanOutcome {
                lines,
                complete: false,
            });
        }

        let records: Vec<TrustLineRecord> =
            serde_json::from_value(response.result["lines"].clone()).map_err(|e| {
                ClientError::MalformedResponse(format!("account_lines entries: {}", e))
            })?;
        for record in records {
            let line = TrustLine::try_from(record)?;
            if line.balance.is_zero() {
                lines.push(line);
            }
        }

        match response.result.get("marker") {
            Some(next) if !next.is_null() => marker = Some(next.clone()),
            _ => {
                return Ok(ScanOutcome {
                    lines,
                    complete: true,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::time::Duration;

    use super::*;
    use crate::client::testing::{MockLedgerClient, Step};
    use crate::client::LedgerResponse;
    use crate::error::AppError;

    fn config() -> Config {
        Config {
            websocket_url: String::new(),
            page_limit: 400,
            page_timeout: Duration::from_secs(30),
            page_retry_backoff: Duration::from_secs(2),
            max_page_retries: None,
            submit_pacing: Duration::from_millis(100),
            progress_interval: 10,
            reserve_per_object: rust_decimal_macros::dec!(0.2),
            trust_set_flags: 2_228_224,
            fee_cap_drops: 1_000,
            last_ledger_offset: 20,
            finality_poll_interval: Duration::from_secs(1),
            finality_timeout: Some(Duration::from_secs(120)),
        }
    }

    fn page(entries: &[(&str, &str)], marker: Option<Value>) -> LedgerResponse {
        let lines: Vec<Value> = entries
            .iter()
            .map(|(currency, balance)| {
                json!({ "currency": currency, "account": "rIssuer", "balance": balance })
            })
            .collect();
        let mut result = json!({ "lines": lines });
        if let Some(marker) = marker {
            result["marker"] = marker;
        }
        LedgerResponse::success(result)
    }

    #[tokio::test]
    async fn keeps_only_zero_balances_regardless_of_representation() {
        let client = MockLedgerClient::new(vec![Step::Respond(page(
            &[
                ("AAA", "0"),
                ("BBB", "0.0"),
                ("CCC", "-0"),
                ("DDD", "1"),
                ("EEE", "-3.5"),
            ],
            None,
        ))]);

        let outcome = scan_zero_balance_lines(&client, &config(), "rAccount")
            .await
            .unwrap();
        assert!(outcome.complete);
        let currencies: Vec<&str> = outcome.lines.iter().map(|l| l.currency.as_str()).collect();
        assert_eq!(currencies, vec!["AAA", "BBB", "CCC"]);
    }

    #[tokio::test]
    async fn follows_markers_across_all_pages_in_order() {
        let client = MockLedgerClient::new(vec![
            Step::Respond(page(&[("AAA", "0")], Some(json!("m1")))),
            Step::Respond(page(&[("BBB", "0")], Some(json!("m2")))),
            Step::Respond(page(&[("CCC", "0")], None)),
        ]);

        let outcome = scan_zero_balance_lines(&client, &config(), "rAccount")
            .await
            .unwrap();
        assert!(outcome.complete);
        let currencies: Vec<&str> = outcome.lines.iter().map(|l| l.currency.as_str()).collect();
        assert_eq!(currencies, vec!["AAA", "BBB", "CCC"]);

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        let markers: Vec<Option<Value>> = requests
            .iter()
            .map(|r| match r {
                Command::AccountLines { marker, .. } => marker.clone(),
                other => panic!("unexpected request: {:?}", other),
            })
            .collect();
        assert_eq!(
            markers,
            vec![None, Some(json!("m1")), Some(json!("m2"))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retries_a_timed_out_page_at_the_same_cursor() {
        let client = MockLedgerClient::new(vec![
            Step::Hang,
            Step::Hang,
            Step::Respond(page(&[("AAA", "0")], None)),
        ]);

        let outcome = scan_zero_balance_lines(&client, &config(), "rAccount")
            .await
            .unwrap();
        assert_eq!(outcome.lines.len(), 1);

        // two timeouts then success: three requests for the same cursor
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        for request in requests.iter() {
            assert!(matches!(
                request,
                Command::AccountLines { marker: None, .. }
            ));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_retries_surface_an_error() {
        let client = MockLedgerClient::new(vec![Step::Hang, Step::Hang, Step::Hang]);
        let mut config = config();
        config.max_page_retries = Some(2);

        let error = scan_zero_balance_lines(&client, &config, "rAccount")
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            AppError::Client(ClientError::RetriesExhausted(3))
        ));
    }

    #[tokio::test]
    async fn unsuccessful_page_yields_partial_results() {
        let client = MockLedgerClient::new(vec![
            Step::Respond(page(&[("AAA", "0")], Some(json!("m1")))),
            Step::Respond(LedgerResponse::failure("tooBusy")),
        ]);

        let outcome = scan_zero_balance_lines(&client, &config(), "rAccount")
            .await
            .unwrap();
        assert!(!outcome.complete);
        assert_eq!(outcome.lines.len(), 1);
    }
}
