pub mod requests;
pub mod ws;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::{sleep, Instant};

use crate::error::{AppResult, ClientError};
use self::requests::Command;

/// One decoded ledger response: a status envelope around a result object
#[derive(Debug, Clone)]
pub struct LedgerResponse {
    pub status: String,
    pub error: Option<String>,
    pub result: Value,
}

impl LedgerResponse {
    pub fn from_value(mut value: Value) -> Self {
        Self {
            status: value["status"].as_str().unwrap_or("").to_string(),
            error: value["error"].as_str().map(str::to_string),
            result: value["result"].take(),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.status == "success"
    }

    pub fn error_code(&self) -> String {
        self.error.clone().unwrap_or_else(|| "unknown".to_string())
    }

    #[cfg(test)]
    pub fn success(result: Value) -> Self {
        Self {
            status: "success".to_string(),
            error: None,
            result,
        }
    }

    #[cfg(test)]
    pub fn failure(code: &str) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(code.to_string()),
            result: Value::Null,
        }
    }
}

/// Terminal states of a submit-and-wait round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finality {
    /// Included in a validated ledger with this engine result
    Validated { code: String },
    /// Rejected before reaching a ledger (tem/tef/ter class)
    Rejected { code: String },
    /// The ledger advanced past LastLedgerSequence without inclusion
    Expired,
    /// The configured deadline elapsed with the outcome still unknown
    TimedOut,
}

/// Validation-wait policy for submitted transactions
#[derive(Debug, Clone)]
pub struct FinalityPolicy {
    pub poll_interval: Duration,
    pub timeout: Option<Duration>,
}

/// Capability boundary to a ledger node. One request is in flight at a
/// time; the account's sequence-number discipline depends on it.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn request(&self, command: Command) -> AppResult<LedgerResponse>;

    /// Submit a signed blob and block until the network settles it:
    /// validated inclusion, expiry past `last_ledger_sequence`, or the
    /// policy deadline.
    async fn submit_and_wait(
        &self,
        tx_blob: &str,
        tx_hash: &str,
        last_ledger_sequence: u32,
        policy: &FinalityPolicy,
    ) -> AppResult<Finality> {
        let response = self
            .request(Command::Submit {
                tx_blob: tx_blob.to_string(),
            })
            .await?;
        if !response.is_successful() {
            return Err(ClientError::Rejected(response.error_code()).into());
        }
        let engine = response.result["engine_result"]
            .as_str()
            .ok_or_else(|| {
                ClientError::MalformedResponse("submit response missing engine_result".to_string())
            })?
            .to_string();

        // Only tes, queued and tec preliminary results can still reach a
        // validated ledger; everything else is terminal at submission.
        let can_validate =
            engine == "tesSUCCESS" || engine == "terQUEUED" || engine.starts_with("tec");
        if !can_validate {
            return Ok(Finality::Rejected { code: engine });
        }

        let deadline = policy.timeout.map(|timeout| Instant::now() + timeout);
        loop {
            sleep(policy.poll_interval).await;
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Ok(Finality::TimedOut);
                }
            }

            let lookup = self
                .request(Command::Tx {
                    transaction: tx_hash.to_string(),
                })
                .await?;
            if lookup.is_successful() {
                if lookup.result["validated"].as_bool().unwrap_or(false) {
                    let code = lookup.result["meta"]["TransactionResult"]
                        .as_str()
                        .unwrap_or("unknown")
                        .to_string();
                    return Ok(Finality::Validated { code });
                }
                continue;
            }

            // Not in any ledger yet; expired once the chain moves past
            // the transaction's LastLedgerSequence.
            let current = self.request(Command::LedgerCurrent).await?;
            if current.is_successful() {
                if let Some(index) = current.result["ledger_current_index"].as_u64() {
                    if index > u64::from(last_ledger_sequence) {
                        return Ok(Finality::Expired);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Scripted step for the mock client
    pub enum Step {
        Respond(LedgerResponse),
        /// Never resolves; exercises caller-side timeouts
        Hang,
    }

    /// Hand-rolled mock, scripted with one step per expected request
    pub struct MockLedgerClient {
        script: Mutex<VecDeque<Step>>,
        pub requests: Mutex<Vec<Command>>,
    }

    impl MockLedgerClient {
        pub fn new(steps: Vec<Step>) -> Self {
            Self {
                script: Mutex::new(steps.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LedgerClient for MockLedgerClient {
        async fn request(&self, command: Command) -> AppResult<LedgerResponse> {
            self.requests.lock().unwrap().push(command);
            let step = self.script.lock().unwrap().pop_front();
            match step {
                Some(Step::Respond(response)) => Ok(response),
                Some(Step::Hang) => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
                None => Err(ClientError::Closed.into()),
            }
        }
    }
}
