use serde::Serialize;
use serde_json::Value;

/// Typed ledger commands; the tag becomes the protocol `command` field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    AccountInfo {
        account: String,
    },
    AccountLines {
        account: String,
        limit: u32,
        /// Opaque continuation token from the previous page
        #[serde(skip_serializing_if = "Option::is_none")]
        marker: Option<Value>,
    },
    Submit {
        tx_blob: String,
    },
    Tx {
        transaction: String,
    },
    Fee,
    LedgerCurrent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn commands_carry_protocol_tags() {
        let command = Command::AccountLines {
            account: "rAccount".to_string(),
            limit: 400,
            marker: None,
        };
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["command"], "account_lines");
        assert_eq!(value["limit"], 400);
        assert!(value.get("marker").is_none());

        let value = serde_json::to_value(Command::LedgerCurrent).unwrap();
        assert_eq!(value, json!({ "command": "ledger_current" }));
    }

    #[test]
    fn marker_round_trips_opaquely() {
        let marker = json!({ "ledger": 7, "seq": 2 });
        let command = Command::AccountLines {
            account: "rAccount".to_string(),
            limit: 400,
            marker: Some(marker.clone()),
        };
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["marker"], marker);
    }
}
