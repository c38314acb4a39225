//! Progress reporting for a deployment run.

use alloy_core::primitives::{U256, utils::format_units};

use crate::{AccountState, DeployError, FeeSnapshot, LedgerEntry, RunState};

/// Observer of a deployment run. Purely side-effecting.
pub trait Telemetry: Send + Sync {
    /// Deployer account state, before anything is sent.
    fn account(&self, account: &AccountState);

    /// Fee estimates; only the fields present on the network are reported.
    fn fees(&self, fees: &FeeSnapshot);

    /// A creation transaction was acknowledged.
    fn deployed(&self, entry: &LedgerEntry);

    /// A creation transaction reached finality.
    fn confirmed(&self, entry: &LedgerEntry);

    /// The run reached a terminal state.
    fn finished(&self, state: RunState, error: Option<&DeployError>);
}

/// Format a base-unit amount in `unit` (`"ether"`, `"gwei"`, ...) without trailing zeros.
///
/// `1_000_000_000` wei in gwei is `"1"`, `1_500_000_000` wei is `"1.5"`.
pub fn display_units(amount: impl Into<U256>, unit: &str) -> String {
    let amount = amount.into();
    match format_units(amount, unit) {
        Ok(formatted) if formatted.contains('.') => formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string(),
        Ok(formatted) => formatted,
        Err(_) => amount.to_string(),
    }
}

/// The lines reported for a fee snapshot, e.g. `("gasPrice", "1.5")` (gwei).
pub fn fee_lines(fees: &FeeSnapshot) -> Vec<(&'static str, String)> {
    fees.present_fields()
        .into_iter()
        .map(|(label, wei)| (label, display_units(U256::from(wei), "gwei")))
        .collect()
}

/// Reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn account(&self, account: &AccountState) {
        tracing::info!(
            address = %account.address,
            "Deploying contracts with the account: {}",
            account.address
        );
        tracing::info!(
            balance_wei = %account.balance,
            "Account balance: {} ether",
            display_units(account.balance, "ether")
        );
        tracing::info!(nonce = account.nonce, "Account nonce: {}", account.nonce);
    }

    fn fees(&self, fees: &FeeSnapshot) {
        if fees.present_fields().is_empty() {
            tracing::warn!("Network reported no fee estimates");
        }
        for (label, gwei) in fee_lines(fees) {
            tracing::info!("{}: {} gwei", label, gwei);
        }
    }

    fn deployed(&self, entry: &LedgerEntry) {
        tracing::info!(
            contract = %entry.name,
            artifact = %entry.artifact,
            "{}: {}",
            entry.name,
            entry.address
        );
        tracing::info!("\ttx hash: {}", entry.tx_hash);
        tracing::info!("\ttx nonce: {}", entry.nonce);
        tracing::info!(
            gas_limit = entry.gas_limit,
            "\ttx gasLimit: {} gwei",
            display_units(U256::from(entry.gas_limit), "gwei")
        );
    }

    fn confirmed(&self, entry: &LedgerEntry) {
        tracing::info!(
            contract = %entry.name,
            address = %entry.address,
            tx_hash = %entry.tx_hash,
            "Confirmed"
        );
    }

    fn finished(&self, state: RunState, error: Option<&DeployError>) {
        match error {
            None => tracing::info!(state = %state, "deploy over"),
            Some(error) => {
                tracing::error!(state = %state, error = %error.detail(), "Deployment failed");
                tracing::error!("{:#?}", error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_units_trims_zeros() {
        assert_eq!(display_units(U256::from(1_000_000_000u64), "gwei"), "1");
        assert_eq!(display_units(U256::from(1_500_000_000u64), "gwei"), "1.5");
        assert_eq!(display_units(U256::from(3_000_000u64), "gwei"), "0.003");
        assert_eq!(display_units(U256::ZERO, "gwei"), "0");
    }

    #[test]
    fn test_display_units_ether() {
        let balance = U256::from(12_345_000_000_000_000_000u128);
        assert_eq!(display_units(balance, "ether"), "12.345");
    }

    #[test]
    fn test_fee_lines_legacy_only() {
        let fees = FeeSnapshot::from_parts(None, Some(2_000_000_000));
        assert_eq!(fee_lines(&fees), vec![("gasPrice", "2".to_string())]);
    }

    #[test]
    fn test_fee_lines_dynamic() {
        let fees = FeeSnapshot {
            base_fee: Some(1_000_000_000),
            max_fee_per_gas: Some(3_500_000_000),
            max_priority_fee_per_gas: Some(1_500_000_000),
            gas_price: Some(2_000_000_000),
        };

        assert_eq!(
            fee_lines(&fees),
            vec![
                ("lastBaseFeePerGas", "1".to_string()),
                ("maxFeePerGas", "3.5".to_string()),
                ("maxPriorityFeePerGas", "1.5".to_string()),
                ("gasPrice", "2".to_string()),
            ]
        );
    }
}
