//! Point-in-time account and fee data read before deploying.

use alloy_core::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Priority fee assumed when the network reports a base fee (1.5 gwei).
pub const DEFAULT_PRIORITY_FEE: u128 = 1_500_000_000;

/// Deployer account state, for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub address: Address,
    /// Balance in wei.
    pub balance: U256,
    /// Transaction count at the start of the run.
    pub nonce: u64,
}

/// Network fee estimates in wei.
///
/// Legacy networks only report `gas_price`; dynamic-fee networks also report a
/// base fee, from which the EIP-1559 fields are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSnapshot {
    pub base_fee: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub gas_price: Option<u128>,
}

impl FeeSnapshot {
    /// Derive a snapshot from the latest base fee and the node's gas price.
    ///
    /// With a base fee the max fee is twice the base fee plus [`DEFAULT_PRIORITY_FEE`].
    pub fn from_parts(base_fee: Option<u128>, gas_price: Option<u128>) -> Self {
        let (max_fee_per_gas, max_priority_fee_per_gas) = match base_fee {
            Some(base_fee) => (
                Some(
                    base_fee
                        .saturating_mul(2)
                        .saturating_add(DEFAULT_PRIORITY_FEE),
                ),
                Some(DEFAULT_PRIORITY_FEE),
            ),
            None => (None, None),
        };

        Self {
            base_fee,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            gas_price,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.base_fee.is_some()
    }

    /// The fields present on this network, labelled, in display order.
    pub fn present_fields(&self) -> Vec<(&'static str, u128)> {
        [
            ("lastBaseFeePerGas", self.base_fee),
            ("maxFeePerGas", self.max_fee_per_gas),
            ("maxPriorityFeePerGas", self.max_priority_fee_per_gas),
            ("gasPrice", self.gas_price),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|value| (label, value)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_dynamic() {
        let fees = FeeSnapshot::from_parts(Some(100), Some(250));
        assert!(fees.is_dynamic());
        assert_eq!(fees.max_priority_fee_per_gas, Some(DEFAULT_PRIORITY_FEE));
        assert_eq!(fees.max_fee_per_gas, Some(200 + DEFAULT_PRIORITY_FEE));
        assert_eq!(fees.gas_price, Some(250));
    }

    #[test]
    fn test_from_parts_legacy() {
        let fees = FeeSnapshot::from_parts(None, Some(1_000_000_000));
        assert!(!fees.is_dynamic());
        assert_eq!(fees.present_fields(), vec![("gasPrice", 1_000_000_000)]);
    }

    #[test]
    fn test_present_fields_empty() {
        assert!(FeeSnapshot::default().present_fields().is_empty());
    }
}
