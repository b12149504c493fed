// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Fee accounting for commitment and second-stage transactions.
//!
//! All fees are a fixed weight estimate times the fee rate, so that both channel parties arrive
//! at the same amounts without having to build the transactions first.

use crate::ln::chan_utils::{DirectedHtlc, HtlcDirection};
use crate::ln::commitment::CommitmentSpec;

/// The weight of a commitment transaction without any HTLC outputs.
pub const COMMIT_TX_BASE_WEIGHT: u64 = 724;
/// The weight each untrimmed HTLC output adds to a commitment transaction.
pub const HTLC_OUTPUT_WEIGHT: u64 = 172;
/// The weight of an HTLC-timeout transaction.
pub const HTLC_TIMEOUT_TX_WEIGHT: u64 = 634;
/// The weight of an HTLC-success transaction.
pub const HTLC_SUCCESS_TX_WEIGHT: u64 = 671;

/// The weight of a transaction claiming an offered HTLC output with the preimage.
pub const CLAIM_HTLC_SUCCESS_WEIGHT: u64 = 571;
/// The weight of a transaction claiming a received HTLC output after its expiry.
pub const CLAIM_HTLC_TIMEOUT_WEIGHT: u64 = 545;
/// The weight of a transaction claiming a revokeable output through its delayed branch.
pub const CLAIM_HTLC_DELAYED_WEIGHT: u64 = 483;

/// Converts a weight to a fee in satoshis, rounding down.
#[inline]
pub fn weight_to_fee(feerate_per_kw: u32, weight: u64) -> u64 {
	feerate_per_kw as u64 * weight / 1024
}

/// The fee paid by an HTLC-timeout transaction.
#[inline]
pub fn htlc_timeout_fee_sat(feerate_per_kw: u32) -> u64 {
	weight_to_fee(feerate_per_kw, HTLC_TIMEOUT_TX_WEIGHT)
}

/// The fee paid by an HTLC-success transaction.
#[inline]
pub fn htlc_success_fee_sat(feerate_per_kw: u32) -> u64 {
	weight_to_fee(feerate_per_kw, HTLC_SUCCESS_TX_WEIGHT)
}

/// The fee of the second-stage transaction which would spend this HTLC's output.
#[inline]
pub fn second_stage_fee_sat(direction: HtlcDirection, feerate_per_kw: u32) -> u64 {
	match direction {
		HtlcDirection::Offered => htlc_timeout_fee_sat(feerate_per_kw),
		HtlcDirection::Received => htlc_success_fee_sat(feerate_per_kw),
	}
}

/// Whether an HTLC is left off the commitment transaction.
///
/// An HTLC only gets an output if what is left of it after paying for its second-stage
/// transaction exceeds the dust limit. An HTLC which does not even cover that fee is trimmed.
pub fn is_trimmed(htlc: &DirectedHtlc, feerate_per_kw: u32, dust_limit_satoshis: u64) -> bool {
	let fee = second_stage_fee_sat(htlc.direction, feerate_per_kw);
	match (htlc.add.amount_msat / 1000).checked_sub(fee) {
		Some(remaining) => remaining <= dust_limit_satoshis,
		None => true,
	}
}

/// The fee of a commitment transaction, split into the part paid for its weight and the value
/// of HTLCs too small to get an output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitmentFee {
	/// The fee rate the weight is priced at.
	pub feerate_per_kw: u32,
	/// The estimated weight of the commitment transaction.
	pub weight: u64,
	/// The summed value, in satoshis, of the trimmed HTLCs.
	pub trimmed_sat: u64,
	/// The summed sub-satoshi parts of both balances and of every HTLC, which outputs cannot
	/// carry.
	pub remainder_msat: u64,
}

impl CommitmentFee {
	/// The part of the fee the funder pays out of its balance.
	pub fn weight_fee_sat(&self) -> u64 {
		weight_to_fee(self.feerate_per_kw, self.weight)
	}

	/// Everything the commitment transaction leaves to miners, as long as the funder can pay
	/// the weight fee and both balances are above the dust limit.
	///
	/// [`CommitTx::fee_sat`] accounts for the other cases.
	///
	/// [`CommitTx::fee_sat`]: crate::ln::transactions::CommitTx::fee_sat
	pub fn total_sat(&self) -> u64 {
		self.weight_fee_sat() + self.trimmed_sat + self.remainder_msat / 1000
	}
}

/// Computes the fee of the commitment transaction described by `spec`.
pub fn commit_tx_fee(dust_limit_satoshis: u64, spec: &CommitmentSpec) -> CommitmentFee {
	let mut fee = CommitmentFee {
		feerate_per_kw: spec.feerate_per_kw,
		weight: COMMIT_TX_BASE_WEIGHT,
		trimmed_sat: 0,
		remainder_msat: spec.to_local_msat % 1000 + spec.to_remote_msat % 1000,
	};
	for htlc in spec.htlcs.iter() {
		fee.remainder_msat += htlc.add.amount_msat % 1000;
		if is_trimmed(htlc, spec.feerate_per_kw, dust_limit_satoshis) {
			fee.trimmed_sat += htlc.add.amount_msat / 1000;
		} else {
			fee.weight += HTLC_OUTPUT_WEIGHT;
		}
	}
	fee
}

/// Shorthand for `commit_tx_fee(dust_limit_satoshis, spec).total_sat()`.
pub fn commit_tx_fee_sat(dust_limit_satoshis: u64, spec: &CommitmentSpec) -> u64 {
	commit_tx_fee(dust_limit_satoshis, spec).total_sat()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ln::chan_utils::HtlcDirection::{Offered, Received};
	use crate::util::test_utils::directed_htlc;

	fn spec_with(feerate_per_kw: u32, htlcs: Vec<DirectedHtlc>) -> CommitmentSpec {
		CommitmentSpec { feerate_per_kw, to_local_msat: 5_000_000_000, to_remote_msat: 3_000_000_000, htlcs }
	}

	#[test]
	fn test_weight_to_fee() {
		assert_eq!(weight_to_fee(1000, 724), 707);
		assert_eq!(weight_to_fee(0, 724), 0);
		assert_eq!(weight_to_fee(253, 1024), 253);
		// Rounds down
		assert_eq!(weight_to_fee(1, 1023), 0);
		assert_eq!(htlc_timeout_fee_sat(1000), 619);
		assert_eq!(htlc_success_fee_sat(1000), 655);
	}

	#[test]
	fn test_fee_without_htlcs() {
		let spec = spec_with(1000, Vec::new());
		let fee = commit_tx_fee(546, &spec);
		assert_eq!(fee.weight, COMMIT_TX_BASE_WEIGHT);
		assert_eq!(fee.trimmed_sat, 0);
		assert_eq!(fee.total_sat(), 707);
		assert_eq!(commit_tx_fee_sat(546, &spec), weight_to_fee(1000, COMMIT_TX_BASE_WEIGHT));
	}

	#[test]
	fn test_trim_boundary() {
		let dust = 546;
		// At 1000 sat/kw an HTLC-timeout pays 619 sat and an HTLC-success 655 sat.
		let offered_at_limit = directed_htlc(0, Offered, (dust + 619) * 1000, 1, 500_000);
		let offered_above = directed_htlc(1, Offered, (dust + 619 + 1) * 1000, 2, 500_000);
		let received_at_limit = directed_htlc(0, Received, (dust + 655) * 1000, 3, 500_000);
		let received_above = directed_htlc(1, Received, (dust + 655 + 1) * 1000, 4, 500_000);
		assert!(is_trimmed(&offered_at_limit, 1000, dust));
		assert!(!is_trimmed(&offered_above, 1000, dust));
		assert!(is_trimmed(&received_at_limit, 1000, dust));
		assert!(!is_trimmed(&received_above, 1000, dust));
		// The same amount is kept as offered but trimmed as received, since success costs more.
		let offered = directed_htlc(2, Offered, (dust + 640) * 1000, 5, 500_000);
		let received = directed_htlc(2, Received, (dust + 640) * 1000, 5, 500_000);
		assert!(!is_trimmed(&offered, 1000, dust));
		assert!(is_trimmed(&received, 1000, dust));
	}

	#[test]
	fn test_htlc_below_its_own_fee_is_trimmed() {
		let tiny = directed_htlc(0, Offered, 100_000, 1, 500_000);
		assert!(is_trimmed(&tiny, 1000, 0));
		assert!(is_trimmed(&tiny, 1000, 546));
		// At a zero fee rate only the dust limit matters.
		assert!(!is_trimmed(&tiny, 0, 99));
		assert!(is_trimmed(&tiny, 0, 100));
	}

	#[test]
	fn test_fee_accumulates_weight_and_trimmed_value() {
		let spec = spec_with(
			2000,
			vec![
				directed_htlc(0, Offered, 5_000_000, 1, 500_000),
				directed_htlc(1, Received, 6_000_000, 2, 500_001),
				directed_htlc(2, Offered, 1_000_000, 3, 500_002),
				directed_htlc(3, Received, 1_500_000, 4, 500_003),
			],
		);
		let fee = commit_tx_fee(546, &spec);
		assert_eq!(fee.weight, COMMIT_TX_BASE_WEIGHT + 2 * HTLC_OUTPUT_WEIGHT);
		assert_eq!(fee.trimmed_sat, 1_000 + 1_500);
		assert_eq!(fee.weight_fee_sat(), 2000 * 1068 / 1024);
		assert_eq!(fee.total_sat(), 2085 + 2_500);
		assert_eq!(fee.remainder_msat, 0);
	}

	#[test]
	fn test_sub_satoshi_amounts_go_to_fee() {
		let spec = CommitmentSpec {
			feerate_per_kw: 1000,
			to_local_msat: 6_000_000_500,
			to_remote_msat: 3_000_000_700,
			htlcs: vec![
				directed_htlc(0, Offered, 5_000_800, 1, 500_000),
				// Trimmed, its whole satoshis count as trimmed and the rest as remainder.
				directed_htlc(1, Received, 1_000_999, 2, 500_000),
			],
		};
		let fee = commit_tx_fee(546, &spec);
		assert_eq!(fee.remainder_msat, 500 + 700 + 800 + 999);
		assert_eq!(fee.trimmed_sat, 1_000);
		assert_eq!(fee.weight_fee_sat(), 875);
		assert_eq!(fee.total_sat(), 875 + 1_000 + 2);
	}
}
