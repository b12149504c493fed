// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Error types live here.

use bitcoin::ScriptBuf;

use core::fmt;

/// Indicates a failure while building, signing or checking one of the channel transactions.
///
/// None of these are recoverable by retrying the same call: they indicate either a caller bug
/// (inconsistent inputs) or a counterparty handing us bad data.
#[derive(Clone, PartialEq, Eq)]
pub enum TxBuilderError {
	/// No output of the parent transaction pays to the expected script (or every matching output
	/// was already claimed by another HTLC). Usually means the parent is not the commitment
	/// transaction these parameters describe.
	OutputNotFound {
		/// The script we were looking for.
		script_pubkey: ScriptBuf,
	},
	/// The redeem script given for an input does not hash to the script of the output it spends.
	InvalidRedeemScript,
	/// Full script verification of a signed transaction failed.
	ScriptVerificationFailed {
		/// A human-readable error message
		err: String,
	},
	/// The preimage handed in does not hash to the HTLC's payment hash.
	InvalidPreimage,
	/// After paying its fee, a claim transaction's output would not exceed the dust limit and the
	/// transaction would not relay.
	AmountBelowDustLimit {
		/// The output value the claim would have had, if the fee did not already exceed the input.
		amount_sat: Option<u64>,
		/// The dust limit the output was checked against.
		dust_limit_satoshis: u64,
	},
	/// The signature hash could not be computed, generally because the input index is out of
	/// range for the transaction.
	SighashError {
		/// A human-readable error message
		err: String,
	},
	/// A signature did not verify against the transaction's signature hash and the given key.
	InvalidSignature,
	/// The second-stage fee of an HTLC transaction exceeds the value of the HTLC output it spends.
	FeeExceedsAmount {
		/// The value of the spent output.
		amount_sat: u64,
		/// The fee the transaction needs to pay.
		fee_sat: u64,
	},
}

impl fmt::Debug for TxBuilderError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			TxBuilderError::OutputNotFound { ref script_pubkey } => {
				write!(f, "No output found paying to {}", script_pubkey.to_hex_string())
			},
			TxBuilderError::InvalidRedeemScript => {
				f.write_str("Redeem script does not match the spent output's script_pubkey")
			},
			TxBuilderError::ScriptVerificationFailed { ref err } => {
				write!(f, "Script verification failed: {}", err)
			},
			TxBuilderError::InvalidPreimage => {
				f.write_str("Preimage does not match the HTLC payment hash")
			},
			TxBuilderError::AmountBelowDustLimit { amount_sat: Some(amount), dust_limit_satoshis } => {
				write!(
					f,
					"Claim output of {} sat is not above the dust limit of {} sat",
					amount, dust_limit_satoshis
				)
			},
			TxBuilderError::AmountBelowDustLimit { amount_sat: None, dust_limit_satoshis } => {
				write!(
					f,
					"Claim fee exceeds the spent output, dust limit is {} sat",
					dust_limit_satoshis
				)
			},
			TxBuilderError::SighashError { ref err } => write!(f, "Sighash error: {}", err),
			TxBuilderError::InvalidSignature => f.write_str("Signature failed to verify"),
			TxBuilderError::FeeExceedsAmount { amount_sat, fee_sat } => {
				write!(f, "Fee of {} sat exceeds the HTLC output of {} sat", fee_sat, amount_sat)
			},
		}
	}
}

impl fmt::Display for TxBuilderError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

impl std::error::Error for TxBuilderError {}
