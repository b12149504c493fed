// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Signing and verification of the channel transactions.
//!
//! Every transaction in [`crate::ln::transactions`] spends a single P2WSH output, so signing
//! one only takes the secret key: the script and amount come with its [`InputInfo`].
//!
//! [`InputInfo`]: crate::ln::transactions::InputInfo

use bitcoin::hashes::Hash;
use bitcoin::script::Script;
use bitcoin::secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey};
use bitcoin::secp256k1::{Signing, Verification};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{Amount, Transaction};

use crate::ln::transactions::{
	ClaimHtlcDelayedTx, ClaimHtlcSuccessTx, ClaimHtlcTimeoutTx, CommitTx, HtlcSuccessTx,
	HtlcTimeoutTx, TransactionWithInputInfo,
};
use crate::util::crypto::sign;
use crate::util::errors::TxBuilderError;

fn sighash_message(
	tx: &Transaction, input_index: usize, redeem_script: &Script, amount: Amount,
) -> Result<Message, TxBuilderError> {
	let sighash = SighashCache::new(tx)
		.p2wsh_signature_hash(input_index, redeem_script, amount, EcdsaSighashType::All)
		.map_err(|e| TxBuilderError::SighashError { err: e.to_string() })?;
	Ok(Message::from_digest(sighash.to_byte_array()))
}

/// Signs input `input_index` of `tx`, which spends a P2WSH output of `amount` locked with
/// `redeem_script`, with SIGHASH_ALL.
pub fn sign_input<C: Signing>(
	tx: &Transaction, input_index: usize, redeem_script: &Script, amount: Amount, key: &SecretKey,
	secp_ctx: &Secp256k1<C>,
) -> Result<Signature, TxBuilderError> {
	let msg = sighash_message(tx, input_index, redeem_script, amount)?;
	Ok(sign(secp_ctx, &msg, key))
}

macro_rules! impl_sign {
	($ty: ident) => {
		impl $ty {
			/// Signs the transaction's input with `key`.
			pub fn sign<C: Signing>(
				&self, key: &SecretKey, secp_ctx: &Secp256k1<C>,
			) -> Result<Signature, TxBuilderError> {
				sign_input(
					self.tx(),
					0,
					self.input().redeem_script(),
					self.input().txout().value,
					key,
					secp_ctx,
				)
			}
		}
	};
}
impl_sign!(CommitTx);
impl_sign!(HtlcSuccessTx);
impl_sign!(HtlcTimeoutTx);
impl_sign!(ClaimHtlcSuccessTx);
impl_sign!(ClaimHtlcTimeoutTx);
impl_sign!(ClaimHtlcDelayedTx);
impl_sign!(TransactionWithInputInfo);

/// Checks a signature for the input of `tx`, typically one the counterparty sent us, before it
/// gets attached with `add_signatures`.
pub fn verify_signature<C: Verification>(
	tx: &TransactionWithInputInfo, sig: &Signature, pubkey: &PublicKey, secp_ctx: &Secp256k1<C>,
) -> Result<(), TxBuilderError> {
	let input = tx.input();
	let msg = sighash_message(tx.tx(), 0, input.redeem_script(), input.txout().value)?;
	secp_ctx.verify_ecdsa(&msg, sig, pubkey).map_err(|_| TxBuilderError::InvalidSignature)
}

/// Runs full script verification of the (signed) input of `tx` against the output it spends,
/// including the absolute and relative timelocks.
pub fn check_spendable(tx: &TransactionWithInputInfo) -> Result<(), TxBuilderError> {
	let input = tx.input();
	tx.tx()
		.verify(|outpoint| {
			if *outpoint == input.outpoint() {
				Some(input.txout().clone())
			} else {
				None
			}
		})
		.map_err(|e| TxBuilderError::ScriptVerificationFailed { err: e.to_string() })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ln::chan_utils::HtlcDirection::{Offered, Received};
	use crate::ln::commitment::{build_commitment_tx, CommitmentSpec};
	use crate::ln::htlc_tx::build_htlc_txs;
	use crate::ln::transactions::TransactionKind;
	use crate::util::test_utils::{directed_htlc, TestChannel, TestLogger};

	fn commitment(chan: &TestChannel) -> (CommitTx, CommitmentSpec) {
		let spec = CommitmentSpec {
			feerate_per_kw: 1000,
			to_local_msat: 6_000_000_000,
			to_remote_msat: 3_000_000_000,
			htlcs: vec![
				directed_htlc(0, Offered, 10_000_000, 1, 500_000),
				directed_htlc(0, Received, 12_000_000, 2, 500_000),
			],
		};
		let logger = TestLogger::new();
		let commit = build_commitment_tx(
			&chan.funding_input(9_022_000), true, &chan.config, &chan.local_commitment_keys(), &spec,
			&&logger,
		);
		(commit, spec)
	}

	#[test]
	fn test_verify_signature() {
		let chan = TestChannel::new();
		let (commit, _) = commitment(&chan);
		let wrapped = TransactionWithInputInfo::from(commit.clone());
		let remote_pubkey = chan.remote_pubkeys().funding_pubkey;

		let sig = wrapped.sign(&chan.remote.funding_key, &chan.secp_ctx).unwrap();
		assert_eq!(sig, commit.sign(&chan.remote.funding_key, &chan.secp_ctx).unwrap());
		verify_signature(&wrapped, &sig, &remote_pubkey, &chan.secp_ctx).unwrap();

		let local_pubkey = chan.local_pubkeys().funding_pubkey;
		assert_eq!(
			verify_signature(&wrapped, &sig, &local_pubkey, &chan.secp_ctx),
			Err(TxBuilderError::InvalidSignature)
		);
	}

	#[test]
	fn test_tampered_transaction_fails() {
		let chan = TestChannel::new();
		let (commit, _) = commitment(&chan);
		let local_sig = commit.sign(&chan.local.funding_key, &chan.secp_ctx).unwrap();
		let remote_sig = commit.sign(&chan.remote.funding_key, &chan.secp_ctx).unwrap();

		let mut tampered = commit.clone();
		tampered.tx.output[0].value = tampered.tx.output[0].value - Amount::from_sat(1);
		let remote_pubkey = chan.remote_pubkeys().funding_pubkey;
		assert_eq!(
			verify_signature(&TransactionWithInputInfo::from(tampered.clone()), &remote_sig, &remote_pubkey, &chan.secp_ctx),
			Err(TxBuilderError::InvalidSignature)
		);

		let signed = tampered.add_signatures(&chan.local_pubkeys().funding_pubkey, &remote_pubkey, &local_sig, &remote_sig);
		match check_spendable(&TransactionWithInputInfo::from(signed)) {
			Err(TxBuilderError::ScriptVerificationFailed { .. }) => {},
			res => panic!("Unexpected result {:?}", res),
		}
	}

	#[test]
	fn test_input_index_out_of_range() {
		let chan = TestChannel::new();
		let (commit, _) = commitment(&chan);
		let input = commit.input();
		let res = sign_input(commit.tx(), 1, input.redeem_script(), input.txout().value, &chan.local.funding_key, &chan.secp_ctx);
		assert!(matches!(res, Err(TxBuilderError::SighashError { .. })));
	}

	#[test]
	fn test_signature_commits_to_amount() {
		let chan = TestChannel::new();
		let (commit, _) = commitment(&chan);
		let input = commit.input();
		let sig = commit.sign(&chan.local.funding_key, &chan.secp_ctx).unwrap();
		let other = sign_input(
			commit.tx(), 0, input.redeem_script(), input.txout().value + Amount::from_sat(1),
			&chan.local.funding_key, &chan.secp_ctx,
		).unwrap();
		assert_ne!(sig, other);
	}

	#[cfg(feature = "grind_signatures")]
	#[test]
	fn test_signatures_are_low_r() {
		let chan = TestChannel::new();
		let (commit, _) = commitment(&chan);
		for key in [&chan.local.funding_key, &chan.remote.funding_key] {
			let sig = commit.sign(key, &chan.secp_ctx).unwrap();
			assert!(sig.serialize_der().len() <= 70);
		}
	}

	#[test]
	fn test_htlc_signatures_through_enum() {
		let chan = TestChannel::new();
		let (commit, spec) = commitment(&chan);
		let keys = chan.local_commitment_keys();
		let logger = TestLogger::new();
		let (timeouts, successes) = build_htlc_txs(&commit, &chan.config, &keys, &spec, &&logger).unwrap();

		let point = chan.local_per_commitment_point();
		let remote_htlc_key = chan.derive_key(&point, &chan.remote.htlc_base_key);
		let remote_htlc_pubkey = keys.countersignatory_htlc_key;
		let txs: Vec<TransactionWithInputInfo> = vec![timeouts[0].clone().into(), successes[0].clone().into()];
		assert_eq!(txs.iter().map(|tx| tx.kind()).collect::<Vec<_>>(), vec![TransactionKind::HtlcTimeout, TransactionKind::HtlcSuccess]);
		for tx in txs.iter() {
			let sig = tx.sign(&remote_htlc_key, &chan.secp_ctx).unwrap();
			verify_signature(tx, &sig, &remote_htlc_pubkey, &chan.secp_ctx).unwrap();
			assert!(verify_signature(tx, &sig, &keys.broadcaster_htlc_key, &chan.secp_ctx).is_err());
		}
		// A signature for one HTLC transaction does not carry over to the other.
		let sig = txs[0].sign(&remote_htlc_key, &chan.secp_ctx).unwrap();
		assert!(verify_signature(&txs[1], &sig, &remote_htlc_pubkey, &chan.secp_ctx).is_err());
	}
}
