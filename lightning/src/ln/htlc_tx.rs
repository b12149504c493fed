// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Builds the second-stage HTLC-timeout and HTLC-success transactions spending the HTLC outputs
//! of a commitment transaction.

use bitcoin::script::{Script, ScriptBuf};
use bitcoin::transaction::{self, OutPoint, Transaction, TxIn, TxOut};
use bitcoin::{absolute, Amount, Sequence, Witness};

use crate::ln::chan_utils::{
	get_htlc_redeemscript, get_revokeable_redeemscript, CommitmentKeys, HtlcDirection, HtlcParams,
};
use crate::ln::commitment::CommitmentSpec;
use crate::ln::fees::{is_trimmed, second_stage_fee_sat};
use crate::ln::transactions::{CommitTx, HtlcSuccessTx, HtlcTimeoutTx, InputInfo};
use crate::util::config::ChannelTxConfig;
use crate::util::errors::TxBuilderError;
use crate::util::logger::{Logger, WithContext};

use core::ops::Deref;
use std::collections::HashSet;

/// Finds the index of the output of `tx` paying `amount` (if given) to `script_pubkey`, skipping
/// indices in `outputs_already_used`.
///
/// This locates outputs by content, for transactions whose output positions we did not record.
/// Identical outputs are told apart only by the indices callers already handed out.
pub fn find_script_pubkey_index(
	tx: &Transaction, script_pubkey: &Script, amount: Option<Amount>,
	outputs_already_used: &HashSet<u32>,
) -> Result<u32, TxBuilderError> {
	tx.output
		.iter()
		.enumerate()
		.map(|(idx, txout)| (idx as u32, txout))
		.find(|(idx, txout)| {
			txout.script_pubkey.as_script() == script_pubkey
				&& amount.map_or(true, |amount| txout.value == amount)
				&& !outputs_already_used.contains(idx)
		})
		.map(|(idx, _)| idx)
		.ok_or_else(|| TxBuilderError::OutputNotFound { script_pubkey: script_pubkey.to_owned() })
}

/// Describes the output of `htlc` on `commit_tx` as an input, using the index the commitment's
/// output sort gave it.
///
/// Fails with [`TxBuilderError::OutputNotFound`] if `htlc` got no output, or if the output at
/// that index does not pay the HTLC's amount to its script under `keys`.
pub(crate) fn htlc_output_input(
	commit_tx: &CommitTx, keys: &CommitmentKeys, direction: HtlcDirection, htlc: &HtlcParams,
) -> Result<InputInfo, TxBuilderError> {
	let redeem_script = get_htlc_redeemscript(direction, htlc, keys);
	let script_pubkey = redeem_script.to_p2wsh();
	let amount = Amount::from_sat(htlc.amount_msat / 1000);
	let vout = commit_tx
		.htlc_output_index(direction, htlc.id)
		.filter(|vout| match commit_tx.tx().output.get(*vout as usize) {
			Some(txout) => txout.script_pubkey == script_pubkey && txout.value == amount,
			None => false,
		})
		.ok_or(TxBuilderError::OutputNotFound { script_pubkey })?;
	let outpoint = OutPoint { txid: commit_tx.txid(), vout };
	InputInfo::new(outpoint, commit_tx.tx().output[vout as usize].clone(), redeem_script)
}

/// Builds the second-stage transaction spending the commitment output of `htlc` to the
/// broadcaster's revokeable script.
fn build_htlc_tx(
	commit_tx: &CommitTx, to_self_delay: u16, keys: &CommitmentKeys, feerate_per_kw: u32,
	direction: HtlcDirection, htlc: &HtlcParams,
) -> Result<(InputInfo, Transaction), TxBuilderError> {
	let input = htlc_output_input(commit_tx, keys, direction, htlc)?;
	let amount_sat = input.txout().value.to_sat();
	let fee_sat = second_stage_fee_sat(direction, feerate_per_kw);
	let output_sat = amount_sat
		.checked_sub(fee_sat)
		.ok_or(TxBuilderError::FeeExceedsAmount { amount_sat, fee_sat })?;

	let lock_time = match direction {
		HtlcDirection::Offered => absolute::LockTime::from_consensus(htlc.cltv_expiry),
		HtlcDirection::Received => absolute::LockTime::ZERO,
	};
	let revokeable_script = get_revokeable_redeemscript(
		&keys.revocation_key,
		to_self_delay,
		&keys.broadcaster_delayed_payment_key,
	);
	let tx = Transaction {
		version: transaction::Version::TWO,
		lock_time,
		input: vec![TxIn {
			previous_output: input.outpoint(),
			script_sig: ScriptBuf::new(),
			// Non-final, so that the locktime is enforced
			sequence: Sequence::ZERO,
			witness: Witness::new(),
		}],
		output: vec![TxOut {
			value: Amount::from_sat(output_sat),
			script_pubkey: revokeable_script.to_p2wsh(),
		}],
	};
	Ok((input, tx))
}

/// Builds the HTLC-timeout transaction for an HTLC offered by the broadcaster of `commit_tx`.
///
/// The transaction cannot be mined before the HTLC's `cltv_expiry`.
pub fn build_htlc_timeout_tx(
	commit_tx: &CommitTx, to_self_delay: u16, keys: &CommitmentKeys, feerate_per_kw: u32,
	htlc: &HtlcParams,
) -> Result<HtlcTimeoutTx, TxBuilderError> {
	let (input, tx) = build_htlc_tx(
		commit_tx,
		to_self_delay,
		keys,
		feerate_per_kw,
		HtlcDirection::Offered,
		htlc,
	)?;
	Ok(HtlcTimeoutTx { input, tx, htlc_id: htlc.id })
}

/// Builds the HTLC-success transaction for an HTLC received by the broadcaster of `commit_tx`.
/// It can be mined as soon as the preimage is known.
pub fn build_htlc_success_tx(
	commit_tx: &CommitTx, to_self_delay: u16, keys: &CommitmentKeys, feerate_per_kw: u32,
	htlc: &HtlcParams,
) -> Result<HtlcSuccessTx, TxBuilderError> {
	let (input, tx) = build_htlc_tx(
		commit_tx,
		to_self_delay,
		keys,
		feerate_per_kw,
		HtlcDirection::Received,
		htlc,
	)?;
	Ok(HtlcSuccessTx { input, tx, htlc_id: htlc.id, payment_hash: htlc.payment_hash })
}

/// Builds the second-stage transaction of every HTLC in `spec` which has an output on
/// `commit_tx`, in HTLC id order.
///
/// Fails with [`TxBuilderError::OutputNotFound`] if an untrimmed HTLC has no output, which means
/// `commit_tx` was not built from `spec`.
pub fn build_htlc_txs<L: Deref>(
	commit_tx: &CommitTx, config: &ChannelTxConfig, keys: &CommitmentKeys, spec: &CommitmentSpec,
	logger: &L,
) -> Result<(Vec<HtlcTimeoutTx>, Vec<HtlcSuccessTx>), TxBuilderError>
where
	L::Target: Logger,
{
	let mut htlcs: Vec<_> = spec
		.htlcs
		.iter()
		.filter(|htlc| !is_trimmed(htlc, spec.feerate_per_kw, config.dust_limit_satoshis))
		.collect();
	htlcs.sort_unstable_by_key(|htlc| (htlc.add.id, htlc.offered()));

	let commitment_txid = commit_tx.txid();
	let mut timeout_txs = Vec::new();
	let mut success_txs = Vec::new();
	for htlc in htlcs {
		let htlc_logger = WithContext::from(logger, Some(commitment_txid), Some(htlc.add.payment_hash));
		let (input, tx) = build_htlc_tx(
			commit_tx,
			config.to_self_delay,
			keys,
			spec.feerate_per_kw,
			htlc.direction,
			&htlc.add,
		)?;
		log_trace!(
			htlc_logger,
			"Built {} for HTLC {} spending output {}",
			log_tx!(tx),
			htlc.add.id,
			input.outpoint().vout
		);
		match htlc.direction {
			HtlcDirection::Offered => {
				timeout_txs.push(HtlcTimeoutTx { input, tx, htlc_id: htlc.add.id })
			},
			HtlcDirection::Received => success_txs.push(HtlcSuccessTx {
				input,
				tx,
				htlc_id: htlc.add.id,
				payment_hash: htlc.add.payment_hash,
			}),
		}
	}
	Ok((timeout_txs, success_txs))
}
