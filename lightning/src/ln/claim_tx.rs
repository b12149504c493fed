// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Builds the single-signature transactions with which we sweep HTLC outputs to a key of our
//! own: directly from the counterparty's commitment transaction, or from the delayed output of
//! one of our second-stage HTLC transactions.

use bitcoin::script::ScriptBuf;
use bitcoin::secp256k1::PublicKey;
use bitcoin::transaction::{self, OutPoint, Transaction, TxIn, TxOut};
use bitcoin::{absolute, Amount, Sequence, Witness};

use crate::ln::chan_utils::{
	get_revokeable_redeemscript, get_to_remote_script, CommitmentKeys, HtlcDirection, HtlcParams,
};
use crate::ln::fees::{
	weight_to_fee, CLAIM_HTLC_DELAYED_WEIGHT, CLAIM_HTLC_SUCCESS_WEIGHT, CLAIM_HTLC_TIMEOUT_WEIGHT,
};
use crate::ln::htlc_tx::{find_script_pubkey_index, htlc_output_input};
use crate::ln::transactions::{
	ClaimHtlcDelayedTx, ClaimHtlcSuccessTx, ClaimHtlcTimeoutTx, CommitTx, InputInfo,
};
use crate::util::errors::TxBuilderError;
use crate::util::logger::{Logger, WithContext};

use core::ops::Deref;
use std::collections::HashSet;

/// Returns the claimed value left after paying for `weight`, failing if it would be dust.
fn claim_output_value(
	input_sat: u64, feerate_per_kw: u32, weight: u64, dust_limit_satoshis: u64,
) -> Result<Amount, TxBuilderError> {
	match input_sat.checked_sub(weight_to_fee(feerate_per_kw, weight)) {
		Some(amount_sat) if amount_sat > dust_limit_satoshis => Ok(Amount::from_sat(amount_sat)),
		amount_sat => Err(TxBuilderError::AmountBelowDustLimit { amount_sat, dust_limit_satoshis }),
	}
}

fn claim_tx(
	input: &InputInfo, lock_time: absolute::LockTime, sequence: Sequence, value: Amount,
	final_pubkey: &PublicKey,
) -> Transaction {
	Transaction {
		version: transaction::Version::TWO,
		lock_time,
		input: vec![TxIn {
			previous_output: input.outpoint(),
			script_sig: ScriptBuf::new(),
			sequence,
			witness: Witness::new(),
		}],
		output: vec![TxOut { value, script_pubkey: get_to_remote_script(final_pubkey) }],
	}
}

/// Builds the transaction claiming, with its preimage, an HTLC the counterparty offered us on
/// its commitment transaction `commit_tx`.
///
/// `keys` are the keys of that commitment, with the counterparty as broadcaster. The claim can
/// be mined immediately and pays to `final_pubkey`.
pub fn build_claim_htlc_success_tx<L: Deref>(
	commit_tx: &CommitTx, keys: &CommitmentKeys, final_pubkey: &PublicKey,
	dust_limit_satoshis: u64, feerate_per_kw: u32, htlc: &HtlcParams, logger: &L,
) -> Result<ClaimHtlcSuccessTx, TxBuilderError>
where
	L::Target: Logger,
{
	let input = htlc_output_input(commit_tx, keys, HtlcDirection::Offered, htlc)?;
	let value = claim_output_value(
		input.txout().value.to_sat(),
		feerate_per_kw,
		CLAIM_HTLC_SUCCESS_WEIGHT,
		dust_limit_satoshis,
	)?;
	let tx = claim_tx(&input, absolute::LockTime::ZERO, Sequence::MAX, value, final_pubkey);

	let logger = WithContext::from(logger, Some(commit_tx.txid()), Some(htlc.payment_hash));
	log_debug!(logger, "Built claim-HTLC-success {} for HTLC {}", log_tx!(tx), htlc.id);
	Ok(ClaimHtlcSuccessTx { input, tx, htlc_id: htlc.id, payment_hash: htlc.payment_hash })
}

/// Builds the transaction reclaiming an HTLC we offered, which the counterparty received on its
/// commitment transaction `commit_tx`, once it has expired.
///
/// `keys` are the keys of that commitment, with the counterparty as broadcaster. The claim
/// cannot be mined before the HTLC's `cltv_expiry`.
pub fn build_claim_htlc_timeout_tx<L: Deref>(
	commit_tx: &CommitTx, keys: &CommitmentKeys, final_pubkey: &PublicKey,
	dust_limit_satoshis: u64, feerate_per_kw: u32, htlc: &HtlcParams, logger: &L,
) -> Result<ClaimHtlcTimeoutTx, TxBuilderError>
where
	L::Target: Logger,
{
	let input = htlc_output_input(commit_tx, keys, HtlcDirection::Received, htlc)?;
	let value = claim_output_value(
		input.txout().value.to_sat(),
		feerate_per_kw,
		CLAIM_HTLC_TIMEOUT_WEIGHT,
		dust_limit_satoshis,
	)?;
	let lock_time = absolute::LockTime::from_consensus(htlc.cltv_expiry);
	let tx = claim_tx(&input, lock_time, Sequence::ZERO, value, final_pubkey);

	let logger = WithContext::from(logger, Some(commit_tx.txid()), Some(htlc.payment_hash));
	log_debug!(logger, "Built claim-HTLC-timeout {} for HTLC {}", log_tx!(tx), htlc.id);
	Ok(ClaimHtlcTimeoutTx { input, tx, htlc_id: htlc.id })
}

/// Builds the transaction sweeping the revokeable output of one of our own HTLC-timeout or
/// HTLC-success transactions once `to_self_delay` blocks have passed since it confirmed.
///
/// `keys` are the keys of the commitment transaction `htlc_tx` spends from, with us as
/// broadcaster.
pub fn build_claim_htlc_delayed_tx<L: Deref>(
	htlc_tx: &Transaction, keys: &CommitmentKeys, to_self_delay: u16, final_pubkey: &PublicKey,
	dust_limit_satoshis: u64, feerate_per_kw: u32, logger: &L,
) -> Result<ClaimHtlcDelayedTx, TxBuilderError>
where
	L::Target: Logger,
{
	let redeem_script = get_revokeable_redeemscript(
		&keys.revocation_key,
		to_self_delay,
		&keys.broadcaster_delayed_payment_key,
	);
	let vout =
		find_script_pubkey_index(htlc_tx, &redeem_script.to_p2wsh(), None, &HashSet::new())?;
	let outpoint = OutPoint { txid: htlc_tx.compute_txid(), vout };
	let input = InputInfo::new(outpoint, htlc_tx.output[vout as usize].clone(), redeem_script)?;
	let value = claim_output_value(
		input.txout().value.to_sat(),
		feerate_per_kw,
		CLAIM_HTLC_DELAYED_WEIGHT,
		dust_limit_satoshis,
	)?;
	let sequence = Sequence::from_height(to_self_delay);
	let tx = claim_tx(&input, absolute::LockTime::ZERO, sequence, value, final_pubkey);

	log_debug!(logger, "Built claim-HTLC-delayed {} spending {}", log_tx!(tx), outpoint);
	Ok(ClaimHtlcDelayedTx { input, tx })
}
