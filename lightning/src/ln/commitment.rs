// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Builds the commitment transaction for one side of a channel from the channel state.

use bitcoin::script::ScriptBuf;
use bitcoin::transaction::{self, Transaction, TxIn, TxOut};
use bitcoin::{absolute, Amount, Sequence, Witness};

use crate::ln::chan_utils::{
	get_htlc_redeemscript, get_revokeable_redeemscript, get_to_remote_script, CommitmentKeys,
	DirectedHtlc,
};
use crate::ln::fees::{commit_tx_fee, is_trimmed};
use crate::ln::transactions::{CommitTx, HtlcOutput, InputInfo};
use crate::util::config::ChannelTxConfig;
use crate::util::logger::{Logger, WithContext};
use crate::util::transaction_utils::sort_outputs;

use core::cmp::Ordering;
use core::ops::Deref;

/// The state a commitment transaction encodes, as seen from its broadcaster ("local").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitmentSpec {
	/// The fee rate, in satoshis per 1000 weight units, the commitment and its HTLC transactions
	/// pay.
	pub feerate_per_kw: u32,
	/// The broadcaster's balance, excluding in-flight HTLCs.
	pub to_local_msat: u64,
	/// The countersignatory's balance, excluding in-flight HTLCs.
	pub to_remote_msat: u64,
	/// Every in-flight HTLC, directed relative to the broadcaster.
	pub htlcs: Vec<DirectedHtlc>,
}

impl CommitmentSpec {
	/// The channel capacity, in msat.
	pub fn total_msat(&self) -> u64 {
		self.to_local_msat
			+ self.to_remote_msat
			+ self.htlcs.iter().map(|htlc| htlc.add.amount_msat).sum::<u64>()
	}
}

/// Builds the unsigned commitment transaction described by `spec`.
///
/// The funder pays the weight-based part of the commitment fee out of its balance. Trimmed
/// HTLCs go to fees simply by having no output, as do balances at or below the dust limit. If
/// the funder cannot afford the fee its output is dropped rather than failing; the channel state
/// machine is expected to prevent this. [`CommitTx::fee_sat`] is what miners end up with.
///
/// Outputs are sorted in BIP 69 order, with identical HTLC outputs ordered by CLTV expiry and
/// then payment hash, so that both parties derive the same transaction. The position each HTLC
/// output ended up at is recorded in the returned [`CommitTx`].
pub fn build_commitment_tx<L: Deref>(
	funding_input: &InputInfo, is_funder: bool, config: &ChannelTxConfig, keys: &CommitmentKeys,
	spec: &CommitmentSpec, logger: &L,
) -> CommitTx
where
	L::Target: Logger,
{
	let dust_limit_satoshis = config.dust_limit_satoshis;
	let fee = commit_tx_fee(dust_limit_satoshis, spec);
	let weight_fee_sat = fee.weight_fee_sat();
	let mut fee_sat = fee.total_sat();

	let mut to_local_sat = spec.to_local_msat / 1000;
	let mut to_remote_sat = spec.to_remote_msat / 1000;
	{
		let funder_sat = if is_funder { &mut to_local_sat } else { &mut to_remote_sat };
		match funder_sat.checked_sub(weight_fee_sat) {
			Some(remaining) => *funder_sat = remaining,
			None => {
				log_warn!(
					logger,
					"Funder balance of {} sat cannot cover the commitment fee of {} sat, dropping its output",
					funder_sat,
					weight_fee_sat
				);
				fee_sat -= weight_fee_sat - *funder_sat;
				*funder_sat = 0;
			},
		}
	}

	let mut txouts: Vec<(TxOut, Option<&DirectedHtlc>)> = Vec::with_capacity(spec.htlcs.len() + 2);

	if to_local_sat > dust_limit_satoshis {
		let redeem_script = get_revokeable_redeemscript(
			&keys.revocation_key,
			config.to_self_delay,
			&keys.broadcaster_delayed_payment_key,
		);
		txouts.push((
			TxOut { value: Amount::from_sat(to_local_sat), script_pubkey: redeem_script.to_p2wsh() },
			None,
		));
	} else {
		fee_sat += to_local_sat;
	}

	if to_remote_sat > dust_limit_satoshis {
		txouts.push((
			TxOut {
				value: Amount::from_sat(to_remote_sat),
				script_pubkey: get_to_remote_script(&keys.countersignatory_payment_key),
			},
			None,
		));
	} else {
		fee_sat += to_remote_sat;
	}

	for htlc in spec.htlcs.iter() {
		if is_trimmed(htlc, spec.feerate_per_kw, dust_limit_satoshis) {
			let htlc_logger = WithContext::from(logger, None, Some(htlc.add.payment_hash));
			log_trace!(
				htlc_logger,
				"Trimming {:?} HTLC {} of {} msat below the dust limit of {} sat",
				htlc.direction,
				htlc.add.id,
				htlc.add.amount_msat,
				dust_limit_satoshis
			);
			continue;
		}
		let redeem_script = get_htlc_redeemscript(htlc.direction, &htlc.add, keys);
		txouts.push((
			TxOut {
				value: Amount::from_sat(htlc.add.amount_msat / 1000),
				script_pubkey: redeem_script.to_p2wsh(),
			},
			Some(htlc),
		));
	}

	sort_outputs(&mut txouts, |a, b| match (a, b) {
		(Some(a), Some(b)) => a
			.add
			.cltv_expiry
			.cmp(&b.add.cltv_expiry)
			.then_with(|| a.add.payment_hash.cmp(&b.add.payment_hash)),
		_ => Ordering::Equal,
	});

	let mut htlc_outputs = Vec::with_capacity(txouts.len());
	let mut outputs = Vec::with_capacity(txouts.len());
	for (idx, (txout, htlc)) in txouts.into_iter().enumerate() {
		if let Some(htlc) = htlc {
			htlc_outputs.push(HtlcOutput {
				direction: htlc.direction,
				htlc_id: htlc.add.id,
				transaction_output_index: idx as u32,
			});
		}
		outputs.push(txout);
	}

	let tx = Transaction {
		version: transaction::Version::TWO,
		lock_time: absolute::LockTime::ZERO,
		input: vec![TxIn {
			previous_output: funding_input.outpoint(),
			script_sig: ScriptBuf::new(),
			sequence: Sequence::MAX,
			witness: Witness::new(),
		}],
		output: outputs,
	};

	let tx_logger = WithContext::from(logger, Some(tx.compute_txid()), None);
	log_debug!(
		tx_logger,
		"Built commitment {} paying {} sat in fees ({} sat of trimmed HTLCs)",
		log_tx!(tx),
		fee_sat,
		fee.trimmed_sat
	);

	CommitTx { input: funding_input.clone(), tx, htlc_outputs, fee_sat }
}
