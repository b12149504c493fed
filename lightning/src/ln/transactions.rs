// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The transactions this crate builds, each paired with what is needed to sign and check its
//! single input.
//!
//! Every transaction here spends exactly one output, described by an [`InputInfo`]. Signing is
//! therefore only parameterized by the key (see [`crate::sign`]). Values are never modified in
//! place: `add_signatures` returns a copy with the input's witness filled in.

use bitcoin::script::{Script, ScriptBuf};
use bitcoin::secp256k1::{ecdsa::Signature, PublicKey};
use bitcoin::transaction::{OutPoint, Transaction, TxOut};
use bitcoin::Txid;

use crate::ln::chan_utils::{
	build_claim_htlc_witness, build_funding_witness, build_htlc_input_witness,
	build_revokeable_delayed_witness, HtlcDirection,
};
use crate::ln::{PaymentHash, PaymentPreimage};
use crate::util::errors::TxBuilderError;

use core::fmt;

/// The output a transaction spends, along with the witness script it is locked with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputInfo {
	outpoint: OutPoint,
	txout: TxOut,
	redeem_script: ScriptBuf,
}

impl InputInfo {
	/// Fails with [`TxBuilderError::InvalidRedeemScript`] unless `txout` is the P2WSH of
	/// `redeem_script`.
	pub fn new(
		outpoint: OutPoint, txout: TxOut, redeem_script: ScriptBuf,
	) -> Result<Self, TxBuilderError> {
		if redeem_script.to_p2wsh() != txout.script_pubkey {
			return Err(TxBuilderError::InvalidRedeemScript);
		}
		Ok(InputInfo { outpoint, txout, redeem_script })
	}

	/// The spent outpoint.
	pub fn outpoint(&self) -> OutPoint {
		self.outpoint
	}

	/// The spent output.
	pub fn txout(&self) -> &TxOut {
		&self.txout
	}

	/// The witness script of the spent output.
	pub fn redeem_script(&self) -> &Script {
		&self.redeem_script
	}
}

macro_rules! impl_tx_with_input_info {
	($ty: ident) => {
		impl $ty {
			/// The output this transaction spends.
			pub fn input(&self) -> &InputInfo {
				&self.input
			}

			/// The transaction, with a witness once signatures have been added.
			pub fn tx(&self) -> &Transaction {
				&self.tx
			}

			/// The transaction's id, which the witness does not affect.
			pub fn txid(&self) -> Txid {
				self.tx.compute_txid()
			}

			fn with_witness(&self, witness: bitcoin::Witness) -> Self {
				let mut signed = self.clone();
				signed.tx.input[0].witness = witness;
				signed
			}
		}
	};
}

/// Where the output sort placed an untrimmed HTLC on a commitment transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HtlcOutput {
	/// Whether the broadcaster offered or received the HTLC.
	pub direction: HtlcDirection,
	/// The HTLC's id, unique within its direction.
	pub htlc_id: u64,
	/// The index of the HTLC's output in the commitment transaction.
	pub transaction_output_index: u32,
}

/// A commitment transaction, spending the channel's funding output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitTx {
	pub(crate) input: InputInfo,
	pub(crate) tx: Transaction,
	pub(crate) htlc_outputs: Vec<HtlcOutput>,
	pub(crate) fee_sat: u64,
}
impl_tx_with_input_info!(CommitTx);

impl CommitTx {
	/// The outputs given to untrimmed HTLCs, in output order.
	pub fn htlc_outputs(&self) -> &[HtlcOutput] {
		&self.htlc_outputs
	}

	/// The output index of the HTLC `htlc_id` in `direction`, if it was given an output.
	///
	/// HTLCs sharing a payment hash and amount have identical outputs, so this is the only way
	/// to tell which of them belongs to which HTLC.
	pub fn htlc_output_index(&self, direction: HtlcDirection, htlc_id: u64) -> Option<u32> {
		self.htlc_outputs
			.iter()
			.find(|output| output.direction == direction && output.htlc_id == htlc_id)
			.map(|output| output.transaction_output_index)
	}

	/// Everything the transaction leaves to miners. Besides the weight fee the funder paid, this
	/// counts any value too small for an output, down to the sub-satoshi part of each amount.
	///
	/// Together with the outputs this always adds up to the channel capacity.
	pub fn fee_sat(&self) -> u64 {
		self.fee_sat
	}

	/// Completes the 2-of-2 funding witness. The two signatures are ordered by their funding
	/// keys, so callers need not know which key sorts first.
	pub fn add_signatures(
		&self, local_funding_pubkey: &PublicKey, remote_funding_pubkey: &PublicKey,
		local_sig: &Signature, remote_sig: &Signature,
	) -> Self {
		self.with_witness(build_funding_witness(
			local_funding_pubkey,
			remote_funding_pubkey,
			local_sig,
			remote_sig,
			self.input.redeem_script(),
		))
	}
}

/// The broadcaster's transaction spending an offered HTLC output of its own commitment after
/// the HTLC expired.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtlcTimeoutTx {
	pub(crate) input: InputInfo,
	pub(crate) tx: Transaction,
	pub(crate) htlc_id: u64,
}
impl_tx_with_input_info!(HtlcTimeoutTx);

impl HtlcTimeoutTx {
	/// The id of the HTLC being timed out.
	pub fn htlc_id(&self) -> u64 {
		self.htlc_id
	}

	/// Completes the witness of the HTLC output's timeout branch with both parties' HTLC
	/// signatures.
	pub fn add_signatures(&self, local_sig: &Signature, remote_sig: &Signature) -> Self {
		self.with_witness(build_htlc_input_witness(
			local_sig,
			remote_sig,
			&None,
			self.input.redeem_script(),
		))
	}
}

/// The broadcaster's transaction spending a received HTLC output of its own commitment with the
/// payment preimage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtlcSuccessTx {
	pub(crate) input: InputInfo,
	pub(crate) tx: Transaction,
	pub(crate) htlc_id: u64,
	pub(crate) payment_hash: PaymentHash,
}
impl_tx_with_input_info!(HtlcSuccessTx);

impl HtlcSuccessTx {
	/// The id of the HTLC being fulfilled.
	pub fn htlc_id(&self) -> u64 {
		self.htlc_id
	}

	/// The payment hash the preimage must match.
	pub fn payment_hash(&self) -> PaymentHash {
		self.payment_hash
	}

	/// Completes the witness of the HTLC output's success branch with both parties' HTLC
	/// signatures and the payment preimage.
	///
	/// Fails with [`TxBuilderError::InvalidPreimage`] if `preimage` does not hash to the
	/// HTLC's payment hash.
	pub fn add_signatures(
		&self, local_sig: &Signature, remote_sig: &Signature, preimage: &PaymentPreimage,
	) -> Result<Self, TxBuilderError> {
		if preimage.payment_hash() != self.payment_hash {
			return Err(TxBuilderError::InvalidPreimage);
		}
		Ok(self.with_witness(build_htlc_input_witness(
			local_sig,
			remote_sig,
			&Some(*preimage),
			self.input.redeem_script(),
		)))
	}
}

/// Our transaction claiming an HTLC the counterparty offered us on its commitment, using the
/// preimage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimHtlcSuccessTx {
	pub(crate) input: InputInfo,
	pub(crate) tx: Transaction,
	pub(crate) htlc_id: u64,
	pub(crate) payment_hash: PaymentHash,
}
impl_tx_with_input_info!(ClaimHtlcSuccessTx);

impl ClaimHtlcSuccessTx {
	/// The id of the HTLC being claimed.
	pub fn htlc_id(&self) -> u64 {
		self.htlc_id
	}

	/// The payment hash the preimage must match.
	pub fn payment_hash(&self) -> PaymentHash {
		self.payment_hash
	}

	/// Spends the offered HTLC output with our signature and the preimage. Fails with
	/// [`TxBuilderError::InvalidPreimage`] on a preimage for another payment.
	pub fn add_signatures(
		&self, local_sig: &Signature, preimage: &PaymentPreimage,
	) -> Result<Self, TxBuilderError> {
		if preimage.payment_hash() != self.payment_hash {
			return Err(TxBuilderError::InvalidPreimage);
		}
		Ok(self.with_witness(build_claim_htlc_witness(
			local_sig,
			&Some(*preimage),
			self.input.redeem_script(),
		)))
	}
}

/// Our transaction reclaiming an HTLC we offered, from the counterparty's commitment, once it
/// has expired.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimHtlcTimeoutTx {
	pub(crate) input: InputInfo,
	pub(crate) tx: Transaction,
	pub(crate) htlc_id: u64,
}
impl_tx_with_input_info!(ClaimHtlcTimeoutTx);

impl ClaimHtlcTimeoutTx {
	/// The id of the HTLC being reclaimed.
	pub fn htlc_id(&self) -> u64 {
		self.htlc_id
	}

	/// Spends the received HTLC output through its timeout branch with our signature alone.
	pub fn add_signatures(&self, local_sig: &Signature) -> Self {
		self.with_witness(build_claim_htlc_witness(local_sig, &None, self.input.redeem_script()))
	}
}

/// Our transaction sweeping the delayed output of one of our HTLC-timeout or HTLC-success
/// transactions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimHtlcDelayedTx {
	pub(crate) input: InputInfo,
	pub(crate) tx: Transaction,
}
impl_tx_with_input_info!(ClaimHtlcDelayedTx);

impl ClaimHtlcDelayedTx {
	/// Spends the revokeable output through its delayed branch.
	pub fn add_signatures(&self, local_sig: &Signature) -> Self {
		self.with_witness(build_revokeable_delayed_witness(local_sig, self.input.redeem_script()))
	}
}

/// The kind of a [`TransactionWithInputInfo`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionKind {
	/// See [`CommitTx`].
	Commitment,
	/// See [`HtlcSuccessTx`].
	HtlcSuccess,
	/// See [`HtlcTimeoutTx`].
	HtlcTimeout,
	/// See [`ClaimHtlcSuccessTx`].
	ClaimHtlcSuccess,
	/// See [`ClaimHtlcTimeoutTx`].
	ClaimHtlcTimeout,
	/// See [`ClaimHtlcDelayedTx`].
	ClaimHtlcDelayed,
}

impl fmt::Display for TransactionKind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			TransactionKind::Commitment => f.write_str("commitment tx"),
			TransactionKind::HtlcSuccess => f.write_str("HTLC-success tx"),
			TransactionKind::HtlcTimeout => f.write_str("HTLC-timeout tx"),
			TransactionKind::ClaimHtlcSuccess => f.write_str("claim-HTLC-success tx"),
			TransactionKind::ClaimHtlcTimeout => f.write_str("claim-HTLC-timeout tx"),
			TransactionKind::ClaimHtlcDelayed => f.write_str("claim-HTLC-delayed tx"),
		}
	}
}

/// Any of the transactions this crate builds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionWithInputInfo {
	/// A commitment transaction.
	Commitment(CommitTx),
	/// An HTLC-success transaction.
	HtlcSuccess(HtlcSuccessTx),
	/// An HTLC-timeout transaction.
	HtlcTimeout(HtlcTimeoutTx),
	/// A claim of an HTLC offered to us.
	ClaimHtlcSuccess(ClaimHtlcSuccessTx),
	/// A claim of an expired HTLC we offered.
	ClaimHtlcTimeout(ClaimHtlcTimeoutTx),
	/// A sweep of a second-stage HTLC transaction's delayed output.
	ClaimHtlcDelayed(ClaimHtlcDelayedTx),
}

macro_rules! on_each_variant {
	($self: expr, $tx: ident => $body: expr) => {
		match $self {
			TransactionWithInputInfo::Commitment($tx) => $body,
			TransactionWithInputInfo::HtlcSuccess($tx) => $body,
			TransactionWithInputInfo::HtlcTimeout($tx) => $body,
			TransactionWithInputInfo::ClaimHtlcSuccess($tx) => $body,
			TransactionWithInputInfo::ClaimHtlcTimeout($tx) => $body,
			TransactionWithInputInfo::ClaimHtlcDelayed($tx) => $body,
		}
	};
}

impl TransactionWithInputInfo {
	/// The output the wrapped transaction spends.
	pub fn input(&self) -> &InputInfo {
		on_each_variant!(self, tx => tx.input())
	}

	/// The wrapped transaction.
	pub fn tx(&self) -> &Transaction {
		on_each_variant!(self, tx => tx.tx())
	}

	/// The wrapped transaction's id.
	pub fn txid(&self) -> Txid {
		self.tx().compute_txid()
	}

	/// Which of the six transactions this is.
	pub fn kind(&self) -> TransactionKind {
		match self {
			TransactionWithInputInfo::Commitment(_) => TransactionKind::Commitment,
			TransactionWithInputInfo::HtlcSuccess(_) => TransactionKind::HtlcSuccess,
			TransactionWithInputInfo::HtlcTimeout(_) => TransactionKind::HtlcTimeout,
			TransactionWithInputInfo::ClaimHtlcSuccess(_) => TransactionKind::ClaimHtlcSuccess,
			TransactionWithInputInfo::ClaimHtlcTimeout(_) => TransactionKind::ClaimHtlcTimeout,
			TransactionWithInputInfo::ClaimHtlcDelayed(_) => TransactionKind::ClaimHtlcDelayed,
		}
	}
}

macro_rules! impl_from_variant {
	($ty: ident, $variant: ident) => {
		impl From<$ty> for TransactionWithInputInfo {
			fn from(tx: $ty) -> Self {
				TransactionWithInputInfo::$variant(tx)
			}
		}
	};
}
impl_from_variant!(CommitTx, Commitment);
impl_from_variant!(HtlcSuccessTx, HtlcSuccess);
impl_from_variant!(HtlcTimeoutTx, HtlcTimeout);
impl_from_variant!(ClaimHtlcSuccessTx, ClaimHtlcSuccess);
impl_from_variant!(ClaimHtlcTimeoutTx, ClaimHtlcTimeout);
impl_from_variant!(ClaimHtlcDelayedTx, ClaimHtlcDelayed);
