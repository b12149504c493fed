// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Various utilities for building scripts and deriving keys related to channels. These are
//! largely of interest for those building or signing channel transactions by hand.

use bitcoin::ecdsa::Signature as BitcoinSignature;
use bitcoin::hashes::hash160::Hash as Hash160;
use bitcoin::hashes::ripemd160::Hash as Ripemd160;
use bitcoin::hashes::Hash;
use bitcoin::opcodes;
use bitcoin::script::{Builder, Script, ScriptBuf};
use bitcoin::secp256k1::{self, ecdsa::Signature, PublicKey, Scalar, Secp256k1, SecretKey};
use bitcoin::{WPubkeyHash, Witness};

use crate::ln::{PaymentHash, PaymentPreimage};
use crate::util::crypto::sha256_of_pubkeys;

/// Derives a per-commitment-transaction private key (eg an htlc key or delayed_payment key)
/// from the base secret and the per_commitment_point.
pub fn derive_private_key<T: secp256k1::Signing>(
	secp_ctx: &Secp256k1<T>, per_commitment_point: &PublicKey, base_secret: &SecretKey,
) -> SecretKey {
	let base_point = PublicKey::from_secret_key(&secp_ctx, &base_secret);
	let res = sha256_of_pubkeys(per_commitment_point, &base_point);

	base_secret
		.clone()
		.add_tweak(&Scalar::from_be_bytes(res).expect("Hashes should always be valid scalars unless SHA-256 is broken"))
		.expect("Addition only fails if the tweak is the inverse of the key. This is not possible when the tweak contains the hash of the key.")
}

/// Derives a per-commitment-transaction public key (eg an htlc key or a delayed_payment key)
/// from the base point and the per_commitment_key. This is the public equivalent of
/// derive_private_key - using only public keys to derive a public key instead of private keys.
pub fn derive_public_key<T: secp256k1::Signing>(
	secp_ctx: &Secp256k1<T>, per_commitment_point: &PublicKey, base_point: &PublicKey,
) -> PublicKey {
	let res = sha256_of_pubkeys(per_commitment_point, base_point);

	let hashkey = PublicKey::from_secret_key(
		&secp_ctx,
		&SecretKey::from_slice(&res)
			.expect("Hashes should always be valid keys unless SHA-256 is broken"),
	);
	base_point.combine(&hashkey)
		.expect("Addition only fails if the tweak is the inverse of the key. This is not possible when the tweak contains the hash of the key.")
}

/// Derives a per-commitment-transaction revocation key from its constituent parts.
///
/// Only the cheating participant owns a valid witness to propagate a revoked
/// commitment transaction, thus per_commitment_secret always come from cheater
/// and revocation_base_secret always come from punisher, which is the broadcaster
/// of the transaction spending with this key knowledge.
pub fn derive_private_revocation_key<T: secp256k1::Signing>(
	secp_ctx: &Secp256k1<T>, per_commitment_secret: &SecretKey,
	countersignatory_revocation_base_secret: &SecretKey,
) -> SecretKey {
	let countersignatory_revocation_base_point =
		PublicKey::from_secret_key(&secp_ctx, &countersignatory_revocation_base_secret);
	let per_commitment_point = PublicKey::from_secret_key(&secp_ctx, &per_commitment_secret);

	let rev_append_commit_hash_key =
		sha256_of_pubkeys(&countersignatory_revocation_base_point, &per_commitment_point);
	let commit_append_rev_hash_key =
		sha256_of_pubkeys(&per_commitment_point, &countersignatory_revocation_base_point);

	let countersignatory_contrib = countersignatory_revocation_base_secret
		.clone()
		.mul_tweak(&Scalar::from_be_bytes(rev_append_commit_hash_key).expect("Hashes should always be valid scalars unless SHA-256 is broken"))
		.expect("Multiplying a secret key by a hash is expected to never fail per secp256k1 docs");
	let broadcaster_contrib = per_commitment_secret
		.clone()
		.mul_tweak(&Scalar::from_be_bytes(commit_append_rev_hash_key).expect("Hashes should always be valid scalars unless SHA-256 is broken"))
		.expect("Multiplying a secret key by a hash is expected to never fail per secp256k1 docs");
	countersignatory_contrib.add_tweak(&Scalar::from(broadcaster_contrib))
		.expect("Addition only fails if the tweak is the inverse of the key. This is not possible when the tweak commits to the key.")
}

/// Derives a per-commitment-transaction revocation public key from its constituent parts. This is
/// the public equivalent of derive_private_revocation_key - using only public keys to derive a
/// public key instead of private keys.
///
/// Only the cheating participant owns a valid witness to propagate a revoked
/// commitment transaction, thus per_commitment_point always come from cheater
/// and revocation_base_point always come from punisher, which is the broadcaster
/// of the transaction spending with this key knowledge.
///
/// Note that this is infallible iff we trust that at least one of the two input keys are randomly
/// generated (ie our own).
pub fn derive_public_revocation_key<T: secp256k1::Verification>(
	secp_ctx: &Secp256k1<T>, per_commitment_point: &PublicKey,
	countersignatory_revocation_base_point: &PublicKey,
) -> PublicKey {
	let rev_append_commit_hash_key =
		sha256_of_pubkeys(countersignatory_revocation_base_point, per_commitment_point);
	let commit_append_rev_hash_key =
		sha256_of_pubkeys(per_commitment_point, countersignatory_revocation_base_point);

	let countersignatory_contrib = countersignatory_revocation_base_point
		.clone()
		.mul_tweak(&secp_ctx, &Scalar::from_be_bytes(rev_append_commit_hash_key).expect("Hashes should always be valid scalars unless SHA-256 is broken"))
		.expect("Multiplying a valid public key by a hash is expected to never fail per secp256k1 docs");
	let broadcaster_contrib = per_commitment_point
		.clone()
		.mul_tweak(&secp_ctx, &Scalar::from_be_bytes(commit_append_rev_hash_key).expect("Hashes should always be valid scalars unless SHA-256 is broken"))
		.expect("Multiplying a valid public key by a hash is expected to never fail per secp256k1 docs");
	countersignatory_contrib.combine(&broadcaster_contrib)
		.expect("Addition only fails if the tweak is the inverse of the key. This is not possible when the tweak commits to the key.")
}

/// One counterparty's public keys which do not change over the life of a channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelPublicKeys {
	/// The public key which is used to sign all commitment transactions, as it appears in the
	/// on-chain channel lock-in 2-of-2 multisig output.
	pub funding_pubkey: PublicKey,
	/// The base point which is used (with derive_public_revocation_key) to derive per-commitment
	/// revocation keys. This is combined with the per-commitment-secret generated by the
	/// counterparty to create a secret which the counterparty can reveal to revoke previous
	/// states.
	pub revocation_basepoint: PublicKey,
	/// The public key on which the non-broadcaster (ie the countersignatory) receives an immediately
	/// spendable primary channel balance on the broadcaster's commitment transaction. This key is
	/// static across every commitment transaction.
	pub payment_point: PublicKey,
	/// The base point which is used (with derive_public_key) to derive a per-commitment payment
	/// public key which receives non-HTLC-encumbered funds which are only available for spending
	/// after some delay (or can be claimed via the revocation path).
	pub delayed_payment_basepoint: PublicKey,
	/// The base point which is used (with derive_public_key) to derive a per-commitment public key
	/// which is used to encumber HTLC-in-flight outputs.
	pub htlc_basepoint: PublicKey,
}

/// The set of public keys which are used in the creation of one commitment transaction and the
/// second-stage transactions spending from it.
///
/// A broadcaster key is provided from potential broadcaster of the computed transaction.
/// A countersignatory key is coming from a protocol participant unable to broadcast the
/// transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitmentKeys {
	/// The broadcaster's per-commitment public key which was used to derive the other keys.
	pub per_commitment_point: PublicKey,
	/// The revocation key which is used to allow the broadcaster of the commitment
	/// transaction to provide their counterparty the ability to punish them if they broadcast
	/// an old state.
	pub revocation_key: PublicKey,
	/// Broadcaster's HTLC Key
	pub broadcaster_htlc_key: PublicKey,
	/// Countersignatory's HTLC Key
	pub countersignatory_htlc_key: PublicKey,
	/// Broadcaster's Payment Key (which isn't allowed to be spent from for some delay)
	pub broadcaster_delayed_payment_key: PublicKey,
	/// Countersignatory's payment key, paid to directly on the `to_remote` output. This is the
	/// countersignatory's static [`ChannelPublicKeys::payment_point`].
	pub countersignatory_payment_key: PublicKey,
}

impl CommitmentKeys {
	/// Create per-state keys from channel static keys and the broadcaster's per-commitment point.
	/// Key set is asymmetric and can't be used as part of counter-signatory set of transactions.
	pub fn derive_new<T: secp256k1::Signing + secp256k1::Verification>(
		secp_ctx: &Secp256k1<T>, per_commitment_point: &PublicKey,
		broadcaster_keys: &ChannelPublicKeys, countersignatory_keys: &ChannelPublicKeys,
	) -> CommitmentKeys {
		CommitmentKeys {
			per_commitment_point: per_commitment_point.clone(),
			revocation_key: derive_public_revocation_key(
				&secp_ctx,
				&per_commitment_point,
				&countersignatory_keys.revocation_basepoint,
			),
			broadcaster_htlc_key: derive_public_key(
				&secp_ctx,
				&per_commitment_point,
				&broadcaster_keys.htlc_basepoint,
			),
			countersignatory_htlc_key: derive_public_key(
				&secp_ctx,
				&per_commitment_point,
				&countersignatory_keys.htlc_basepoint,
			),
			broadcaster_delayed_payment_key: derive_public_key(
				&secp_ctx,
				&per_commitment_point,
				&broadcaster_keys.delayed_payment_basepoint,
			),
			countersignatory_payment_key: countersignatory_keys.payment_point,
		}
	}
}

/// Which way an HTLC flows, relative to the broadcaster of the commitment transaction it sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HtlcDirection {
	/// Offered by the broadcaster. Spent by the broadcaster's HTLC-timeout transaction, or by the
	/// countersignatory with the preimage.
	Offered,
	/// Received by the broadcaster. Spent by the broadcaster's HTLC-success transaction, or by the
	/// countersignatory after expiry.
	Received,
}

/// The terms of an HTLC as both parties agreed to them when it was added.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtlcParams {
	/// The HTLC's id, unique per direction over the life of the channel.
	pub id: u64,
	/// The value, in msat, of the HTLC. The value as it appears in the commitment transaction is
	/// this divided by 1000.
	pub amount_msat: u64,
	/// The hash of the preimage which unlocks this HTLC.
	pub payment_hash: PaymentHash,
	/// The CLTV lock-time at which this HTLC expires.
	pub cltv_expiry: u32,
}

/// An HTLC together with its direction on a given commitment transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectedHtlc {
	/// Whether the broadcaster offered or received this HTLC.
	pub direction: HtlcDirection,
	/// The HTLC itself.
	pub add: HtlcParams,
}

impl DirectedHtlc {
	/// Whether the HTLC was offered by the broadcaster.
	pub fn offered(&self) -> bool {
		self.direction == HtlcDirection::Offered
	}
}

/// The maximum length of a script returned by get_revokeable_redeemscript.
// Calculated as 6 bytes of opcodes, 1 byte push plus 2 bytes for contest_delay, and two public
// keys of 33 bytes (+ 1 push).
pub const REVOKEABLE_REDEEMSCRIPT_MAX_LENGTH: usize = 6 + 3 + 34 * 2;

/// A script either spendable by the revocation
/// key or the broadcaster_delayed_payment_key and satisfying the relative-locktime OP_CSV constrain.
/// Encumbering a `to_holder` output on a commitment transaction or 2nd-stage HTLC transactions.
pub fn get_revokeable_redeemscript(
	revocation_key: &PublicKey, contest_delay: u16, broadcaster_delayed_payment_key: &PublicKey,
) -> ScriptBuf {
	let res = Builder::new()
		.push_opcode(opcodes::all::OP_IF)
		.push_slice(&revocation_key.serialize())
		.push_opcode(opcodes::all::OP_ELSE)
		.push_int(contest_delay as i64)
		.push_opcode(opcodes::all::OP_CSV)
		.push_opcode(opcodes::all::OP_DROP)
		.push_slice(&broadcaster_delayed_payment_key.serialize())
		.push_opcode(opcodes::all::OP_ENDIF)
		.push_opcode(opcodes::all::OP_CHECKSIG)
		.into_script();
	debug_assert!(res.len() <= REVOKEABLE_REDEEMSCRIPT_MAX_LENGTH);
	res
}

/// The P2WPKH script paying the countersignatory's balance on a commitment transaction, and the
/// final destination of every claim transaction.
pub fn get_to_remote_script(payment_key: &PublicKey) -> ScriptBuf {
	ScriptBuf::new_p2wpkh(&WPubkeyHash::hash(&payment_key.serialize()))
}

/// The BOLT 3 "offered HTLC output" witness script.
pub fn get_offered_htlc_redeemscript(
	payment_hash: &PaymentHash, broadcaster_htlc_key: &PublicKey,
	countersignatory_htlc_key: &PublicKey, revocation_key: &PublicKey,
) -> ScriptBuf {
	let payment_hash160 = Ripemd160::hash(&payment_hash.0[..]).to_byte_array();
	Builder::new()
		.push_opcode(opcodes::all::OP_DUP)
		.push_opcode(opcodes::all::OP_HASH160)
		.push_slice(&Hash160::hash(&revocation_key.serialize()).to_byte_array())
		.push_opcode(opcodes::all::OP_EQUAL)
		.push_opcode(opcodes::all::OP_IF)
		.push_opcode(opcodes::all::OP_CHECKSIG)
		.push_opcode(opcodes::all::OP_ELSE)
		.push_slice(&countersignatory_htlc_key.serialize())
		.push_opcode(opcodes::all::OP_SWAP)
		.push_opcode(opcodes::all::OP_SIZE)
		.push_int(32)
		.push_opcode(opcodes::all::OP_EQUAL)
		.push_opcode(opcodes::all::OP_NOTIF)
		.push_opcode(opcodes::all::OP_DROP)
		.push_int(2)
		.push_opcode(opcodes::all::OP_SWAP)
		.push_slice(&broadcaster_htlc_key.serialize())
		.push_int(2)
		.push_opcode(opcodes::all::OP_CHECKMULTISIG)
		.push_opcode(opcodes::all::OP_ELSE)
		.push_opcode(opcodes::all::OP_HASH160)
		.push_slice(&payment_hash160)
		.push_opcode(opcodes::all::OP_EQUALVERIFY)
		.push_opcode(opcodes::all::OP_CHECKSIG)
		.push_opcode(opcodes::all::OP_ENDIF)
		.push_opcode(opcodes::all::OP_ENDIF)
		.into_script()
}

/// The BOLT 3 "received HTLC output" witness script.
pub fn get_received_htlc_redeemscript(
	payment_hash: &PaymentHash, cltv_expiry: u32, broadcaster_htlc_key: &PublicKey,
	countersignatory_htlc_key: &PublicKey, revocation_key: &PublicKey,
) -> ScriptBuf {
	let payment_hash160 = Ripemd160::hash(&payment_hash.0[..]).to_byte_array();
	Builder::new()
		.push_opcode(opcodes::all::OP_DUP)
		.push_opcode(opcodes::all::OP_HASH160)
		.push_slice(&Hash160::hash(&revocation_key.serialize()).to_byte_array())
		.push_opcode(opcodes::all::OP_EQUAL)
		.push_opcode(opcodes::all::OP_IF)
		.push_opcode(opcodes::all::OP_CHECKSIG)
		.push_opcode(opcodes::all::OP_ELSE)
		.push_slice(&countersignatory_htlc_key.serialize())
		.push_opcode(opcodes::all::OP_SWAP)
		.push_opcode(opcodes::all::OP_SIZE)
		.push_int(32)
		.push_opcode(opcodes::all::OP_EQUAL)
		.push_opcode(opcodes::all::OP_IF)
		.push_opcode(opcodes::all::OP_HASH160)
		.push_slice(&payment_hash160)
		.push_opcode(opcodes::all::OP_EQUALVERIFY)
		.push_int(2)
		.push_opcode(opcodes::all::OP_SWAP)
		.push_slice(&broadcaster_htlc_key.serialize())
		.push_int(2)
		.push_opcode(opcodes::all::OP_CHECKMULTISIG)
		.push_opcode(opcodes::all::OP_ELSE)
		.push_opcode(opcodes::all::OP_DROP)
		.push_int(cltv_expiry as i64)
		.push_opcode(opcodes::all::OP_CLTV)
		.push_opcode(opcodes::all::OP_DROP)
		.push_opcode(opcodes::all::OP_CHECKSIG)
		.push_opcode(opcodes::all::OP_ENDIF)
		.push_opcode(opcodes::all::OP_ENDIF)
		.into_script()
}

/// Gets the witness redeemscript for an HTLC output in a commitment transaction.
#[inline]
pub fn get_htlc_redeemscript(
	direction: HtlcDirection, htlc: &HtlcParams, keys: &CommitmentKeys,
) -> ScriptBuf {
	match direction {
		HtlcDirection::Offered => get_offered_htlc_redeemscript(
			&htlc.payment_hash,
			&keys.broadcaster_htlc_key,
			&keys.countersignatory_htlc_key,
			&keys.revocation_key,
		),
		HtlcDirection::Received => get_received_htlc_redeemscript(
			&htlc.payment_hash,
			htlc.cltv_expiry,
			&keys.broadcaster_htlc_key,
			&keys.countersignatory_htlc_key,
			&keys.revocation_key,
		),
	}
}

/// Gets the redeemscript for a funding output from the two funding public keys.
/// Note that the order of funding public keys does not matter.
pub fn make_funding_redeemscript(broadcaster: &PublicKey, countersignatory: &PublicKey) -> ScriptBuf {
	let broadcaster_funding_key = broadcaster.serialize();
	let countersignatory_funding_key = countersignatory.serialize();

	let builder = Builder::new().push_opcode(opcodes::all::OP_PUSHNUM_2);
	if broadcaster_funding_key[..] < countersignatory_funding_key[..] {
		builder.push_slice(&broadcaster_funding_key).push_slice(&countersignatory_funding_key)
	} else {
		builder.push_slice(&countersignatory_funding_key).push_slice(&broadcaster_funding_key)
	}
	.push_opcode(opcodes::all::OP_PUSHNUM_2)
	.push_opcode(opcodes::all::OP_CHECKMULTISIG)
	.into_script()
}

/// Returns the witness spending the 2-of-2 funding output. Signatures are placed in the order of
/// their keys in [`make_funding_redeemscript`], as OP_CHECKMULTISIG requires.
pub fn build_funding_witness(
	local_funding_key: &PublicKey, remote_funding_key: &PublicKey, local_sig: &Signature,
	remote_sig: &Signature, funding_redeemscript: &Script,
) -> Witness {
	let mut witness = Witness::new();
	// First push the multisig dummy, note that due to BIP147 (NULLDUMMY) it must be a zero-length element.
	witness.push(Vec::new());
	if local_funding_key.serialize()[..] < remote_funding_key.serialize()[..] {
		witness.push_ecdsa_signature(&BitcoinSignature::sighash_all(*local_sig));
		witness.push_ecdsa_signature(&BitcoinSignature::sighash_all(*remote_sig));
	} else {
		witness.push_ecdsa_signature(&BitcoinSignature::sighash_all(*remote_sig));
		witness.push_ecdsa_signature(&BitcoinSignature::sighash_all(*local_sig));
	}
	witness.push(funding_redeemscript.as_bytes());
	witness
}

/// Returns the witness required to satisfy and spend a HTLC input from the broadcaster's own
/// HTLC-timeout (no preimage) or HTLC-success (with preimage) transaction.
pub fn build_htlc_input_witness(
	local_sig: &Signature, remote_sig: &Signature, preimage: &Option<PaymentPreimage>,
	redeem_script: &Script,
) -> Witness {
	let mut witness = Witness::new();
	// First push the multisig dummy, note that due to BIP147 (NULLDUMMY) it must be a zero-length element.
	witness.push(Vec::new());
	witness.push_ecdsa_signature(&BitcoinSignature::sighash_all(*remote_sig));
	witness.push_ecdsa_signature(&BitcoinSignature::sighash_all(*local_sig));
	if let Some(preimage) = preimage {
		witness.push(preimage.0.to_vec());
	} else {
		// Due to BIP146 (MINIMALIF) this must be a zero-length element to relay.
		witness.push(Vec::new());
	}
	witness.push(redeem_script.as_bytes());
	witness
}

/// Returns the witness with which the countersignatory spends an HTLC output of the
/// broadcaster's commitment directly: with the preimage for an offered HTLC, or with an empty
/// element after expiry for a received one.
pub fn build_claim_htlc_witness(
	sig: &Signature, preimage: &Option<PaymentPreimage>, redeem_script: &Script,
) -> Witness {
	let mut witness = Witness::new();
	witness.push_ecdsa_signature(&BitcoinSignature::sighash_all(*sig));
	if let Some(preimage) = preimage {
		witness.push(preimage.0.to_vec());
	} else {
		witness.push(Vec::new());
	}
	witness.push(redeem_script.as_bytes());
	witness
}

/// Returns the witness spending a revokeable output through its delayed branch, once
/// `contest_delay` blocks have passed.
pub fn build_revokeable_delayed_witness(sig: &Signature, redeem_script: &Script) -> Witness {
	let mut witness = Witness::new();
	witness.push_ecdsa_signature(&BitcoinSignature::sighash_all(*sig));
	// An empty element takes the OP_ELSE branch; MINIMALIF forbids anything else.
	witness.push(Vec::new());
	witness.push(redeem_script.as_bytes());
	witness
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::util::test_utils::TestChannel;
	use bitcoin::hex::FromHex;
	use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};

	#[test]
	fn test_key_derivation() {
		// Test vectors from BOLT 3 Appendix E:
		let secp_ctx = Secp256k1::new();

		let base_secret = SecretKey::from_slice(&<Vec<u8>>::from_hex("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f").unwrap()[..]).unwrap();
		let per_commitment_secret = SecretKey::from_slice(&<Vec<u8>>::from_hex("1f1e1d1c1b1a191817161514131211100f0e0d0c0b0a09080706050403020100").unwrap()[..]).unwrap();

		let base_point = PublicKey::from_secret_key(&secp_ctx, &base_secret);
		assert_eq!(base_point.serialize()[..], <Vec<u8>>::from_hex("036d6caac248af96f6afa7f904f550253a0f3ef3f5aa2fe6838a95b216691468e2").unwrap()[..]);

		let per_commitment_point = PublicKey::from_secret_key(&secp_ctx, &per_commitment_secret);
		assert_eq!(per_commitment_point.serialize()[..], <Vec<u8>>::from_hex("025f7117a78150fe2ef97db7cfc83bd57b2e2c0d0dd25eaf467a4a1c2a45ce1486").unwrap()[..]);

		assert_eq!(derive_public_key(&secp_ctx, &per_commitment_point, &base_point).serialize()[..],
				<Vec<u8>>::from_hex("0235f2dbfaa89b57ec7b055afe29849ef7ddfeb1cefdb9ebdc43f5494984db29e5").unwrap()[..]);

		assert_eq!(derive_private_key(&secp_ctx, &per_commitment_point, &base_secret),
				SecretKey::from_slice(&<Vec<u8>>::from_hex("cbced912d3b21bf196a766651e436aff192362621ce317704ea2f75d87e7be0f").unwrap()[..]).unwrap());

		assert_eq!(derive_public_revocation_key(&secp_ctx, &per_commitment_point, &base_point).serialize()[..],
				<Vec<u8>>::from_hex("02916e326636d19c33f13e8c0c3a03dd157f332f3e99c317c141dd865eb01f8ff0").unwrap()[..]);

		assert_eq!(derive_private_revocation_key(&secp_ctx, &per_commitment_secret, &base_secret),
				SecretKey::from_slice(&<Vec<u8>>::from_hex("d09ffff62ddb2297ab000cc85bcb4283fdeb6aa052affbc9dddcf33b61078110").unwrap()[..]).unwrap());
	}

	#[test]
	fn test_commitment_keys_match_private_derivation() {
		let chan = TestChannel::new();
		let keys = chan.local_commitment_keys();
		let secp_ctx = &chan.secp_ctx;
		let point = &keys.per_commitment_point;

		let htlc_secret = derive_private_key(secp_ctx, point, &chan.local.htlc_base_key);
		assert_eq!(PublicKey::from_secret_key(secp_ctx, &htlc_secret), keys.broadcaster_htlc_key);
		let remote_htlc_secret = derive_private_key(secp_ctx, point, &chan.remote.htlc_base_key);
		assert_eq!(PublicKey::from_secret_key(secp_ctx, &remote_htlc_secret), keys.countersignatory_htlc_key);
		let delayed_secret = derive_private_key(secp_ctx, point, &chan.local.delayed_payment_base_key);
		assert_eq!(PublicKey::from_secret_key(secp_ctx, &delayed_secret), keys.broadcaster_delayed_payment_key);
		let revocation_secret = derive_private_revocation_key(secp_ctx, &chan.local_per_commitment_secret, &chan.remote.revocation_base_key);
		assert_eq!(PublicKey::from_secret_key(secp_ctx, &revocation_secret), keys.revocation_key);
		assert_eq!(keys.countersignatory_payment_key, chan.remote_pubkeys().payment_point);
	}

	#[test]
	fn test_funding_redeemscript_is_key_order_independent() {
		let chan = TestChannel::new();
		let local = chan.local_pubkeys().funding_pubkey;
		let remote = chan.remote_pubkeys().funding_pubkey;
		let script = make_funding_redeemscript(&local, &remote);
		assert_eq!(script, make_funding_redeemscript(&remote, &local));
		// OP_2 <33> <33> OP_2 OP_CHECKMULTISIG
		assert_eq!(script.len(), 1 + 34 * 2 + 2);
		let bytes = script.as_bytes();
		assert_eq!((bytes[0], bytes[69], bytes[70]), (0x52, 0x52, 0xae));
	}

	#[test]
	fn test_script_lengths() {
		let chan = TestChannel::new();
		let keys = chan.local_commitment_keys();
		let htlc = HtlcParams { id: 0, amount_msat: 1_000_000, payment_hash: PaymentHash([0x42; 32]), cltv_expiry: 500_000 };
		let revokeable = get_revokeable_redeemscript(&keys.revocation_key, 144, &keys.broadcaster_delayed_payment_key);
		assert!(revokeable.len() <= REVOKEABLE_REDEEMSCRIPT_MAX_LENGTH);
		// BOLT 3: offered HTLC scripts are always 133 bytes, received ones 138 or 139 depending on
		// the encoding of the expiry.
		assert_eq!(get_htlc_redeemscript(HtlcDirection::Offered, &htlc, &keys).len(), 133);
		assert_eq!(get_htlc_redeemscript(HtlcDirection::Received, &htlc, &keys).len(), 139);
		assert_eq!(get_to_remote_script(&keys.countersignatory_payment_key).len(), 22);
	}

	#[test]
	fn test_witness_shapes() {
		let chan = TestChannel::new();
		let secp_ctx = &chan.secp_ctx;
		let msg = bitcoin::secp256k1::Message::from_digest([1; 32]);
		let sig_a = crate::util::crypto::sign(secp_ctx, &msg, &chan.local.funding_key);
		let sig_b = crate::util::crypto::sign(secp_ctx, &msg, &chan.remote.funding_key);
		let key_a = chan.local_pubkeys().funding_pubkey;
		let key_b = chan.remote_pubkeys().funding_pubkey;
		let script = make_funding_redeemscript(&key_a, &key_b);

		let witness_ab = build_funding_witness(&key_a, &key_b, &sig_a, &sig_b, &script);
		let witness_ba = build_funding_witness(&key_b, &key_a, &sig_b, &sig_a, &script);
		assert_eq!(witness_ab, witness_ba);
		assert_eq!(witness_ab.len(), 4);
		assert!(witness_ab.nth(0).unwrap().is_empty());

		let preimage = PaymentPreimage([7; 32]);
		let witness = build_htlc_input_witness(&sig_a, &sig_b, &Some(preimage), &script);
		assert_eq!(witness.len(), 5);
		assert_eq!(witness.nth(3).unwrap(), &preimage.0[..]);
		let witness = build_htlc_input_witness(&sig_a, &sig_b, &None, &script);
		assert!(witness.nth(3).unwrap().is_empty());

		let witness = build_claim_htlc_witness(&sig_a, &None, &script);
		assert_eq!(witness.len(), 3);
		assert!(witness.nth(1).unwrap().is_empty());
		let witness = build_revokeable_delayed_witness(&sig_a, &script);
		assert_eq!(witness.len(), 3);
		assert_eq!(witness.last().unwrap(), script.as_bytes());
	}
}
