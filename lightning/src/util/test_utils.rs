// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

use crate::ln::chan_utils::{
	self, make_funding_redeemscript, ChannelPublicKeys, CommitmentKeys, DirectedHtlc,
	HtlcDirection, HtlcParams,
};
use crate::ln::transactions::InputInfo;
use crate::ln::{PaymentHash, PaymentPreimage};
use crate::util::config::ChannelTxConfig;
use crate::util::logger::{Logger, Record};

use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{All, PublicKey, Secp256k1, SecretKey};
use bitcoin::transaction::{OutPoint, TxOut};
use bitcoin::{Amount, Txid};

use std::collections::HashMap;
use std::sync::Mutex;

pub struct TestLogger {
	pub lines: Mutex<HashMap<(String, String), usize>>,
	pub context: Mutex<HashMap<(String, Option<Txid>, Option<PaymentHash>), usize>>,
}

impl TestLogger {
	pub fn new() -> TestLogger {
		TestLogger { lines: Mutex::new(HashMap::new()), context: Mutex::new(HashMap::new()) }
	}

	/// Search for the number of occurrence of the logged lines which
	/// 1. belongs to the specified module and
	/// 2. contains `line` in it.
	/// And asserts if the number of occurrences is the same with the given `count`
	pub fn assert_log_contains(&self, module: &str, line: &str, count: usize) {
		let log_entries = self.lines.lock().unwrap();
		let l: usize = log_entries
			.iter()
			.filter(|&(&(ref m, ref l), _c)| m == module && l.contains(line))
			.map(|(_, c)| c)
			.sum();
		assert_eq!(l, count)
	}

	/// Search for the number of occurrences of logged lines which
	/// 1. belong to the specified module and
	/// 2. match the given regex pattern.
	/// Assert that the number of occurrences equals the given `count`
	pub fn assert_log_regex(&self, module: &str, pattern: regex::Regex, count: usize) {
		let log_entries = self.lines.lock().unwrap();
		let l: usize = log_entries
			.iter()
			.filter(|&(&(ref m, ref l), _c)| m == module && pattern.is_match(&l))
			.map(|(_, c)| c)
			.sum();
		assert_eq!(l, count)
	}

	pub fn assert_log_context_contains(
		&self, module: &str, commitment_txid: Option<Txid>, payment_hash: Option<PaymentHash>,
		count: usize,
	) {
		let context_entries = self.context.lock().unwrap();
		let l = context_entries
			.get(&(module.to_string(), commitment_txid, payment_hash))
			.unwrap_or(&0);
		assert_eq!(*l, count)
	}
}

impl Logger for TestLogger {
	fn log(&self, record: Record) {
		let context = (record.module_path.to_string(), record.commitment_txid, record.payment_hash);
		*self
			.lines
			.lock()
			.unwrap()
			.entry((record.module_path.to_string(), format!("{}", record.args)))
			.or_insert(0) += 1;
		*self.context.lock().unwrap().entry(context).or_insert(0) += 1;
		println!("{}", record);
	}
}

/// The static secrets of one side of a test channel.
pub struct TestChannelKeys {
	pub funding_key: SecretKey,
	pub revocation_base_key: SecretKey,
	pub payment_key: SecretKey,
	pub delayed_payment_base_key: SecretKey,
	pub htlc_base_key: SecretKey,
}

impl TestChannelKeys {
	pub fn from_seed(seed: u8) -> Self {
		TestChannelKeys {
			funding_key: SecretKey::from_slice(&[seed; 32]).unwrap(),
			revocation_base_key: SecretKey::from_slice(&[seed + 1; 32]).unwrap(),
			payment_key: SecretKey::from_slice(&[seed + 2; 32]).unwrap(),
			delayed_payment_base_key: SecretKey::from_slice(&[seed + 3; 32]).unwrap(),
			htlc_base_key: SecretKey::from_slice(&[seed + 4; 32]).unwrap(),
		}
	}

	pub fn pubkeys(&self, secp_ctx: &Secp256k1<All>) -> ChannelPublicKeys {
		ChannelPublicKeys {
			funding_pubkey: PublicKey::from_secret_key(secp_ctx, &self.funding_key),
			revocation_basepoint: PublicKey::from_secret_key(secp_ctx, &self.revocation_base_key),
			payment_point: PublicKey::from_secret_key(secp_ctx, &self.payment_key),
			delayed_payment_basepoint: PublicKey::from_secret_key(
				secp_ctx,
				&self.delayed_payment_base_key,
			),
			htlc_basepoint: PublicKey::from_secret_key(secp_ctx, &self.htlc_base_key),
		}
	}
}

/// Both sides of a channel, with one per-commitment secret each, so tests can build and sign
/// either side's commitment and every transaction spending from it.
pub struct TestChannel {
	pub secp_ctx: Secp256k1<All>,
	pub local: TestChannelKeys,
	pub remote: TestChannelKeys,
	pub local_per_commitment_secret: SecretKey,
	pub remote_per_commitment_secret: SecretKey,
	pub config: ChannelTxConfig,
}

impl TestChannel {
	pub fn new() -> Self {
		TestChannel {
			secp_ctx: Secp256k1::new(),
			local: TestChannelKeys::from_seed(0x10),
			remote: TestChannelKeys::from_seed(0x20),
			local_per_commitment_secret: SecretKey::from_slice(&[0x31; 32]).unwrap(),
			remote_per_commitment_secret: SecretKey::from_slice(&[0x41; 32]).unwrap(),
			config: ChannelTxConfig::default(),
		}
	}

	pub fn local_pubkeys(&self) -> ChannelPublicKeys {
		self.local.pubkeys(&self.secp_ctx)
	}

	pub fn remote_pubkeys(&self) -> ChannelPublicKeys {
		self.remote.pubkeys(&self.secp_ctx)
	}

	pub fn local_per_commitment_point(&self) -> PublicKey {
		PublicKey::from_secret_key(&self.secp_ctx, &self.local_per_commitment_secret)
	}

	pub fn remote_per_commitment_point(&self) -> PublicKey {
		PublicKey::from_secret_key(&self.secp_ctx, &self.remote_per_commitment_secret)
	}

	/// Keys of our own commitment transaction, we are the broadcaster.
	pub fn local_commitment_keys(&self) -> CommitmentKeys {
		CommitmentKeys::derive_new(
			&self.secp_ctx,
			&self.local_per_commitment_point(),
			&self.local_pubkeys(),
			&self.remote_pubkeys(),
		)
	}

	/// Keys of the counterparty's commitment transaction, they are the broadcaster.
	pub fn remote_commitment_keys(&self) -> CommitmentKeys {
		CommitmentKeys::derive_new(
			&self.secp_ctx,
			&self.remote_per_commitment_point(),
			&self.remote_pubkeys(),
			&self.local_pubkeys(),
		)
	}

	pub fn funding_input(&self, channel_value_satoshis: u64) -> InputInfo {
		let redeem_script = make_funding_redeemscript(
			&self.local_pubkeys().funding_pubkey,
			&self.remote_pubkeys().funding_pubkey,
		);
		let txout = TxOut {
			value: Amount::from_sat(channel_value_satoshis),
			script_pubkey: redeem_script.to_p2wsh(),
		};
		let outpoint = OutPoint { txid: Txid::from_byte_array([0xaa; 32]), vout: 1 };
		InputInfo::new(outpoint, txout, redeem_script).unwrap()
	}

	/// Derives the per-commitment private key for `base_secret` on the commitment whose
	/// per-commitment point is `per_commitment_point`.
	pub fn derive_key(&self, per_commitment_point: &PublicKey, base_secret: &SecretKey) -> SecretKey {
		chan_utils::derive_private_key(&self.secp_ctx, per_commitment_point, base_secret)
	}
}

pub fn payment_preimage(seed: u8) -> PaymentPreimage {
	PaymentPreimage([seed; 32])
}

pub fn directed_htlc(
	id: u64, direction: HtlcDirection, amount_msat: u64, preimage_seed: u8, cltv_expiry: u32,
) -> DirectedHtlc {
	DirectedHtlc {
		direction,
		add: HtlcParams {
			id,
			amount_msat,
			payment_hash: payment_preimage(preimage_seed).payment_hash(),
			cltv_expiry,
		},
	}
}
