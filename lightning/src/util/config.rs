// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Per-commitment transaction parameters which the channel state machine negotiates with the
//! counterparty and hands to the transaction builders.

/// The default number of blocks the broadcaster of a commitment transaction must wait before
/// claiming its own funds. One day's worth of blocks.
pub const BREAKDOWN_TIMEOUT: u16 = 6 * 24;

/// The dust limit below which P2WSH outputs are non-standard under Bitcoin Core's default relay
/// policy.
pub const DEFAULT_DUST_LIMIT_SATOSHIS: u64 = 546;

/// Parameters which apply to the commitment transaction of one side of a channel, and to every
/// second-stage transaction spending from it.
///
/// Both values are chosen per side: the dust limit is the broadcaster's own, while
/// `to_self_delay` is the delay the countersignatory demanded of the broadcaster.
///
/// Default::default() provides sane defaults.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelTxConfig {
	/// Outputs (and HTLCs, once their second-stage fee is paid) whose value does not exceed this
	/// limit are omitted from the commitment transaction and their value goes to fees.
	///
	/// Default value: [`DEFAULT_DUST_LIMIT_SATOSHIS`].
	pub dust_limit_satoshis: u64,
	/// The relative locktime, in blocks, on the broadcaster's `to_local` output and on the outputs
	/// of its HTLC-timeout and HTLC-success transactions.
	///
	/// This is the window the countersignatory has to punish a revoked commitment. Asking for too
	/// high a delay freezes funds for nothing in case of an honest unilateral close.
	///
	/// Default value: [`BREAKDOWN_TIMEOUT`].
	pub to_self_delay: u16,
}

impl Default for ChannelTxConfig {
	fn default() -> Self {
		ChannelTxConfig {
			dust_limit_satoshis: DEFAULT_DUST_LIMIT_SATOSHIS,
			to_self_delay: BREAKDOWN_TIMEOUT,
		}
	}
}
