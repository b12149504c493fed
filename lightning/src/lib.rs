// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Construction of the on-chain transactions of a Lightning channel.
//!
//! Given the channel state and the keys of a commitment, this crate builds the commitment
//! transaction, the HTLC-timeout and HTLC-success transactions spending its HTLC outputs, and
//! the claim transactions sweeping HTLC outputs to a key of our own. Every transaction is built
//! deterministically, so that both channel parties derive byte-identical transactions and can
//! exchange signatures for them.
//!
//! Fee rates are an input: this crate does not estimate fees, watch the chain, talk to peers or
//! persist anything. The channel state machine driving it lives elsewhere.
//!
//! The main entry points are [`ln::commitment::build_commitment_tx`],
//! [`ln::htlc_tx::build_htlc_txs`] and the builders in [`ln::claim_tx`], with signatures
//! produced and checked through [`sign`].

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

extern crate bitcoin;
#[cfg(test)]
extern crate regex;

#[macro_use]
pub mod util;
pub mod ln;
pub mod sign;
