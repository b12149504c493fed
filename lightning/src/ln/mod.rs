// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The channel transactions: commitment, second-stage HTLC and claim transactions, the fees
//! they pay and the scripts they use.

pub mod chan_utils;
pub mod claim_tx;
pub mod commitment;
pub mod fees;
pub mod htlc_tx;
pub mod transactions;
pub mod types;

pub use self::types::{PaymentHash, PaymentPreimage};
