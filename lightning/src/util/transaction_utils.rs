// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

use bitcoin::transaction::TxOut;

use core::cmp::Ordering;

/// Sorts outputs in BIP 69 order (value, then script_pubkey bytes), calling `tie_breaker` on the
/// attached data for outputs which are otherwise identical.
pub fn sort_outputs<T, C: Fn(&T, &T) -> Ordering>(outputs: &mut Vec<(TxOut, T)>, tie_breaker: C) {
	outputs.sort_unstable_by(|a, b| {
		a.0.value.cmp(&b.0.value).then_with(|| {
			a.0.script_pubkey
				.as_bytes()
				.cmp(b.0.script_pubkey.as_bytes())
				.then_with(|| tie_breaker(&a.1, &b.1))
		})
	});
}
