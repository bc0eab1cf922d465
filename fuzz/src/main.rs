//! AFL harness decoding arbitrary bytes as a packed transaction.
//!
//! Decoding must fail with an error rather than panic or allocate without
//! bound, whatever the input. The provider includes the `edgecases` contract,
//! whose arrays of empty records cost nothing on the wire.

use eoswire::PackedTransaction;
use test_util::abi_provider;

fn main() {
    let provider = abi_provider();
    afl::fuzz!(|data: &[u8]| {
        let envelope = PackedTransaction {
            packed_trx: data.to_vec(),
            ..PackedTransaction::default()
        };
        drop(envelope.decode(&provider));
    });
}
