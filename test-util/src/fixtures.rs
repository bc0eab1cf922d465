//! rstest fixtures over the reference ABIs.

use eoswire::{AbiDefinition, StaticAbiProvider};
use rstest::fixture;

use crate::{BITSFLEA_ABI, EDGE_ABI, EOSIO_ABI, TOKEN_ABI};

/// # Panics
/// Panics if a fixture constant is not valid ABI JSON.
fn parse(json: &str) -> AbiDefinition { AbiDefinition::from_json(json).expect("fixture abi") }

/// [`EOSIO_ABI`] parsed.
#[fixture]
pub fn eosio_abi() -> AbiDefinition { parse(EOSIO_ABI) }

/// [`TOKEN_ABI`] parsed.
#[fixture]
pub fn token_abi() -> AbiDefinition { parse(TOKEN_ABI) }

/// [`BITSFLEA_ABI`] parsed.
#[fixture]
pub fn bitsflea_abi() -> AbiDefinition { parse(BITSFLEA_ABI) }

/// [`EDGE_ABI`] parsed.
#[fixture]
pub fn edge_abi() -> AbiDefinition { parse(EDGE_ABI) }

/// Provider serving `eosio`, `eosio.token`, `bitsfleamain` and `edgecases`.
#[fixture]
pub fn abi_provider() -> StaticAbiProvider {
    StaticAbiProvider::new()
        .with_abi("eosio", eosio_abi())
        .with_abi("eosio.token", token_abi())
        .with_abi("bitsfleamain", bitsflea_abi())
        .with_abi("edgecases", edge_abi())
}
