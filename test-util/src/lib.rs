//! Shared fixtures for eoswire tests.
//!
//! The string constants are safe to use from the main crate's unit tests.
//! The typed fixtures link against `eoswire` as a regular dependency, so
//! only integration tests, the fuzz target and other crates should call them.

mod fixtures;

pub use fixtures::{abi_provider, bitsflea_abi, edge_abi, eosio_abi, token_abi};

/// System contract subset: `newaccount` over the built-in `authority`.
pub const EOSIO_ABI: &str = r#"{
    "version": "eosio::abi/1.1",
    "types": [{"new_type_name": "account_name", "type": "name"}],
    "structs": [
        {"name": "newaccount", "base": "", "fields": [
            {"name": "creator", "type": "account_name"},
            {"name": "newact", "type": "account_name"},
            {"name": "owner", "type": "authority"},
            {"name": "active", "type": "authority"}
        ]}
    ],
    "actions": [{"name": "newaccount", "type": "newaccount", "ricardian_contract": ""}]
}"#;

/// Token contract subset with only `transfer`.
pub const TOKEN_ABI: &str = r#"{
    "version": "eosio::abi/1.1",
    "types": [{"new_type_name": "account_name", "type": "name"}],
    "structs": [
        {"name": "transfer", "base": "", "fields": [
            {"name": "from", "type": "account_name"},
            {"name": "to", "type": "account_name"},
            {"name": "quantity", "type": "asset"},
            {"name": "memo", "type": "string"}
        ]}
    ],
    "actions": [{"name": "transfer", "type": "transfer", "ricardian_contract": ""}]
}"#;

/// Marketplace contract with a nested `publish` action.
pub const BITSFLEA_ABI: &str = r#"{
    "version": "eosio::abi/1.1",
    "structs": [
        {"name": "product", "base": "", "fields": [
            {"name": "pid", "type": "uint32"},
            {"name": "uid", "type": "uint64"},
            {"name": "title", "type": "string"},
            {"name": "description", "type": "string"},
            {"name": "photos", "type": "string[]"},
            {"name": "category", "type": "uint64"},
            {"name": "status", "type": "uint32"},
            {"name": "is_new", "type": "bool"},
            {"name": "is_returns", "type": "bool"},
            {"name": "reviewer", "type": "uint64"},
            {"name": "sale_method", "type": "uint8"},
            {"name": "price", "type": "asset"},
            {"name": "transaction_method", "type": "uint8"},
            {"name": "stock_count", "type": "uint32"},
            {"name": "is_retail", "type": "bool"},
            {"name": "postage", "type": "asset"},
            {"name": "position", "type": "string"},
            {"name": "release_time", "type": "time_point_sec"}
        ]},
        {"name": "pro_auction", "base": "", "fields": [
            {"name": "id", "type": "uint64"}
        ]},
        {"name": "publish", "base": "", "fields": [
            {"name": "uid", "type": "uint64"},
            {"name": "product", "type": "product"},
            {"name": "pa", "type": "pro_auction"}
        ]}
    ],
    "actions": [{"name": "publish", "type": "publish", "ricardian_contract": ""}]
}"#;

/// Contract whose `hold` action carries an array of empty records and
/// trailing binary extensions, the shapes that cost nothing on the wire.
pub const EDGE_ABI: &str = r#"{
    "version": "eosio::abi/1.2",
    "structs": [
        {"name": "empty", "base": "", "fields": []},
        {"name": "hold", "base": "", "fields": [
            {"name": "items", "type": "empty[]"},
            {"name": "tag", "type": "uint8$"},
            {"name": "note", "type": "string$"}
        ]}
    ],
    "actions": [{"name": "hold", "type": "hold", "ricardian_contract": ""}]
}"#;

/// Public key in the legacy `EOS` form.
pub const LEGACY_KEY: &str = "EOS5BiYrPwXwFmrjLQ3ZUa3BX9crdomJNfYdu6uC863XAXrHNyWbo";

/// [`LEGACY_KEY`] in the typed `PUB_K1_` form.
pub const TYPED_KEY: &str = "PUB_K1_5BiYrPwXwFmrjLQ3ZUa3BX9crdomJNfYdu6uC863XAXrJJkRbz";

/// `newaccount` data for `n1h3qsftu5bm` created by `bitsfleamain`, with
/// [`LEGACY_KEY`] as the single owner and active key.
pub const NEWACCOUNT_HEX: &str = concat!(
    "309d9146c585b33b204fd179613b5a98",
    "01000000010002271e00bde7ea56bfa78210ebb026ec9e16d6d02948880e7a39589b62ba418634",
    "0100000001000000010002271e00bde7ea56bfa78210ebb026ec9e16d6d02948880e7a39589b62ba418634",
    "01000000",
);

/// `publish` data matching [`PUBLISH_JSON`].
pub const PUBLISH_HEX: &str = concat!(
    "0000000000000000000000000000000000000000",
    "0a7469746c652074657374",
    "126465736372697074696f6e20e6b58be8af95",
    "010d70686f746f7320e6b58be8af95",
    "01000000000000000000000000010000000000000000",
    "0040420f000000000004424f5300000000",
    "010100000000",
    "102700000000000004424f5300000000",
    "06e4bd8de7bdae",
    "80ed245e",
    "00",
);

/// `publish` action data with an absent auction.
pub const PUBLISH_JSON: &str = r#"{
    "uid": 0,
    "product": {
        "pid": 0, "uid": 0,
        "title": "title test", "description": "description 测试", "photos": ["photos 测试"],
        "category": 1, "status": 0, "is_new": false, "is_returns": true, "reviewer": 0,
        "sale_method": 0, "price": "100.0000 BOS", "transaction_method": 1,
        "stock_count": 1, "is_retail": false, "postage": "1.0000 BOS",
        "position": "位置", "release_time": "2020-01-20T00:00:00"
    },
    "pa": null
}"#;
