//! Primitive wire codecs layered on [`ByteBuffer`].
//!
//! Each submodule adds its `push_*`/`get_*` pair to the buffer through an
//! inherent `impl` block, so callers only ever hold a `ByteBuffer`.

pub mod bignum;
pub mod buffer;
pub mod currency;
pub mod name;
pub mod time;

pub use bignum::{UINT128_SIZE, binary_to_decimal, decimal_to_binary};
pub use buffer::ByteBuffer;
pub use currency::{Asset, Symbol};
pub use name::{Name, decode_name, encode_name};
pub use time::TimePointSec;
