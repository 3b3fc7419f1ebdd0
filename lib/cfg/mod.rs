//! Functions and basic blocks recovered from machine code.
//!
//! These are thin. A `Block` is an ordered set of instruction
//! addresses, a `Function` is an ordered set of blocks. Everything else known
//! about those addresses, such as the decoded instructions themselves, lives in
//! the [`TaggedStore`](crate::store::TaggedStore).

mod block;
mod function;

pub use self::block::Block;
pub use self::function::Function;
