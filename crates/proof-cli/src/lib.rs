//! Command-line front end for the proof pipeline: re-exports the library
//! crates under short names and hosts the `clap` command tree in [`cli`].

#![forbid(unsafe_code)]

pub mod cli;

pub use proof_bundle as bundle;
pub use proof_canon as canon;
pub use proof_capsule as capsule;
pub use proof_context as context;
pub use proof_crypto as crypto;
pub use proof_ledger as ledger;
pub use proof_tvoc as tvoc;
pub use proof_types as types;
