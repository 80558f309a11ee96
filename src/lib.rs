#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Errors reported by fallible table operations.
pub mod error;

pub mod hash_table;

/// The DJB2 key hasher and hash builders accepted by the table.
pub mod hasher;

pub use error::TableError;
pub use hash_table::HashTable;
