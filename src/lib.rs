//! An in-memory ordered key-value store backed by a left-leaning
//! red-black tree ([`llrb::Llrb`]), plus an MVCC variant
//! ([`mvcc::Mvcc`]) giving single-writer, multi-reader snapshot
//! isolation through copy-on-write path copying.
//!
//! Every tree is generic over a [`key::Key`] type and shares the
//! [`traits::Reader`]/[`traits::Writer`] contract, which the reference
//! [`dict::Dict`] oracle and the [`harness`] validation runner also
//! implement, so a tree's behavior can be cross-checked against a
//! trivial `HashMap`-backed implementation.

pub mod avgvar;
pub mod dict;
pub mod error;
pub mod harness;
pub mod key;
pub mod llrb;
pub mod mvcc;
mod mvcc_node;
mod node;
pub mod traits;

pub use crate::error::{Error, Result};
pub use crate::key::{inf, Bound, Key};
pub use crate::node::Entry;
pub use crate::traits::{Inclusion, Reader, Writer};
