//! Choice-point operators
//!
//! Identity resolution for choice sites, per-run trace recording and the
//! `Ops` handle through which generator bodies make their choices.

pub mod info;
pub mod runtime;
pub mod trace;
pub mod value;

pub use info::{OpInfo, Sid};
pub use runtime::{Ops, SelectOptions, SELECT};
pub use trace::{GeneratorTrace, OpTrace};
pub use value::Value;
