//! # Engine Layer
//!
//! Everything that touches the embedded interpreter.

pub mod convert;
pub mod interpreter;
pub mod trace;

pub use interpreter::ScriptSandbox;
pub use trace::LogBuffer;
