//! # Driving Ports (API - Inbound)
//!
//! The codec pipeline drives payload functions through `ScriptRunner`.
//! Implementors provide the untyped `run`; the role helpers apply argument
//! layout and output shape checks on top of it.

use crate::domain::entities::{Execution, FunctionRole};
use crate::domain::shape::{bytes_to_value, expect_bytes, expect_fields, expect_verdict};
use crate::engine::ScriptSandbox;
use crate::errors::{SandboxError, SandboxFailure};
use serde_json::Value;
use shared_types::Fields;

/// Runs payload functions of a given role.
///
/// Synchronous: a run blocks for at most the configured timeout. Async
/// callers should move it onto a blocking thread.
pub trait ScriptRunner: Send + Sync {
    /// Calls `role`'s function defined in `source` with `args`.
    fn run(
        &self,
        source: &str,
        role: FunctionRole,
        args: Vec<Value>,
    ) -> Result<Execution<Value>, SandboxFailure>;

    /// `Decoder(bytes, port)`, must return an object.
    fn decode(
        &self,
        source: &str,
        payload: &[u8],
        port: u8,
    ) -> Result<Execution<Fields>, SandboxFailure> {
        let exec = self.run(
            source,
            FunctionRole::Decoder,
            vec![bytes_to_value(payload), Value::from(port)],
        )?;
        shaped(exec, expect_fields)
    }

    /// `Converter(fields, port)`, must return an object.
    fn convert(
        &self,
        source: &str,
        fields: Fields,
        port: u8,
    ) -> Result<Execution<Fields>, SandboxFailure> {
        let exec = self.run(
            source,
            FunctionRole::Converter,
            vec![Value::Object(fields), Value::from(port)],
        )?;
        shaped(exec, expect_fields)
    }

    /// `Validator(fields, port)`, must return a boolean.
    fn validate(
        &self,
        source: &str,
        fields: Fields,
        port: u8,
    ) -> Result<Execution<bool>, SandboxFailure> {
        let exec = self.run(
            source,
            FunctionRole::Validator,
            vec![Value::Object(fields), Value::from(port)],
        )?;
        shaped(exec, expect_verdict)
    }

    /// `Encoder(fields, port)`, must return an array of bytes.
    fn encode(
        &self,
        source: &str,
        fields: Fields,
        port: u8,
    ) -> Result<Execution<Vec<u8>>, SandboxFailure> {
        let exec = self.run(
            source,
            FunctionRole::Encoder,
            vec![Value::Object(fields), Value::from(port)],
        )?;
        shaped(exec, expect_bytes)
    }
}

impl ScriptRunner for ScriptSandbox {
    fn run(
        &self,
        source: &str,
        role: FunctionRole,
        args: Vec<Value>,
    ) -> Result<Execution<Value>, SandboxFailure> {
        self.execute(source, role.function_name(), role.log_label(), args)
    }
}

/// Applies a shape check, keeping the run's logs on mismatch.
fn shaped<T>(
    exec: Execution<Value>,
    check: fn(Value) -> Result<T, SandboxError>,
) -> Result<Execution<T>, SandboxFailure> {
    let Execution {
        output,
        logs,
        elapsed,
    } = exec;

    match check(output) {
        Ok(output) => Ok(Execution {
            output,
            logs,
            elapsed,
        }),
        Err(error) => Err(SandboxFailure { error, logs }),
    }
}
