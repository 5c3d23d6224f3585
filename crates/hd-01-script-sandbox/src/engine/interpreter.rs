//! # Sandboxed Interpreter
//!
//! Runs one payload function in a freshly built engine.
//!
//! ## Isolation
//!
//! - The crate is built with `no_module` (no `import`, no file resolver) and
//!   `no_time` (no clock access); nothing in the engine reaches the network
//!   or the filesystem.
//! - `eval` is disabled so functions cannot compile new code at runtime.
//! - A new engine, scope and log buffer are created for every run; nothing
//!   survives between calls.
//!
//! ## Cancellation
//!
//! The progress hook compares the wall clock against the run's deadline and
//! terminates the script cooperatively. It is the only abort path, so the
//! interpreter is never stopped mid-instruction.

use crate::domain::entities::{Execution, SandboxLimits};
use crate::engine::convert::{dynamic_to_json, json_to_dynamic};
use crate::engine::trace::LogBuffer;
use crate::errors::{SandboxError, SandboxFailure};
use rhai::{Dynamic, Engine, EvalAltResult, Scope, AST, FLOAT};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, trace};

/// Progress hook granularity: the clock is read every this many operations.
const DEADLINE_CHECK_INTERVAL: u64 = 256;

/// Sandbox for application payload functions.
#[derive(Debug, Clone, Default)]
pub struct ScriptSandbox {
    limits: SandboxLimits,
}

impl ScriptSandbox {
    /// Creates a sandbox enforcing `limits`.
    #[must_use]
    pub fn new(limits: SandboxLimits) -> Self {
        Self { limits }
    }

    /// Limits applied to every run.
    #[must_use]
    pub fn limits(&self) -> &SandboxLimits {
        &self.limits
    }

    /// Compiles `source` and calls `function` with `args`.
    ///
    /// Log entries are tagged with `label`. The returned value is the raw
    /// JSON form of whatever the function returned; role-specific shape
    /// checks happen in the caller.
    pub fn execute(
        &self,
        source: &str,
        function: &str,
        label: &str,
        args: Vec<Value>,
    ) -> Result<Execution<Value>, SandboxFailure> {
        let started = Instant::now();
        let deadline = started + self.limits.timeout;
        let buffer = LogBuffer::new(label);
        let engine = self.build_engine(&buffer, deadline);

        let ast = engine
            .compile(source)
            .map_err(|e| SandboxFailure::without_logs(SandboxError::Compile(e.to_string())))?;
        ensure_defined(&ast, function, args.len()).map_err(SandboxFailure::without_logs)?;

        let args: Vec<Dynamic> = args.into_iter().map(json_to_dynamic).collect();
        let mut scope = Scope::new();
        let result = engine.call_fn::<Dynamic>(&mut scope, &ast, function, args);
        let elapsed = started.elapsed();

        trace!(
            function,
            elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            logs = buffer.len(),
            "payload function finished"
        );

        let output = result
            .map_err(|err| self.classify(*err))
            .and_then(dynamic_to_json);

        match output {
            Ok(output) => Ok(Execution {
                output,
                logs: buffer.drain(),
                elapsed,
            }),
            Err(error) => {
                debug!(function, error = %error, "payload function failed");
                Err(SandboxFailure {
                    error,
                    logs: buffer.drain(),
                })
            }
        }
    }

    /// Builds an engine wired to `buffer` that stops at `deadline`.
    fn build_engine(&self, buffer: &LogBuffer, deadline: Instant) -> Engine {
        let mut engine = Engine::new();
        let limits = &self.limits;

        engine.set_max_operations(limits.max_operations);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
        engine.disable_symbol("eval");

        engine.on_progress(move |ops| {
            if ops % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                Some(Dynamic::from("deadline".to_string()))
            } else {
                None
            }
        });

        let sink = buffer.clone();
        engine.on_print(move |text| sink.record_text(text));
        let sink = buffer.clone();
        engine.on_debug(move |text, _source, _pos| sink.record_text(text));

        register_log(&mut engine, buffer);
        engine
    }

    /// Maps an interpreter error to the sandbox taxonomy.
    fn classify(&self, err: EvalAltResult) -> SandboxError {
        match root_cause(err) {
            EvalAltResult::ErrorTerminated(..) => SandboxError::Timeout {
                limit_ms: self.limits.timeout_ms(),
            },
            EvalAltResult::ErrorRuntime(value, _) => SandboxError::Runtime(value.to_string()),
            err @ (EvalAltResult::ErrorTooManyOperations(_)
            | EvalAltResult::ErrorDataTooLarge(..)
            | EvalAltResult::ErrorStackOverflow(_)) => SandboxError::ResourceLimit(err.to_string()),
            other => SandboxError::Runtime(other.to_string()),
        }
    }
}

/// Unwraps errors re-raised at each script call frame.
fn root_cause(err: EvalAltResult) -> EvalAltResult {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => root_cause(*inner),
        other => other,
    }
}

/// Fails with a compile error unless `ast` defines `function/arity`.
fn ensure_defined(ast: &AST, function: &str, arity: usize) -> Result<(), SandboxError> {
    let defined = ast
        .iter_functions()
        .any(|f| f.name == function && f.params.len() == arity);

    if defined {
        Ok(())
    } else {
        Err(SandboxError::Compile(format!(
            "function {function} with {arity} parameters is not defined"
        )))
    }
}

/// Registers `log(a [, b [, c [, d]]])`.
///
/// The single and double float forms shadow the math package's logarithm so
/// `log(x)` always records instead of computing.
fn register_log(engine: &mut Engine, buffer: &LogBuffer) {
    let sink = buffer.clone();
    engine.register_fn("log", move |a: Dynamic| sink.record(vec![a]));
    let sink = buffer.clone();
    engine.register_fn("log", move |a: FLOAT| sink.record(vec![Dynamic::from(a)]));
    let sink = buffer.clone();
    engine.register_fn("log", move |a: Dynamic, b: Dynamic| sink.record(vec![a, b]));
    let sink = buffer.clone();
    engine.register_fn("log", move |a: FLOAT, b: FLOAT| {
        sink.record(vec![Dynamic::from(a), Dynamic::from(b)]);
    });
    let sink = buffer.clone();
    engine.register_fn("log", move |a: Dynamic, b: Dynamic, c: Dynamic| {
        sink.record(vec![a, b, c]);
    });
    let sink = buffer.clone();
    engine.register_fn(
        "log",
        move |a: Dynamic, b: Dynamic, c: Dynamic, d: Dynamic| sink.record(vec![a, b, c, d]),
    );
}

// =============================================================================
// TESTS
// =============================================================================
