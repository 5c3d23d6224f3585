//! # Codec Pipeline
//!
//! Synchronous uplink and downlink pipelines over a [`ScriptRunner`].
//!
//! ## Uplink
//!
//! ```text
//! bytes ──Decode──▶ fields ──Convert──▶ fields ──Validate──▶ (fields, valid)
//! ```
//!
//! Without a decoder there are no fields, so the later stages are skipped
//! and the payload passes through as valid.
//!
//! ## Downlink
//!
//! Raw bytes are sent unchanged. Fields need an encoder.
//!
//! Stages run strictly in order on the calling thread. Logs are appended as
//! each stage finishes, so they follow execution order on success and on
//! failure.

use crate::domain::entities::{DownlinkOutput, UplinkOutput};
use crate::domain::stages::{downlink_stages, uplink_stages, Stage, StageKind};
use crate::errors::CodecError;
use hd_01_script_sandbox::domain::{Execution, FunctionRole};
use hd_01_script_sandbox::engine::ScriptSandbox;
use hd_01_script_sandbox::errors::SandboxFailure;
use hd_01_script_sandbox::ports::ScriptRunner;
use shared_types::{DownlinkPayload, LogEntry, PayloadFunctions};
use tracing::trace;

/// Uplink/downlink pipeline.
#[derive(Debug, Clone, Default)]
pub struct PayloadCodecPipeline<R = ScriptSandbox> {
    runner: R,
}

impl<R: ScriptRunner> PayloadCodecPipeline<R> {
    /// Creates a pipeline running functions through `runner`.
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// The runner executing payload functions.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Runs decode, convert and validate over an uplink payload.
    pub fn uplink(
        &self,
        functions: &PayloadFunctions,
        payload: &[u8],
        port: u8,
    ) -> Result<UplinkOutput, CodecError> {
        let [decode, rest @ ..] = uplink_stages(functions);
        let Some(decoder) = decode.source else {
            trace!("no decoder, passing payload through");
            return Ok(UplinkOutput::passthrough(payload.to_vec()));
        };

        let mut logs = Vec::new();
        let exec = self.runner.decode(decoder, payload, port);
        let mut fields = collect(decode.kind, exec, &mut logs)?;
        let mut valid = true;

        for Stage { kind, source } in rest {
            let Some(source) = source else {
                trace!(stage = %kind, "stage not defined, passing through");
                continue;
            };

            match kind.role() {
                FunctionRole::Converter => {
                    let exec = self.runner.convert(source, fields, port);
                    fields = collect(kind, exec, &mut logs)?;
                }
                FunctionRole::Validator => {
                    let exec = self.runner.validate(source, fields.clone(), port);
                    valid = collect(kind, exec, &mut logs)?;
                }
                FunctionRole::Decoder | FunctionRole::Encoder => {}
            }
        }

        Ok(UplinkOutput {
            payload: payload.to_vec(),
            fields,
            valid,
            logs,
        })
    }

    /// Turns a downlink body into bytes.
    pub fn downlink(
        &self,
        functions: &PayloadFunctions,
        payload: DownlinkPayload,
        port: u8,
    ) -> Result<DownlinkOutput, CodecError> {
        let fields = match payload {
            DownlinkPayload::Raw(bytes) => {
                return Ok(DownlinkOutput {
                    payload: bytes,
                    logs: Vec::new(),
                })
            }
            DownlinkPayload::Fields(fields) => fields,
        };

        let [Stage { kind, source }] = downlink_stages(functions);
        let source = source.ok_or(CodecError::MissingEncoder)?;

        let mut logs = Vec::new();
        let exec = self.runner.encode(source, fields, port);
        let payload = collect(kind, exec, &mut logs)?;
        Ok(DownlinkOutput { payload, logs })
    }
}

/// Appends a stage's logs and unwraps its output, or builds the stage error
/// carrying every log gathered so far.
fn collect<T>(
    kind: StageKind,
    result: Result<Execution<T>, SandboxFailure>,
    logs: &mut Vec<LogEntry>,
) -> Result<T, CodecError> {
    match result {
        Ok(exec) => {
            logs.extend(exec.logs);
            Ok(exec.output)
        }
        Err(failure) => {
            logs.extend(failure.logs);
            let failure = SandboxFailure {
                error: failure.error,
                logs: std::mem::take(logs),
            };
            Err(match kind {
                StageKind::Decode => CodecError::Decode(failure),
                StageKind::Convert => CodecError::Convert(failure),
                StageKind::Validate => CodecError::Validate(failure),
                StageKind::Encode => CodecError::Encode(failure),
            })
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
