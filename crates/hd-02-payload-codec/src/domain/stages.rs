//! # Pipeline Stages
//!
//! A pipeline is an ordered list of stage descriptors. A descriptor is
//! present when the application defines the function, absent otherwise;
//! absent stages pass their input through.

use hd_01_script_sandbox::domain::FunctionRole;
use shared_types::PayloadFunctions;
use std::fmt;

/// Pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Bytes to fields.
    Decode,
    /// Fields to fields.
    Convert,
    /// Fields to verdict.
    Validate,
    /// Fields to bytes.
    Encode,
}

impl StageKind {
    /// Sandbox role run by the stage.
    #[must_use]
    pub const fn role(self) -> FunctionRole {
        match self {
            Self::Decode => FunctionRole::Decoder,
            Self::Convert => FunctionRole::Converter,
            Self::Validate => FunctionRole::Validator,
            Self::Encode => FunctionRole::Encoder,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Decode => "decode",
            Self::Convert => "convert",
            Self::Validate => "validate",
            Self::Encode => "encode",
        };
        f.write_str(name)
    }
}

/// One step of a pipeline and the function source backing it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage<'a> {
    /// What the step does.
    pub kind: StageKind,
    /// Function source; `None` means pass-through.
    pub source: Option<&'a str>,
}

impl<'a> Stage<'a> {
    /// Builds a descriptor.
    #[must_use]
    pub fn new(kind: StageKind, source: Option<&'a str>) -> Self {
        Self { kind, source }
    }
}

/// Uplink stages in execution order.
#[must_use]
pub fn uplink_stages(functions: &PayloadFunctions) -> [Stage<'_>; 3] {
    [
        Stage::new(StageKind::Decode, functions.decoder.as_deref()),
        Stage::new(StageKind::Convert, functions.converter.as_deref()),
        Stage::new(StageKind::Validate, functions.validator.as_deref()),
    ]
}

/// Downlink stages in execution order.
#[must_use]
pub fn downlink_stages(functions: &PayloadFunctions) -> [Stage<'_>; 1] {
    [Stage::new(StageKind::Encode, functions.encoder.as_deref())]
}
