//! Error taxonomy for the annotation core.
//!
//! Three non-fatal classes accumulate as diagnostics instead of aborting:
//! [`ConfigError`] (a result references a tag that does not exist in the
//! configuration tree), [`DataError`] (a hydration payload is malformed), and
//! [`WandError`] (an unsupported magic-wand interaction). Entity methods
//! return `Option`/`bool` for expected "no matching state" conditions and
//! never panic.

use thiserror::Error;

/// A result references a control or object that is not present in the
/// configuration registry. Surfaced as a validation diagnostic on the store;
/// the offending result is skipped, rendering continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `from_name` does not resolve to a live control node.
    #[error("result {result_id}: unknown control \"{name}\"")]
    UnknownControl { result_id: String, name: String },
    /// `to_name` does not resolve to a live object node.
    #[error("result {result_id}: unknown object \"{name}\"")]
    UnknownObject { result_id: String, name: String },
    /// The control exists but targets a different object than the result claims.
    #[error("result {result_id}: control \"{control}\" targets \"{expected}\", not \"{actual}\"")]
    MismatchedTarget { result_id: String, control: String, expected: String, actual: String },
}

/// A hydration payload entry is malformed. The offending value defaults to
/// empty/unset and the error is retained on the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    /// A required field is absent from the `value` object.
    #[error("result {result_id}: missing required field \"{field}\"")]
    MissingField { result_id: String, field: &'static str },
    /// A field is present but has the wrong JSON type.
    #[error("result {result_id}: field \"{field}\" has the wrong type")]
    WrongType { result_id: String, field: &'static str },
    /// The `type` discriminator names no supported result kind.
    #[error("result {result_id}: unsupported result type \"{kind}\"")]
    UnknownKind { result_id: String, kind: String },
    /// A brush mask's run-length payload does not decode to the stated size.
    #[error("result {result_id}: mask run-length data is corrupt")]
    BadMask { result_id: String },
}

/// An unsupported magic-wand interaction. Surfaced synchronously to the user;
/// the gesture aborts with no partial state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WandError {
    /// The image is rotated; pixel sampling through a rotation is unsupported.
    #[error("magic wand does not work on rotated images")]
    RotatedImage,
    /// The crosshair overlay is active and would contaminate the sample.
    #[error("magic wand does not work while the crosshair is active")]
    CrosshairActive,
    /// The anchor point falls outside the sampled viewport.
    #[error("magic wand anchor is outside the image")]
    OutOfBounds,
    /// A move/up event arrived with no gesture in progress.
    #[error("no magic wand gesture in progress")]
    NotActive,
    /// A raw pixel payload does not match the stated dimensions.
    #[error("pixel buffer size does not match its dimensions")]
    BufferSize,
    /// The brush control the gesture commits through has a dangling reference.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
