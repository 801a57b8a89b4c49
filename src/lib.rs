//! Annotation data-model core for a multi-media labeling editor.
//!
//! This crate owns the entity layer of the editor: regions and their results,
//! annotations with undo history, the per-task store, display-tree grouping,
//! the magic-wand flood-fill pipeline, and playback synchronization between
//! media tags. The host UI layer is responsible only for rendering, raw event
//! capture, and talking to the platform backend; every mutation of labeling
//! state flows through the types in this crate.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | Per-task store of annotations and predictions |
//! | [`annotation`] | One labeling pass: regions, selection, undo history |
//! | [`region`] | A labeled span/area and its result entries |
//! | [`results`] | Result payloads and the wire result format |
//! | [`shape`] | Canonical percent-space geometry per region kind |
//! | [`config`] | Registry view of the tag-configuration tree |
//! | [`history`] | Snapshot undo stack with keyed freeze batching |
//! | [`tree`] | Display-tree grouping of the flat region list |
//! | [`wand`] | Magic-wand flood fill producing mask regions |
//! | [`sync`] | Playback synchronization between media tags |
//! | [`geometry`] | Percent/pixel conversion, viewport, rotation |
//! | [`errors`] | Error taxonomy (config, data, wand) |
//! | [`consts`] | Shared numeric constants |

pub mod annotation;
pub mod config;
pub mod consts;
pub mod errors;
pub mod geometry;
pub mod history;
pub mod region;
pub mod results;
pub mod shape;
pub mod store;
pub mod sync;
pub mod tree;
pub mod wand;
