//! Shared numeric constants for the annotation core.

// ── Geometry ────────────────────────────────────────────────────

/// Tolerance for float comparisons on canonical percent-space geometry.
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// Full turn in degrees; rotation angles are normalized into `[0, 360)`.
pub const FULL_TURN_DEG: f64 = 360.0;

// ── Magic wand ──────────────────────────────────────────────────

/// Flood-fill tolerance units added per pixel of pointer displacement.
pub const WAND_THRESHOLD_PER_PX: f64 = 0.25;

/// Upper bound for the effective flood-fill tolerance.
pub const WAND_MAX_THRESHOLD: u8 = 150;

/// Starting flood-fill tolerance before any pointer displacement.
pub const WAND_DEFAULT_THRESHOLD: u8 = 15;

/// History freeze key taken for the duration of one wand gesture.
pub const WAND_HISTORY_KEY: &str = "magic-wand";

// ── Reconciler ──────────────────────────────────────────────────

/// Group key for regions that carry no label in label-grouping mode.
pub const NO_LABEL_GROUP: &str = "no-label";
