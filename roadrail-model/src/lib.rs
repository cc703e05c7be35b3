//! Entity model for road/rail synchronization.
//!
//! Defines the types every other crate depends on:
//! - [`SourceEntity`] / [`SourceGraph`]: immutable per-run snapshot of the design
//!   feed, an arena addressed by [`SourceId`](roadrail_types::SourceId) with
//!   cross-references stored as ids, never as live references
//! - [`GeometryPayload`] / [`GeometryMarshaler`]: source geometry and the seam
//!   that converts it into [`TargetGeometry`]
//! - [`SourceItem`]: the fingerprinting wrapper consumed by change detection
//! - [`TargetData`] / [`Container`]: what converters write to the target store
//! - [`SchemaSnapshot`] and the schema comparer ([`diff`], [`reconcile`],
//!   [`requires_update`]) plus the [`DynamicSchemaGenerator`]

mod dynamic_schema;
mod geometry;
mod item;
mod schema;
mod source;
mod target;

pub use dynamic_schema::{
    class_name_for_feature, DynamicSchemaGenerator, CORRIDOR_COMPONENT_BASE, LINEAR_BASE,
};
pub use geometry::{
    approximate_3d, AffineMarshaler, CorridorHeader, GeometryError, GeometryMarshaler,
    GeometryPayload, HorizontalGeometry, HorizontalSegment, Point3, ProfilePoint, SegmentKind,
    SpatialTransform, SurfaceMesh, TargetGeometry, VerticalGeometry,
};
pub use item::{FingerprintError, FingerprintSource, SourceItem};
pub use schema::{
    diff, evaluate, reconcile, requires_update, ClassChange, SchemaClass, SchemaDecision,
    SchemaDiff, SchemaSnapshot, SchemaVersion,
};
pub use source::{CrossRef, CrossRefRole, SourceEntity, SourceGraph};
pub use target::{source_ref, Container, TargetData, TargetEntity, TargetQuery};
