//! Reference designator handling for hierarchical schematics.
//!
//! A schematic hierarchy is flattened into a [`ReferenceList`] holding one
//! [`Reference`] per component occurrence. The list can then be sorted,
//! annotated (unannotated `R?` references get the lowest free number),
//! checked for duplicates and inconsistencies, and rendered in shorthand form
//! for BOMs.

pub mod alloc;
pub mod annotate;
pub mod check;
pub mod error;
pub mod list;
pub mod options;
pub mod part;
pub mod position;
pub mod reference;
pub mod shorthand;
pub mod snapshot;
pub mod sort;
pub mod token;

pub use alloc::{NumberPool, NumberingScheme, first_free_number};
pub use annotate::LockedUnitMap;
pub use check::{
    AnnotationDiagnostic, DiagnosticKind, DiagnosticSink, LogSink, NullSink, Severity,
};
pub use error::{OptionsError, SnapshotError};
pub use list::{AnnotationChange, AnnotationState, ReferenceList};
pub use options::AnnotateOptions;
pub use part::{LibPart, LibPartId, PartLibrary};
pub use position::Point;
pub use reference::{InstanceKey, Reference, SheetPath, UNIT_UNASSIGNED};
pub use shorthand::shorthand;
pub use snapshot::{ComponentSnapshot, Occurrence, Snapshot};
pub use sort::SortOrder;
pub use token::{ReferenceToken, unit_suffix};
