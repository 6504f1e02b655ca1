//! Annotation consistency checks.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::list::ReferenceList;
use crate::reference::{InstanceKey, Reference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Reference still has no number.
    NotAnnotated,
    /// Two instances carry the same designator and unit.
    Duplicate,
    /// Instances sharing a designator come from different library parts.
    MultiUnitMismatch,
    /// Unit index outside `1..=unit_count` of the library part.
    InvalidUnit,
    /// Units of one designator carry different values.
    DifferentValues,
}

/// One annotation problem, naming the instances involved.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct AnnotationDiagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub instances: Vec<InstanceKey>,
}

/// Receiver for diagnostics produced by [`ReferenceList::check_annotation`].
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: AnnotationDiagnostic);
}

impl DiagnosticSink for Vec<AnnotationDiagnostic> {
    fn report(&mut self, diagnostic: AnnotationDiagnostic) {
        self.push(diagnostic);
    }
}

/// Discards everything; use when only the count matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: AnnotationDiagnostic) {}
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: AnnotationDiagnostic) {
        match diagnostic.severity {
            Severity::Warning => log::warn!("{diagnostic}"),
            Severity::Error => log::error!("{diagnostic}"),
        }
    }
}

struct Reporter<'s> {
    sink: &'s mut dyn DiagnosticSink,
    count: usize,
}

impl Reporter<'_> {
    fn emit(
        &mut self,
        severity: Severity,
        kind: DiagnosticKind,
        message: String,
        instances: &[&Reference],
    ) {
        self.count += 1;
        self.sink.report(AnnotationDiagnostic {
            severity,
            kind,
            message,
            instances: instances.iter().map(|r| r.key()).collect(),
        });
    }
}

impl ReferenceList<'_> {
    /// Report unannotated references, duplicates, mixed library parts or
    /// values under one designator, and out-of-range units.
    ///
    /// Sorts the list by reference and value. Every problem is reported;
    /// scanning never stops early. Returns the number of diagnostics, zero
    /// meaning the list is fully and consistently annotated.
    pub fn check_annotation(&mut self, sink: &mut dyn DiagnosticSink) -> usize {
        self.sort_by_reference_and_value();

        let mut reporter = Reporter { sink, count: 0 };

        for r in self.iter() {
            let part = self.part_of(r);

            if !r.is_annotated() {
                let message = if part.is_multi_unit() && r.has_assigned_unit() {
                    format!("Item not annotated: {} (unit {})", r.designator(part), r.unit)
                } else {
                    format!("Item not annotated: {}", r.designator(part))
                };
                reporter.emit(Severity::Warning, DiagnosticKind::NotAnnotated, message, &[r]);
                continue;
            }

            let unit_count = part.unit_count.max(1);
            if r.unit < 1 || r.unit > unit_count {
                let message = format!(
                    "Symbol {} unit {} but {} has only {unit_count} unit(s) defined",
                    r.designator(part),
                    r.unit,
                    part.name,
                );
                reporter.emit(Severity::Error, DiagnosticKind::InvalidUnit, message, &[r]);
            }
        }

        // Sorted by reference, so every designator forms one contiguous run.
        let items = self.as_slice();
        let mut start = 0;
        while start < items.len() {
            let first = &items[start];
            let end = items[start..]
                .iter()
                .position(|r| r.prefix() != first.prefix() || r.number() != first.number())
                .map_or(items.len(), |n| start + n);

            if first.is_annotated() {
                self.check_designator(&items[start..end], &mut reporter);
            }
            start = end;
        }

        reporter.count
    }

    fn check_designator(&self, run: &[Reference], reporter: &mut Reporter<'_>) {
        let Some((first, _)) = run.split_first() else {
            return;
        };
        let first_part = self.part_of(first);

        for (i, r) in run.iter().enumerate().skip(1) {
            let part = self.part_of(r);

            if let Some(earlier) = run[..i].iter().find(|e| e.unit == r.unit) {
                let message = format!("Duplicate items {}", r.full_designator(part));
                reporter.emit(Severity::Error, DiagnosticKind::Duplicate, message, &[earlier, r]);
                continue;
            }

            if r.part != first.part {
                let message = format!(
                    "{} ({}) and {} ({}) share a reference but use different library parts",
                    first.full_designator(first_part),
                    first_part.name,
                    r.full_designator(part),
                    part.name,
                );
                reporter.emit(
                    Severity::Error,
                    DiagnosticKind::MultiUnitMismatch,
                    message,
                    &[first, r],
                );
            }

            if r.value != first.value {
                let message = format!(
                    "Different values for {} ({}) and {} ({})",
                    first.full_designator(first_part),
                    first.value,
                    r.full_designator(part),
                    r.value,
                );
                reporter.emit(
                    Severity::Error,
                    DiagnosticKind::DifferentValues,
                    message,
                    &[first, r],
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::{LibPart, LibPartId, PartLibrary};
    use crate::reference::SheetPath;
    use std::sync::Arc;
    use uuid::Uuid;

    const RES: LibPartId = LibPartId(0);
    const QUAD: LibPartId = LibPartId(1);
    const DUAL: LibPartId = LibPartId(2);

    fn library() -> PartLibrary {
        PartLibrary::from(vec![
            LibPart::new("R"),
            LibPart::new("LM324").with_units(4),
            LibPart::new("LM358").with_units(2),
        ])
    }

    fn reference(id: u128, part: LibPartId, raw: &str, unit: i32, value: &str) -> Reference {
        Reference::new(
            Uuid::from_u128(id),
            part,
            SheetPath::root(),
            raw,
            Arc::from(value),
        )
        .with_unit(unit)
    }

    fn check(refs: Vec<Reference>) -> Vec<AnnotationDiagnostic> {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        for r in refs {
            list.insert(r);
        }
        list.split_all();
        let mut diagnostics = Vec::new();
        let count = list.check_annotation(&mut diagnostics);
        assert_eq!(count, diagnostics.len());
        diagnostics
    }

    #[test]
    fn clean_list_has_no_diagnostics() {
        let diagnostics = check(vec![
            reference(1, RES, "R1", 1, "1k"),
            reference(2, RES, "R2", 1, "1k"),
            reference(3, QUAD, "U1", 1, "LM324"),
            reference(4, QUAD, "U1", 2, "LM324"),
        ]);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn reports_every_unannotated_reference() {
        let diagnostics = check(vec![
            reference(1, RES, "R?", 1, "1k"),
            reference(2, RES, "C", 1, "1u"),
            reference(3, RES, "R1", 1, "1k"),
        ]);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.kind == DiagnosticKind::NotAnnotated));
        assert!(diagnostics.iter().all(|d| d.severity == Severity::Warning));
        assert_eq!(diagnostics[0].message, "Item not annotated: C?");
        assert_eq!(diagnostics[1].message, "Item not annotated: R?");
    }

    #[test]
    fn one_duplicate_pair() {
        let diagnostics = check(vec![
            reference(1, RES, "R5", 1, "1k"),
            reference(2, RES, "R5", 1, "1k"),
        ]);
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.kind, DiagnosticKind::Duplicate);
        assert_eq!(d.message, "Duplicate items R5");
        assert_eq!(d.instances.len(), 2);
        assert_ne!(d.instances[0], d.instances[1]);
    }

    #[test]
    fn duplicate_unit_of_multi_unit_part() {
        let diagnostics = check(vec![
            reference(1, QUAD, "U1", 2, "LM324"),
            reference(2, QUAD, "U1", 2, "LM324"),
            reference(3, QUAD, "U1", 1, "LM324"),
        ]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Duplicate items U1B");
    }

    #[test]
    fn duplicates_are_found_across_values() {
        let diagnostics = check(vec![
            reference(1, QUAD, "U1", 1, "a"),
            reference(2, QUAD, "U1", 2, "a"),
            reference(3, QUAD, "U1", 1, "b"),
        ]);
        let kinds: Vec<_> = diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::Duplicate]);
        assert_eq!(diagnostics[0].message, "Duplicate items U1A");
    }

    #[test]
    fn different_values_between_units() {
        let diagnostics = check(vec![
            reference(1, QUAD, "U1", 1, "a"),
            reference(2, QUAD, "U1", 2, "b"),
        ]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::DifferentValues);
        assert_eq!(diagnostics[0].message, "Different values for U1A (a) and U1B (b)");
    }

    #[test]
    fn unannotated_multi_unit_mentions_unit() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(1, QUAD, "U?", 3, "LM324"));
        let mut diagnostics = Vec::new();
        list.check_annotation(&mut diagnostics);
        assert_eq!(diagnostics[0].message, "Item not annotated: U? (unit 3)");
    }

    #[test]
    fn mismatched_library_parts() {
        let diagnostics = check(vec![
            reference(1, QUAD, "U3", 1, "opamp"),
            reference(2, DUAL, "U3", 2, "opamp"),
        ]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::MultiUnitMismatch);
        assert_eq!(
            diagnostics[0].message,
            "U3A (LM324) and U3B (LM358) share a reference but use different library parts"
        );
    }

    #[test]
    fn invalid_unit_count() {
        let diagnostics = check(vec![
            reference(1, DUAL, "U1", 3, "LM358"),
            reference(2, RES, "R1", 0, "1k"),
        ]);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.kind == DiagnosticKind::InvalidUnit));
        assert_eq!(
            diagnostics[1].message,
            "Symbol U1 unit 3 but LM358 has only 2 unit(s) defined"
        );
    }

    #[test]
    fn null_sink_still_counts() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(1, RES, "R?", 1, "1k"));
        assert_eq!(list.check_annotation(&mut NullSink), 1);
    }
}
