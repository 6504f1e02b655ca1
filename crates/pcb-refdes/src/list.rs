use std::collections::HashSet;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::alloc::NumberPool;
use crate::part::{LibPart, PartLibrary};
use crate::reference::{InstanceKey, Reference, SheetPath, UNIT_UNASSIGNED};
use crate::sort::SortOrder;

/// Annotation progress of all references sharing one prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationState {
    Unannotated,
    PartiallyAssigned,
    Complete,
}

/// Final designator and unit of one reference, for the caller to write back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationChange {
    pub key: InstanceKey,
    /// Designator without unit letter (`U3`, `R?`).
    pub reference: String,
    pub unit: i32,
}

/// Flattened list of component references.
///
/// A component used on a sheet that is instantiated more than once appears
/// once per sheet path. The list is used for annotation, netlist and BOM
/// ordering. Order is whatever the last sort produced; insertion order is not
/// kept across sorts.
///
/// Not synchronised: callers must serialise access. Identity fields of a
/// reference (`uuid`, `sheet_path`) must not be changed through
/// [`ReferenceList::get_mut`].
pub struct ReferenceList<'lib> {
    library: &'lib PartLibrary,
    items: Vec<Reference>,
    keys: HashSet<InstanceKey>,
}

impl<'lib> ReferenceList<'lib> {
    pub fn new(library: &'lib PartLibrary) -> Self {
        Self {
            library,
            items: Vec::new(),
            keys: HashSet::new(),
        }
    }

    pub fn library(&self) -> &'lib PartLibrary {
        self.library
    }

    /// Library part of `reference`.
    pub fn part_of(&self, reference: &Reference) -> &'lib LibPart {
        self.library.get(reference.part)
    }

    /// # Panics
    ///
    /// If a reference with the same identity is already present, or its part
    /// handle does not resolve in the library.
    pub fn insert(&mut self, reference: Reference) {
        self.library.get(reference.part);
        let key = reference.key();
        assert!(
            self.keys.insert(key),
            "duplicate instance {} inserted into reference list",
            reference.path()
        );
        self.items.push(reference);
    }

    pub fn remove(&mut self, index: usize) -> Reference {
        let reference = self.items.remove(index);
        self.keys.remove(&reference.key());
        reference
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> &Reference {
        &self.items[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Reference {
        &mut self.items[index]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reference> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Reference] {
        &self.items
    }

    pub fn into_references(self) -> Vec<Reference> {
        self.items
    }

    /// Re-split every reference designator into prefix and number.
    pub fn split_all(&mut self) {
        let library = self.library;
        for reference in &mut self.items {
            reference.split(library.get(reference.part));
        }
    }

    pub fn sort_by(&mut self, order: SortOrder) {
        self.items.sort_by(|a, b| order.compare(a, b));
    }

    pub fn sort_by_x_position(&mut self) {
        self.sort_by(SortOrder::XPosition);
    }

    pub fn sort_by_y_position(&mut self) {
        self.sort_by(SortOrder::YPosition);
    }

    /// Sort by sheet path and component identity, which puts repeated
    /// identities next to each other.
    pub fn sort_by_time_stamp(&mut self) {
        self.sort_by(SortOrder::TimeStamp);
    }

    pub fn sort_by_reference_and_value(&mut self) {
        self.sort_by(SortOrder::ReferenceAndValue);
    }

    pub fn sort_by_reference_only(&mut self) {
        self.sort_by(SortOrder::ReferenceOnly);
    }

    /// Another annotated reference with the same prefix and number as the one
    /// at `index`, carrying `unit`.
    pub fn find_unit(&self, index: usize, unit: i32) -> Option<usize> {
        let target = &self.items[index];
        let number = target.number()?;

        self.items.iter().enumerate().position(|(i, r)| {
            i != index
                && r.number() == Some(number)
                && r.prefix() == target.prefix()
                && r.unit == unit
        })
    }

    /// Index of the reference whose [`Reference::path`] equals `path`.
    pub fn find_by_path(&self, path: &str) -> Option<usize> {
        self.items.iter().position(|r| r.path() == path)
    }

    pub fn find_instance(&self, key: &InstanceKey) -> Option<usize> {
        if !self.keys.contains(key) {
            return None;
        }
        self.items
            .iter()
            .position(|r| r.uuid == key.uuid && r.sheet_path == key.sheet_path)
    }

    /// Numbers `>= min_value` used by other references sharing the prefix of
    /// the one at `index`, sorted and deduplicated.
    pub fn numbers_in_use(&self, index: usize, min_value: u32) -> Vec<u32> {
        let prefix = self.items[index].prefix();
        self.pool_for(prefix, min_value, Some(index))
            .as_slice()
            .to_vec()
    }

    /// Pool of numbers `>= min_value` taken by `prefix`, optionally ignoring
    /// the reference at `exclude`.
    pub(crate) fn pool_for(
        &self,
        prefix: &str,
        min_value: u32,
        exclude: Option<usize>,
    ) -> NumberPool {
        NumberPool::from_numbers(
            self.items
                .iter()
                .enumerate()
                .filter(|(i, r)| Some(*i) != exclude && r.prefix() == prefix)
                .filter_map(|(_, r)| r.number())
                .filter(|&n| n >= min_value),
        )
    }

    /// Greatest number used for the prefix of the reference at `index`, or
    /// `min_value` if nothing larger is in use.
    pub fn last_reference(&self, index: usize, min_value: u32) -> u32 {
        let prefix = self.items[index].prefix();
        self.items
            .iter()
            .filter(|r| r.prefix() == prefix)
            .filter_map(Reference::number)
            .fold(min_value, u32::max)
    }

    pub fn annotation_state(&self, prefix: &str) -> AnnotationState {
        let (annotated, pending) = self
            .items
            .iter()
            .filter(|r| r.prefix() == prefix)
            .fold((0usize, 0usize), |(a, p), r| {
                if r.is_annotated() { (a + 1, p) } else { (a, p + 1) }
            });

        match (annotated, pending) {
            (_, 0) => AnnotationState::Complete,
            (0, _) => AnnotationState::Unannotated,
            _ => AnnotationState::PartiallyAssigned,
        }
    }

    /// Forget all numbers so the whole list is annotated from scratch.
    pub fn clear_annotation(&mut self) {
        let library = self.library;
        for reference in &mut self.items {
            let part = library.get(reference.part);
            reference.token.number = None;
            reference.processed = false;
            if part.is_multi_unit() && !part.units_locked {
                reference.unit = UNIT_UNASSIGNED;
            }
        }
    }

    /// Current designator and unit of every reference, in list order.
    pub fn annotation_changes(&self) -> Vec<AnnotationChange> {
        self.items
            .iter()
            .map(|r| AnnotationChange {
                key: r.key(),
                reference: r.designator(self.part_of(r)),
                unit: r.unit,
            })
            .collect()
    }

    /// References on `sheet_path`, in list order.
    pub fn on_sheet<'a>(
        &'a self,
        sheet_path: &'a SheetPath,
    ) -> impl Iterator<Item = &'a Reference> {
        self.items
            .iter()
            .filter(move |r| &r.sheet_path == sheet_path)
    }
}

impl Index<usize> for ReferenceList<'_> {
    type Output = Reference;

    fn index(&self, index: usize) -> &Reference {
        &self.items[index]
    }
}

impl IndexMut<usize> for ReferenceList<'_> {
    fn index_mut(&mut self, index: usize) -> &mut Reference {
        &mut self.items[index]
    }
}

impl<'a> IntoIterator for &'a ReferenceList<'_> {
    type Item = &'a Reference;
    type IntoIter = std::slice::Iter<'a, Reference>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl std::fmt::Debug for ReferenceList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl std::fmt::Display for ReferenceList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, r) in self.items.iter().enumerate() {
            let number = r.number().map_or_else(|| "?".to_owned(), |n| n.to_string());
            writeln!(
                f,
                " [{i:<2}] ref:{:<8} num:{number:<3} lib_part:{}",
                r.prefix(),
                self.part_of(r).name
            )?;
        }
        Ok(())
    }
}
