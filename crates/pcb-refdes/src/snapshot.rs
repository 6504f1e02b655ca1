//! Serialisable snapshot of a schematic's component placements.
//!
//! This is the hand-off format between a hierarchy walker and the annotator:
//! the walker records each component once, with one occurrence per sheet path
//! it is stamped at, and the annotator flattens it into a [`ReferenceList`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::annotate::LockedUnitMap;
use crate::error::SnapshotError;
use crate::list::{AnnotationChange, ReferenceList};
use crate::part::PartLibrary;
use crate::position::Point;
use crate::reference::{InstanceKey, Reference, SheetPath};

fn one_u32() -> u32 {
    1
}

fn one_i32() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    #[serde(default)]
    pub sheet_path: SheetPath,
    #[serde(default = "one_u32")]
    pub sheet_number: u32,
    pub reference: String,
    #[serde(default = "one_i32")]
    pub unit: i32,
    #[serde(default)]
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSnapshot {
    pub uuid: Uuid,
    /// Name of the library part in [`Snapshot::parts`].
    pub part: String,
    #[serde(default)]
    pub value: String,
    pub occurrences: Vec<Occurrence>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub parts: PartLibrary,
    pub components: Vec<ComponentSnapshot>,
    #[serde(default, skip_serializing_if = "LockedUnitMap::is_empty")]
    pub lock_groups: LockedUnitMap,
}

impl Snapshot {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One reference per occurrence, already split. Occurrences of one
    /// component share a single value cell.
    pub fn flatten(&self) -> Result<ReferenceList<'_>, SnapshotError> {
        let mut list = ReferenceList::new(&self.parts);

        for component in &self.components {
            let part = self
                .parts
                .find(&component.part)
                .ok_or_else(|| SnapshotError::UnknownPart {
                    component: component.uuid,
                    part: component.part.clone(),
                })?;
            let value: Arc<str> = Arc::from(component.value.as_str());

            for occurrence in &component.occurrences {
                let reference = Reference::new(
                    component.uuid,
                    part,
                    occurrence.sheet_path.clone(),
                    &occurrence.reference,
                    Arc::clone(&value),
                )
                .with_position(occurrence.position)
                .with_sheet_number(occurrence.sheet_number)
                .with_unit(occurrence.unit);

                if list.find_instance(&reference.key()).is_some() {
                    return Err(SnapshotError::DuplicateInstance(reference.path()));
                }
                list.insert(reference);
            }
        }

        self.check_lock_groups(&list)?;

        list.split_all();
        log::debug!(
            "flattened {} components into {} references",
            self.components.len(),
            list.len()
        );
        Ok(list)
    }

    /// Every lock group member must be in `list`, belong to one group only
    /// and share the group's prefix.
    fn check_lock_groups(&self, list: &ReferenceList<'_>) -> Result<(), SnapshotError> {
        let mut owner: HashMap<&InstanceKey, &str> = HashMap::new();

        for (group, members) in &self.lock_groups {
            let mut prefix: Option<&str> = None;
            for key in members {
                let Some(index) = list.find_instance(key) else {
                    return Err(SnapshotError::UnknownLockMember {
                        group: group.clone(),
                        instance: key.to_string(),
                    });
                };

                if let Some(first) = owner.insert(key, group) {
                    return Err(SnapshotError::RepeatedLockMember {
                        instance: key.to_string(),
                        first: first.to_owned(),
                        second: group.clone(),
                    });
                }

                let member_prefix = list[index].prefix();
                match prefix {
                    None => prefix = Some(member_prefix),
                    Some(first) if first != member_prefix => {
                        return Err(SnapshotError::MixedLockGroup {
                            group: group.clone(),
                            first: first.to_owned(),
                            other: member_prefix.to_owned(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    /// Write annotation results back into the occurrences. Returns how many
    /// occurrences changed.
    pub fn apply(&mut self, changes: &[AnnotationChange]) -> usize {
        let by_key: HashMap<&InstanceKey, &AnnotationChange> =
            changes.iter().map(|c| (&c.key, c)).collect();

        let mut changed = 0;
        for component in &mut self.components {
            for occurrence in &mut component.occurrences {
                let key = InstanceKey::new(occurrence.sheet_path.clone(), component.uuid);
                let Some(change) = by_key.get(&key) else {
                    continue;
                };
                if occurrence.reference != change.reference || occurrence.unit != change.unit {
                    occurrence.reference = change.reference.clone();
                    occurrence.unit = change.unit;
                    changed += 1;
                }
            }
        }
        changed
    }
}
