//! Assignment of reference numbers to unannotated references.

use std::collections::{BTreeMap, HashMap};

use crate::alloc::{NumberPool, NumberingScheme};
use crate::list::ReferenceList;
use crate::options::AnnotateOptions;
use crate::reference::InstanceKey;

/// Multi-unit parts whose units must be annotated together, keyed by the
/// reference the group is locked under (e.g. `U3`). Members are listed in
/// unit order: the first member becomes unit A, the second unit B, and so on.
pub type LockedUnitMap = BTreeMap<String, Vec<InstanceKey>>;

impl ReferenceList<'_> {
    /// Sort according to `options` and annotate.
    pub fn annotate_with(&mut self, options: &AnnotateOptions, locked: &LockedUnitMap) {
        if options.reset {
            self.clear_annotation();
        }
        self.sort_by(options.order);
        self.annotate(
            options.numbering == NumberingScheme::PerSheet,
            options.sheet_interval,
            options.start_number,
            locked,
        );
    }

    /// Give every unannotated reference a number, in current list order.
    ///
    /// With `use_sheet_numbering`, numbers for a reference on sheet `n` start
    /// at `n * sheet_interval + 1` (sheet 2 with interval 100 starts at 201);
    /// otherwise they start at `start_number`. The lowest free number is
    /// always taken, so holes left by deleted parts are reused.
    ///
    /// References in a `locked` group share one number and get units in
    /// group order. Other unannotated multi-unit references are packed: a
    /// fresh number is taken for the first one and its remaining unit slots
    /// are filled with later unannotated references of the same prefix,
    /// value and library part.
    ///
    /// # Panics
    ///
    /// If a lock group names an instance that is not in the list, or mixes
    /// prefixes.
    pub fn annotate(
        &mut self,
        use_sheet_numbering: bool,
        sheet_interval: u32,
        start_number: u32,
        locked: &LockedUnitMap,
    ) {
        if self.is_empty() {
            return;
        }

        let scheme = if use_sheet_numbering {
            NumberingScheme::PerSheet
        } else {
            NumberingScheme::Sequential
        };

        let groups = self.resolve_lock_groups(locked);
        let mut group_of: HashMap<usize, usize> = HashMap::new();
        for (g, members) in groups.iter().enumerate() {
            for &m in members {
                group_of.insert(m, g);
            }
        }

        for i in 0..self.len() {
            self[i].processed = false;
        }

        let mut numbered = 0usize;
        let mut block: Option<(String, Option<u32>)> = None;
        let mut pool = NumberPool::new();
        let mut min_number = 0;

        for ii in 0..self.len() {
            if self[ii].processed {
                continue;
            }

            // A new prefix (or a new sheet, when numbering per sheet) starts a
            // new pool of used numbers.
            let current = &self[ii];
            let key = (
                current.prefix().to_owned(),
                use_sheet_numbering.then_some(current.sheet_number),
            );
            if block.as_ref() != Some(&key) {
                min_number =
                    scheme.first_candidate(current.sheet_number, sheet_interval, start_number);
                pool = self.pool_for(&key.0, min_number, None);
                log::debug!(
                    "annotating prefix {:?} from {min_number} ({} numbers in use)",
                    key.0,
                    pool.as_slice().len()
                );
                block = Some(key);
            }

            if let Some(&g) = group_of.get(&ii) {
                numbered += self.annotate_group(ii, &groups[g], &mut pool, min_number);
                continue;
            }

            let part_id = self[ii].part;
            let part = self.library().get(part_id);

            if !self[ii].is_annotated() {
                self[ii].token.number = Some(pool.claim(min_number));
                numbered += 1;
                if !part.units_locked {
                    self[ii].unit = 1;
                }
            }
            if !part.is_multi_unit() {
                self[ii].unit = 1;
            }
            self[ii].processed = true;

            if part.is_multi_unit() {
                numbered += self.pack_units(ii, use_sheet_numbering, &group_of);
            }
        }

        log::debug!("annotated {numbered} of {} references", self.len());
    }

    fn resolve_lock_groups(&self, locked: &LockedUnitMap) -> Vec<Vec<usize>> {
        let mut owner: HashMap<usize, &str> = HashMap::new();
        locked
            .iter()
            .map(|(name, members)| {
                let indices: Vec<usize> = members
                    .iter()
                    .map(|key| {
                        let index = self.find_instance(key).unwrap_or_else(|| {
                            panic!("lock group {name} references {key}, which is not in the list")
                        });
                        if let Some(first) = owner.insert(index, name) {
                            panic!("instance {key} is locked by both {first} and {name}");
                        }
                        index
                    })
                    .collect();
                if let Some((&first, rest)) = indices.split_first() {
                    let prefix = self[first].prefix();
                    assert!(
                        rest.iter().all(|&i| self[i].prefix() == prefix),
                        "lock group {name} mixes reference prefixes"
                    );
                }
                indices
            })
            .collect()
    }

    /// Number every member of a lock group at once. Returns how many members
    /// were previously unannotated.
    ///
    /// Annotated members keep their number and unit. Unannotated members take
    /// the group's number and the free units in group order.
    fn annotate_group(
        &mut self,
        ii: usize,
        members: &[usize],
        pool: &mut NumberPool,
        min_number: u32,
    ) -> usize {
        let number = self[ii]
            .number()
            .or_else(|| members.iter().find_map(|&m| self[m].number()))
            .unwrap_or_else(|| pool.claim(min_number));

        let taken: Vec<i32> = members
            .iter()
            .map(|&m| &self[m])
            .filter(|r| r.number() == Some(number))
            .map(|r| r.unit)
            .collect();
        let mut free_units = (1..).filter(|unit| !taken.contains(unit));

        let mut numbered = 0;
        for &m in members {
            let member = &mut self[m];
            match member.number() {
                None => {
                    member.token.number = Some(number);
                    member.unit = free_units.next().unwrap_or(1);
                    numbered += 1;
                }
                Some(other) if other != number => {
                    log::warn!(
                        "{} is locked with number {number} but already annotated as {other}",
                        member.path()
                    );
                }
                Some(_) => {}
            }
            member.processed = true;
        }
        // The triggering reference is a member by construction.
        self[ii].processed = true;
        numbered
    }

    /// Fill the free unit slots of the multi-unit reference at `ii` with later
    /// unannotated references of the same prefix, value and part.
    fn pack_units(
        &mut self,
        ii: usize,
        use_sheet_numbering: bool,
        group_of: &HashMap<usize, usize>,
    ) -> usize {
        let part_id = self[ii].part;
        let part = self.library().get(part_id);
        let Some(number) = self[ii].number() else {
            return 0;
        };

        let mut numbered = 0;
        for unit in 1..=part.unit_count {
            if self[ii].unit == unit || self.find_unit(ii, unit).is_some() {
                continue;
            }

            let anchor = &self[ii];
            let candidate = (ii + 1..self.len()).find(|&jj| {
                let r = &self[jj];
                !r.processed
                    && !r.is_annotated()
                    && !group_of.contains_key(&jj)
                    && r.part == part_id
                    && r.prefix() == anchor.prefix()
                    && r.value == anchor.value
                    && (!use_sheet_numbering || r.sheet_path == anchor.sheet_path)
                    && (!part.units_locked || r.unit == unit)
            });

            if let Some(jj) = candidate {
                let r = &mut self[jj];
                r.token.number = Some(number);
                r.unit = unit;
                r.processed = true;
                numbered += 1;
            }
        }
        numbered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::{LibPart, LibPartId, PartLibrary};
    use crate::reference::{Reference, SheetPath, UNIT_UNASSIGNED};
    use std::sync::Arc;
    use uuid::Uuid;

    const RES: LibPartId = LibPartId(0);
    const QUAD: LibPartId = LibPartId(1);
    const RELAY: LibPartId = LibPartId(2);

    fn library() -> PartLibrary {
        PartLibrary::from(vec![
            LibPart::new("R"),
            LibPart::new("LM324").with_units(4),
            LibPart::new("RELAY").with_units(2).with_locked_units(),
        ])
    }

    fn reference(id: u128, part: LibPartId, raw: &str, x: i64) -> Reference {
        Reference::new(
            Uuid::from_u128(id),
            part,
            SheetPath::root(),
            raw,
            Arc::from("v"),
        )
        .with_position((x, 0))
    }

    fn designators(list: &ReferenceList<'_>) -> Vec<String> {
        list.iter()
            .map(|r| r.full_designator(list.part_of(r)))
            .collect()
    }

    #[test]
    fn sequential_numbering() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        for (id, x) in [(1, 30), (2, 10), (3, 20)] {
            list.insert(reference(id, RES, "R?", x));
        }
        list.split_all();
        list.sort_by_x_position();
        list.annotate(false, 100, 1, &LockedUnitMap::new());

        assert_eq!(designators(&list), vec!["R1", "R2", "R3"]);
        assert_eq!(list[0].uuid, Uuid::from_u128(2));
    }

    #[test]
    fn per_sheet_blocks() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        for id in 1..=3 {
            list.insert(reference(id, RES, "U?", id as i64).with_sheet_number(2));
        }
        list.split_all();
        list.sort_by_x_position();
        list.annotate(true, 100, 1, &LockedUnitMap::new());

        assert_eq!(designators(&list), vec!["U201", "U202", "U203"]);
    }

    #[test]
    fn per_sheet_overflow_spills_into_next_block() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        for id in 1..=3 {
            list.insert(reference(id, RES, "R?", id as i64).with_sheet_number(1));
        }
        list.insert(reference(10, RES, "R?", 0).with_sheet_number(2));
        list.split_all();
        list.sort_by_x_position();
        list.annotate(true, 2, 1, &LockedUnitMap::new());

        // Sheet 1 takes 3, 4, 5; sheet 2's block starts at 5 and moves on.
        assert_eq!(designators(&list), vec!["R3", "R4", "R5", "R6"]);
    }

    #[test]
    fn fills_gaps_and_keeps_existing() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(1, RES, "R1", 0));
        list.insert(reference(2, RES, "R3", 1));
        list.insert(reference(3, RES, "R?", 2));
        list.insert(reference(4, RES, "R?", 3));
        list.split_all();
        list.sort_by_x_position();
        list.annotate(false, 100, 1, &LockedUnitMap::new());

        assert_eq!(designators(&list), vec!["R1", "R3", "R2", "R4"]);
    }

    #[test]
    fn packs_multi_unit_parts() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        for id in 1..=5 {
            list.insert(reference(id, QUAD, "U?", id as i64));
        }
        list.split_all();
        assert!(list.iter().all(|r| r.unit == UNIT_UNASSIGNED));
        list.sort_by_x_position();
        list.annotate(false, 100, 1, &LockedUnitMap::new());

        assert_eq!(designators(&list), vec!["U1A", "U1B", "U1C", "U1D", "U2A"]);
    }

    #[test]
    fn packing_respects_value() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(1, QUAD, "U?", 1));
        let mut other = reference(2, QUAD, "U?", 2);
        other.value = Arc::from("other");
        list.insert(other);
        list.split_all();
        list.sort_by_x_position();
        list.annotate(false, 100, 1, &LockedUnitMap::new());

        assert_eq!(designators(&list), vec!["U1A", "U2A"]);
    }

    #[test]
    fn packing_fills_missing_units_of_annotated_part() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(1, QUAD, "U1", 0).with_unit(1));
        list.insert(reference(2, QUAD, "U1", 1).with_unit(3));
        list.insert(reference(3, QUAD, "U?", 2));
        list.insert(reference(4, QUAD, "U?", 3));
        list.split_all();
        list.sort_by_x_position();
        list.annotate(false, 100, 1, &LockedUnitMap::new());

        assert_eq!(designators(&list), vec!["U1A", "U1C", "U1B", "U1D"]);
    }

    #[test]
    fn locked_units_keep_their_slot() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(1, RELAY, "K?", 0).with_unit(2));
        list.insert(reference(2, RELAY, "K?", 1).with_unit(2));
        list.insert(reference(3, RELAY, "K?", 2).with_unit(1));
        list.split_all();
        list.sort_by_x_position();
        list.annotate(false, 100, 1, &LockedUnitMap::new());

        assert_eq!(designators(&list), vec!["K1B", "K2B", "K1A"]);
    }

    #[test]
    fn lock_group_shares_one_number() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(9, QUAD, "U?", 0));
        for id in 1..=3 {
            list.insert(reference(id, QUAD, "U?", 10 + id as i64));
        }
        list.split_all();

        let group: Vec<InstanceKey> = [3u128, 1, 2]
            .into_iter()
            .map(|id| InstanceKey::new(SheetPath::root(), Uuid::from_u128(id)))
            .collect();
        let locked = LockedUnitMap::from([("U7".to_owned(), group)]);

        list.sort_by_x_position();
        list.annotate(false, 100, 1, &locked);

        let by_id = |id: u128| {
            list.iter()
                .find(|r| r.uuid == Uuid::from_u128(id))
                .map(|r| (r.number(), r.unit))
                .unwrap()
        };
        assert_eq!(by_id(9), (Some(1), 1));
        assert_eq!(by_id(3), (Some(2), 1));
        assert_eq!(by_id(1), (Some(2), 2));
        assert_eq!(by_id(2), (Some(2), 3));
    }

    #[test]
    #[should_panic(expected = "not in the list")]
    fn lock_group_with_unknown_member_panics() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(1, QUAD, "U?", 0));
        let locked = LockedUnitMap::from([(
            "U1".to_owned(),
            vec![InstanceKey::new(SheetPath::root(), Uuid::from_u128(42))],
        )]);
        list.annotate(false, 100, 1, &locked);
    }

    #[test]
    #[should_panic(expected = "locked by both A and B")]
    fn instance_in_two_lock_groups_panics() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        for id in 1..=3 {
            list.insert(reference(id, QUAD, "U?", id as i64));
        }
        let key = |id: u128| InstanceKey::new(SheetPath::root(), Uuid::from_u128(id));
        let locked = LockedUnitMap::from([
            ("A".to_owned(), vec![key(1), key(2)]),
            ("B".to_owned(), vec![key(3), key(2)]),
        ]);
        list.annotate(false, 100, 1, &locked);
    }

    #[test]
    #[should_panic(expected = "locked by both U1 and U1")]
    fn instance_repeated_in_one_lock_group_panics() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(1, QUAD, "U?", 0));
        let key = InstanceKey::new(SheetPath::root(), Uuid::from_u128(1));
        let locked = LockedUnitMap::from([("U1".to_owned(), vec![key.clone(), key])]);
        list.annotate(false, 100, 1, &locked);
    }

    #[test]
    #[should_panic(expected = "lock group U1 mixes reference prefixes")]
    fn lock_group_with_mixed_prefixes_panics() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(1, QUAD, "U?", 0));
        list.insert(reference(2, RES, "R?", 10));
        let key = |id: u128| InstanceKey::new(SheetPath::root(), Uuid::from_u128(id));
        let locked = LockedUnitMap::from([("U1".to_owned(), vec![key(1), key(2)])]);
        list.annotate(false, 100, 1, &locked);
    }

    #[test]
    fn lock_group_keeps_annotated_members() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(1, QUAD, "U5", 0).with_unit(2));
        list.insert(reference(2, QUAD, "U?", 10));
        list.insert(reference(3, QUAD, "U?", 20));
        list.split_all();

        let key = |id: u128| InstanceKey::new(SheetPath::root(), Uuid::from_u128(id));
        let locked = LockedUnitMap::from([("U5".to_owned(), vec![key(1), key(2), key(3)])]);

        list.sort_by_x_position();
        list.annotate(false, 100, 1, &locked);

        assert_eq!(designators(&list), vec!["U5B", "U5A", "U5C"]);
    }

    #[test]
    fn lock_group_takes_number_from_annotated_member() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(1, QUAD, "U?", 0));
        list.insert(reference(2, QUAD, "U4", 10).with_unit(1));
        list.split_all();

        let key = |id: u128| InstanceKey::new(SheetPath::root(), Uuid::from_u128(id));
        let locked = LockedUnitMap::from([("U4".to_owned(), vec![key(1), key(2)])]);

        // Unsorted, so the unannotated member triggers the group.
        list.annotate(false, 100, 1, &locked);

        assert_eq!(designators(&list), vec!["U4B", "U4A"]);
    }

    #[test]
    fn single_unit_parts_are_reset_to_unit_one() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(1, RES, "R5", 0).with_unit(0));
        list.insert(reference(2, RES, "R?", 10).with_unit(3));
        list.split_all();
        list.sort_by_x_position();
        list.annotate(false, 100, 1, &LockedUnitMap::new());

        assert!(list.iter().all(|r| r.unit == 1));
        assert_eq!(list.check_annotation(&mut crate::check::NullSink), 0);
    }

    #[test]
    fn numbering_from_the_top_of_the_range_wraps() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(1, RES, "R?", 0));
        list.insert(reference(2, RES, "R?", 10));
        list.split_all();
        list.sort_by_x_position();
        list.annotate(false, 100, u32::MAX, &LockedUnitMap::new());

        assert_eq!(designators(&list), vec!["R4294967295", "R1"]);
    }

    #[test]
    fn annotate_with_reset_renumbers_everything() {
        let lib = library();
        let mut list = ReferenceList::new(&lib);
        list.insert(reference(1, RES, "R7", 20));
        list.insert(reference(2, RES, "R9", 10));

        let options = AnnotateOptions {
            reset: true,
            ..AnnotateOptions::default()
        };
        list.annotate_with(&options, &LockedUnitMap::new());

        assert_eq!(designators(&list), vec!["R1", "R2"]);
        assert_eq!(list[0].uuid, Uuid::from_u128(2));
    }
}
