use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::part::{LibPart, LibPartId};
use crate::position::Point;
use crate::token::{ReferenceToken, unit_suffix};

/// Unit value marking a multi-unit instance whose unit is decided by the
/// annotator.
pub const UNIT_UNASSIGNED: i32 = 0x7FFF_FFFF;

/// Sequence of sheet identifiers from the root sheet down to the sheet that
/// contains an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetPath(Vec<String>);

impl SheetPath {
    pub fn new(sheets: Vec<String>) -> Self {
        Self(sheets)
    }

    /// The root sheet.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn append(&self, sheet: impl Into<String>) -> Self {
        let mut sheets = self.0.clone();
        sheets.push(sheet.into());
        Self(sheets)
    }

    pub fn sheets(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

/// Renders as `/a/b/`; the root sheet renders as `/`.
impl std::fmt::Display for SheetPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("/")?;
        for sheet in &self.0 {
            write!(f, "{sheet}/")?;
        }
        Ok(())
    }
}

/// Identity of one flattened instance: the component it was stamped from and
/// the sheet path it was stamped at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceKey {
    pub sheet_path: SheetPath,
    pub uuid: Uuid,
}

impl InstanceKey {
    pub fn new(sheet_path: SheetPath, uuid: Uuid) -> Self {
        Self { sheet_path, uuid }
    }
}

/// Renders as the sheet path followed by the component uuid, the string
/// [`crate::ReferenceList::find_by_path`] matches against.
impl std::fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.sheet_path, self.uuid)
    }
}

/// One component occurrence in the flattened hierarchy.
///
/// The same component placed on a sheet that is instantiated twice yields two
/// references with the same `uuid` and different sheet paths.
#[derive(Debug, Clone)]
pub struct Reference {
    /// Identity of the underlying schematic component.
    pub uuid: Uuid,
    /// Library part the component was placed from.
    pub part: LibPartId,
    pub position: Point,
    pub sheet_path: SheetPath,
    pub sheet_number: u32,
    /// 1-based unit for multi-unit parts, [`UNIT_UNASSIGNED`] while the
    /// annotator still has to pick one.
    pub unit: i32,
    pub token: ReferenceToken,
    /// Value text, shared by every occurrence of the component.
    pub value: Arc<str>,
    /// Set once the annotation pass has handled this reference.
    pub(crate) processed: bool,
}

impl Reference {
    pub fn new(
        uuid: Uuid,
        part: LibPartId,
        sheet_path: SheetPath,
        reference: &str,
        value: Arc<str>,
    ) -> Self {
        Self {
            uuid,
            part,
            position: Point::default(),
            sheet_path,
            sheet_number: 1,
            unit: 1,
            token: ReferenceToken::parse(reference),
            value,
            processed: false,
        }
    }

    pub fn with_position(mut self, position: impl Into<Point>) -> Self {
        self.position = position.into();
        self
    }

    pub fn with_sheet_number(mut self, sheet_number: u32) -> Self {
        self.sheet_number = sheet_number;
        self
    }

    pub fn with_unit(mut self, unit: i32) -> Self {
        self.unit = unit;
        self
    }

    pub fn key(&self) -> InstanceKey {
        InstanceKey::new(self.sheet_path.clone(), self.uuid)
    }

    /// Sheet path followed by the component uuid.
    pub fn path(&self) -> String {
        format!("{}{}", self.sheet_path, self.uuid)
    }

    pub fn prefix(&self) -> &str {
        &self.token.prefix
    }

    pub fn number(&self) -> Option<u32> {
        self.token.number
    }

    pub fn is_annotated(&self) -> bool {
        self.token.is_annotated()
    }

    /// Same component on the same sheet path.
    pub fn is_same_instance(&self, other: &Reference) -> bool {
        self.uuid == other.uuid && self.sheet_path == other.sheet_path
    }

    /// Re-split the reference and reconcile the unit with `part`.
    ///
    /// Unannotated multi-unit instances get [`UNIT_UNASSIGNED`] so the
    /// annotator packs them, unless the part's units are locked, in which
    /// case the placed unit is kept.
    pub fn split(&mut self, part: &LibPart) {
        self.token = ReferenceToken::parse(&self.token.to_string());
        if !self.token.is_annotated() && part.is_multi_unit() && !part.units_locked {
            self.unit = UNIT_UNASSIGNED;
        }
    }

    /// Number as rendered in a designator: `?` when unannotated, with a
    /// leading `0` for power symbols.
    pub fn number_text(&self, part: &LibPart) -> String {
        match self.token.number {
            None => "?".to_owned(),
            Some(number) if part.is_power => format!("0{number}"),
            Some(number) => number.to_string(),
        }
    }

    /// Prefix and number, without unit letter (`U3`, `#PWR01`, `R?`).
    pub fn designator(&self, part: &LibPart) -> String {
        format!("{}{}", self.token.prefix, self.number_text(part))
    }

    /// Designator with the unit letter appended for multi-unit parts (`U3B`).
    pub fn full_designator(&self, part: &LibPart) -> String {
        if part.is_multi_unit() {
            format!("{}{}", self.designator(part), unit_suffix(self.unit))
        } else {
            self.designator(part)
        }
    }

    /// True when `unit` is a real unit index rather than unset or the sentinel.
    pub fn has_assigned_unit(&self) -> bool {
        self.unit > 0 && self.unit < UNIT_UNASSIGNED
    }
}
