use serde::{Deserialize, Serialize};

/// Library part metadata the annotator needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibPart {
    pub name: String,
    /// Number of units per package; `1` for ordinary parts.
    #[serde(default = "default_unit_count")]
    pub unit_count: i32,
    /// Units are not interchangeable (e.g. a relay coil and its contacts).
    #[serde(default)]
    pub units_locked: bool,
    /// Power symbols get their numbers rendered with a leading zero.
    #[serde(default)]
    pub is_power: bool,
}

fn default_unit_count() -> i32 {
    1
}

impl LibPart {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit_count: 1,
            units_locked: false,
            is_power: false,
        }
    }

    pub fn with_units(mut self, unit_count: i32) -> Self {
        self.unit_count = unit_count;
        self
    }

    pub fn with_locked_units(mut self) -> Self {
        self.units_locked = true;
        self
    }

    pub fn power(mut self) -> Self {
        self.is_power = true;
        self
    }

    pub fn is_multi_unit(&self) -> bool {
        self.unit_count > 1
    }
}

/// Non-owning handle to a part inside a [`PartLibrary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibPartId(pub usize);

/// Externally owned cache of library parts. Reference lists borrow it, so a
/// list can never outlive the parts its records point at.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartLibrary {
    parts: Vec<LibPart>,
}

impl PartLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, part: LibPart) -> LibPartId {
        self.parts.push(part);
        LibPartId(self.parts.len() - 1)
    }

    /// Resolve a handle.
    ///
    /// # Panics
    ///
    /// A handle that does not belong to this library is a broken caller
    /// contract and panics.
    pub fn get(&self, id: LibPartId) -> &LibPart {
        self.parts
            .get(id.0)
            .unwrap_or_else(|| panic!("library part handle {} is out of range", id.0))
    }

    pub fn find(&self, name: &str) -> Option<LibPartId> {
        self.parts.iter().position(|p| p.name == name).map(LibPartId)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl From<Vec<LibPart>> for PartLibrary {
    fn from(parts: Vec<LibPart>) -> Self {
        Self { parts }
    }
}
