use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Failed to read annotation options: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse annotation options: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid annotation options: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read schematic snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse schematic snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Component {component} uses unknown library part '{part}'")]
    UnknownPart { component: uuid::Uuid, part: String },
    #[error("Instance {0} appears more than once in the snapshot")]
    DuplicateInstance(String),
    #[error("Lock group {group} references {instance}, which is not in the snapshot")]
    UnknownLockMember { group: String, instance: String },
    #[error("Lock group {group} mixes reference prefixes '{first}' and '{other}'")]
    MixedLockGroup {
        group: String,
        first: String,
        other: String,
    },
    #[error("Instance {instance} is locked by both {first} and {second}")]
    RepeatedLockMember {
        instance: String,
        first: String,
        second: String,
    },
}
