//! Change records and decoded change events.

use serde::{Deserialize, Serialize};

/// Action code carried by one raw notification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawAction {
    Added,
    Removed,
    Modified,
    RenamedOldName,
    RenamedNewName,
    /// A code this decoder does not understand.
    Unknown(u32),
}

impl RawAction {
    /// Map a wire action code to an action.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Added,
            2 => Self::Removed,
            3 => Self::Modified,
            4 => Self::RenamedOldName,
            5 => Self::RenamedNewName,
            other => Self::Unknown(other),
        }
    }

    /// The wire action code for this action.
    pub fn code(self) -> u32 {
        match self {
            Self::Added => 1,
            Self::Removed => 2,
            Self::Modified => 3,
            Self::RenamedOldName => 4,
            Self::RenamedNewName => 5,
            Self::Unknown(code) => code,
        }
    }
}

/// One undecoded record: an action and a name relative to the watched root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// What happened.
    pub action: RawAction,

    /// Name of the affected entry, relative to the watched root.
    pub name: String,
}

impl RawRecord {
    /// Create a new raw record.
    pub fn new(action: RawAction, name: impl Into<String>) -> Self {
        Self {
            action,
            name: name.into(),
        }
    }
}

/// Kind of decoded change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// Entry was created.
    Added,

    /// Entry was deleted.
    Removed,

    /// Entry content changed.
    Modified,

    /// Entry was renamed (old name).
    RenamedFrom,

    /// Entry was renamed (new name).
    RenamedTo,
}

impl ChangeAction {
    /// Which change log receives events of this kind.
    pub fn log(self) -> ChangeLog {
        match self {
            Self::Added | Self::Modified | Self::RenamedTo => ChangeLog::Added,
            Self::Removed | Self::RenamedFrom => ChangeLog::Removed,
        }
    }

    /// Label used on the diagnostic stream.
    pub fn label(self) -> &'static str {
        match self {
            Self::Added => "file add",
            Self::Modified => "file modified",
            Self::Removed => "file removed",
            Self::RenamedFrom => "file renamed from",
            Self::RenamedTo => "file renamed to",
        }
    }
}

/// The two append-only logs a monitor writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeLog {
    Added,
    Removed,
}

impl ChangeLog {
    /// File name of the log inside the output directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Added => ADDED_LOG_NAME,
            Self::Removed => REMOVED_LOG_NAME,
        }
    }
}

/// File name of the Added-log.
pub const ADDED_LOG_NAME: &str = "fileAdded.txt";

/// File name of the Removed-log.
pub const REMOVED_LOG_NAME: &str = "fileRemoved.txt";

/// A decoded change, named relative to the watched root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// The kind of change.
    pub action: ChangeAction,

    /// Entry name relative to the watched root.
    pub name: String,
}

impl ChangeEvent {
    /// Create a new change event.
    pub fn new(action: ChangeAction, name: impl Into<String>) -> Self {
        Self {
            action,
            name: name.into(),
        }
    }

    /// The log line for this event: the root concatenated with the name as-is.
    pub fn log_line(&self, root: &str) -> String {
        format!("{root}{}", self.name)
    }
}

/// One item produced by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A change to log.
    Change(ChangeEvent),

    /// A record with an action code the decoder does not recognize.
    Unknown { code: u32, name: String },
}
