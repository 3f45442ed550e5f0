//! Serialized listener records.

mod call;
mod group;

use core::fmt;

use serde::{Deserialize, Serialize};

pub use call::PersistentCall;
pub use group::PersistentCallGroup;

/// How a persistent listener receives its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ListenerMode {
    /// The event's own arguments, matching its signature.
    #[default]
    EventDefined,
    /// No arguments.
    Void,
    /// The cached object argument.
    Object,
    /// The cached `i32`.
    Int,
    /// The cached `f32`.
    Float,
    /// The cached string.
    String,
    /// The cached `bool`.
    Bool,
}

/// When a persistent listener fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CallState {
    /// Never.
    Off,
    /// Always, whether or not the runtime is playing.
    EditorAndRuntime,
    /// Only while the runtime is playing.
    #[default]
    RuntimeOnly,
}

/// Why a persistent listener does or does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerStatus {
    /// Resolves to a method.
    Valid,
    /// No method name has been set.
    Empty,
    /// The target is null, unlinked or destroyed.
    MissingTarget,
    /// The target is alive but has no matching method.
    MissingMethod,
}

impl ListenerStatus {
    #[must_use]
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}

impl fmt::Display for ListenerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Valid => "valid",
            Self::Empty => "no function",
            Self::MissingTarget => "missing target",
            Self::MissingMethod => "missing method",
        })
    }
}
