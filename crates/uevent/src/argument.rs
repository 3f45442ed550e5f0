//! Cached literal arguments of persistent listeners.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::object::{ObjectRef, Objects};

/// Version, culture and public key qualifiers inside a type identifier.
static QUALIFIERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r", (?:Version=\d+\.\d+\.\d+\.\d+|Culture=\w+|PublicKeyToken=\w+)")
        .expect("qualifier pattern is valid")
});

/// Strip version, culture and public key qualifiers from a type identifier.
///
/// `"game::Door, game, Version=1.0.0.0, Culture=neutral"` becomes
/// `"game::Door, game"`. Only the qualifier itself is removed, so nested
/// generic arguments keep their brackets. Applying it twice yields the same
/// string as once.
#[must_use]
pub fn tidy_type_name(name: &str) -> String {
    QUALIFIERS.replace_all(name, "").into_owned()
}

pub(crate) fn serialize_tidy<S: Serializer>(name: &str, serializer: S) -> Result<S::Ok, S::Error> {
    tidy_type_name(name).serialize(serializer)
}

pub(crate) fn deserialize_tidy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let name = String::deserialize(deserializer)?;
    Ok(tidy_type_name(&name))
}

/// One literal argument of each kind.
///
/// Only the slot matching the owning call's mode is meaningful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentCache {
    #[serde(rename = "m_ObjectArgument")]
    object_argument: ObjectRef,
    #[serde(
        rename = "m_ObjectArgumentAssemblyTypeName",
        serialize_with = "serialize_tidy",
        deserialize_with = "deserialize_tidy"
    )]
    object_argument_type_name: String,
    #[serde(rename = "m_IntArgument")]
    int_argument: i32,
    #[serde(rename = "m_FloatArgument")]
    float_argument: f32,
    #[serde(rename = "m_StringArgument")]
    string_argument: String,
    #[serde(rename = "m_BoolArgument")]
    bool_argument: bool,
}

impl ArgumentCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn object_argument(&self) -> &ObjectRef {
        &self.object_argument
    }

    /// Set the object slot and record the object's qualified type.
    ///
    /// The type identifier is cleared if the reference is null or dead.
    pub fn set_object_argument(&mut self, argument: ObjectRef) {
        self.object_argument_type_name = argument
            .get()
            .map(|instance| tidy_type_name(instance.qualified_type_name()))
            .unwrap_or_default();
        self.object_argument = argument;
    }

    /// Tidied qualified type of the object slot, empty if none.
    #[must_use]
    pub fn object_argument_type_name(&self) -> &str {
        &self.object_argument_type_name
    }

    #[must_use]
    pub fn int_argument(&self) -> i32 {
        self.int_argument
    }

    pub fn set_int_argument(&mut self, value: i32) {
        self.int_argument = value;
    }

    #[must_use]
    pub fn float_argument(&self) -> f32 {
        self.float_argument
    }

    pub fn set_float_argument(&mut self, value: f32) {
        self.float_argument = value;
    }

    #[must_use]
    pub fn string_argument(&self) -> &str {
        &self.string_argument
    }

    pub fn set_string_argument(&mut self, value: impl Into<String>) {
        self.string_argument = value.into();
    }

    #[must_use]
    pub fn bool_argument(&self) -> bool {
        self.bool_argument
    }

    pub fn set_bool_argument(&mut self, value: bool) {
        self.bool_argument = value;
    }

    pub(crate) fn relink(&mut self, objects: &Objects) {
        objects.relink(&mut self.object_argument);
    }
}
