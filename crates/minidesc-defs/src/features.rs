//! Editions and feature resolution.
//!
//! Every def carries a fully resolved feature set. Resolution starts from the
//! defaults of the file's edition and applies the explicit overrides of the
//! file, each enclosing message and finally the def itself.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::DefaultsError;

/// Feature defaults compiled into the crate.
const EMBEDDED_DEFAULTS: &str = include_str!("feature_defaults.json");

/// Schema edition. Declaration order is chronological.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Edition {
    /// Defaults shared by every edition before proto3.
    #[serde(rename = "EDITION_LEGACY")]
    Legacy,
    #[serde(rename = "EDITION_PROTO2")]
    Proto2,
    #[serde(rename = "EDITION_PROTO3")]
    Proto3,
    #[serde(rename = "EDITION_2023")]
    Edition2023,
    #[serde(rename = "EDITION_2024")]
    Edition2024,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldPresence {
    Explicit,
    Implicit,
    LegacyRequired,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnumType {
    Open,
    Closed,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepeatedFieldEncoding {
    Packed,
    Expanded,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Utf8Validation {
    Verify,
    None,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageEncoding {
    LengthPrefixed,
    Delimited,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JsonFormat {
    Allow,
    LegacyBestEffort,
}

/// Sparse feature overrides as written in options.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureSet {
    pub field_presence: Option<FieldPresence>,
    pub enum_type: Option<EnumType>,
    pub repeated_field_encoding: Option<RepeatedFieldEncoding>,
    pub utf8_validation: Option<Utf8Validation>,
    pub message_encoding: Option<MessageEncoding>,
    pub json_format: Option<JsonFormat>,
}

/// Feature set with every feature decided.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ResolvedFeatures {
    pub field_presence: FieldPresence,
    pub enum_type: EnumType,
    pub repeated_field_encoding: RepeatedFieldEncoding,
    pub utf8_validation: Utf8Validation,
    pub message_encoding: MessageEncoding,
    pub json_format: JsonFormat,
}

impl ResolvedFeatures {
    /// Applies the overrides present in `set`.
    pub fn merge(mut self, set: &FeatureSet) -> Self {
        if let Some(v) = set.field_presence {
            self.field_presence = v;
        }
        if let Some(v) = set.enum_type {
            self.enum_type = v;
        }
        if let Some(v) = set.repeated_field_encoding {
            self.repeated_field_encoding = v;
        }
        if let Some(v) = set.utf8_validation {
            self.utf8_validation = v;
        }
        if let Some(v) = set.message_encoding {
            self.message_encoding = v;
        }
        if let Some(v) = set.json_format {
            self.json_format = v;
        }
        self
    }

    fn from_layers(fixed: &FeatureSet, overridable: &FeatureSet) -> Option<Self> {
        Some(Self {
            field_presence: fixed.field_presence.or(overridable.field_presence)?,
            enum_type: fixed.enum_type.or(overridable.enum_type)?,
            repeated_field_encoding: fixed
                .repeated_field_encoding
                .or(overridable.repeated_field_encoding)?,
            utf8_validation: fixed.utf8_validation.or(overridable.utf8_validation)?,
            message_encoding: fixed.message_encoding.or(overridable.message_encoding)?,
            json_format: fixed.json_format.or(overridable.json_format)?,
        })
    }
}

/// Defaults of one edition, split the way `protoc` emits them.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSetEditionDefault {
    pub edition: Edition,
    #[serde(default)]
    pub overridable_features: FeatureSet,
    #[serde(default)]
    pub fixed_features: FeatureSet,
}

/// Per-edition default feature bundles, sorted by edition.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSetDefaults {
    pub defaults: Vec<FeatureSetEditionDefault>,
    pub minimum_edition: Edition,
    pub maximum_edition: Edition,
}

impl FeatureSetDefaults {
    /// The defaults shipped with the crate.
    pub fn embedded() -> &'static FeatureSetDefaults {
        static DEFAULTS: OnceLock<FeatureSetDefaults> = OnceLock::new();
        DEFAULTS.get_or_init(|| {
            Self::from_json(EMBEDDED_DEFAULTS).expect("embedded feature defaults are valid")
        })
    }

    pub fn from_json(json: &str) -> Result<Self, DefaultsError> {
        let defaults: Self =
            serde_json::from_str(json).map_err(|e| DefaultsError::Parse(e.to_string()))?;
        defaults.validate()?;
        Ok(defaults)
    }

    /// Reads the `postcard` encoding produced by [`FeatureSetDefaults::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DefaultsError> {
        let defaults: Self =
            postcard::from_bytes(bytes).map_err(|e| DefaultsError::Parse(e.to_string()))?;
        defaults.validate()?;
        Ok(defaults)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).expect("serialization should not fail")
    }

    /// Checks ordering, the edition range and that every entry is complete.
    pub fn validate(&self) -> Result<(), DefaultsError> {
        let (min, max) = (self.minimum_edition, self.maximum_edition);
        if min > max {
            return Err(DefaultsError::InvalidRange { min, max });
        }
        if self.defaults.windows(2).any(|w| w[0].edition >= w[1].edition) {
            return Err(DefaultsError::Unsorted);
        }
        for entry in &self.defaults {
            if ResolvedFeatures::from_layers(&entry.fixed_features, &entry.overridable_features)
                .is_none()
            {
                return Err(DefaultsError::Incomplete(entry.edition));
            }
        }
        self.entry_for(min).ok_or(DefaultsError::Uncovered(min))?;
        Ok(())
    }

    fn entry_for(&self, edition: Edition) -> Option<&FeatureSetEditionDefault> {
        self.defaults.iter().rev().find(|d| d.edition <= edition)
    }

    /// Fully resolved defaults for `edition`, or `None` when it is outside
    /// the supported range.
    pub fn resolve(&self, edition: Edition) -> Option<ResolvedFeatures> {
        if edition < self.minimum_edition || edition > self.maximum_edition {
            return None;
        }
        let entry = self.entry_for(edition)?;
        ResolvedFeatures::from_layers(&entry.fixed_features, &entry.overridable_features)
    }
}
