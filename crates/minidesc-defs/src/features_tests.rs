use crate::features::{
    EnumType, FeatureSet, FeatureSetEditionDefault, FieldPresence, MessageEncoding,
    RepeatedFieldEncoding, Utf8Validation,
};
use crate::{DefaultsError, Edition, FeatureSetDefaults};

fn complete() -> FeatureSet {
    FeatureSet {
        field_presence: Some(FieldPresence::Explicit),
        enum_type: Some(EnumType::Closed),
        repeated_field_encoding: Some(RepeatedFieldEncoding::Expanded),
        utf8_validation: Some(Utf8Validation::None),
        message_encoding: Some(MessageEncoding::LengthPrefixed),
        json_format: Some(crate::features::JsonFormat::LegacyBestEffort),
    }
}

fn entry(edition: Edition, fixed: FeatureSet) -> FeatureSetEditionDefault {
    FeatureSetEditionDefault {
        edition,
        overridable_features: FeatureSet::default(),
        fixed_features: fixed,
    }
}

#[test]
fn embedded_proto2() {
    let features = FeatureSetDefaults::embedded().resolve(Edition::Proto2).unwrap();
    insta::assert_snapshot!(format!("{features:#?}"), @r"
    ResolvedFeatures {
        field_presence: Explicit,
        enum_type: Closed,
        repeated_field_encoding: Expanded,
        utf8_validation: None,
        message_encoding: LengthPrefixed,
        json_format: LegacyBestEffort,
    }
    ");
}

#[test]
fn embedded_editions() {
    let defaults = FeatureSetDefaults::embedded();

    let proto3 = defaults.resolve(Edition::Proto3).unwrap();
    assert_eq!(proto3.field_presence, FieldPresence::Implicit);
    assert_eq!(proto3.enum_type, EnumType::Open);
    assert_eq!(proto3.utf8_validation, Utf8Validation::Verify);

    let e2023 = defaults.resolve(Edition::Edition2023).unwrap();
    assert_eq!(e2023.field_presence, FieldPresence::Explicit);
    assert_eq!(e2023.repeated_field_encoding, RepeatedFieldEncoding::Packed);

    // 2024 has no entry of its own.
    assert_eq!(defaults.resolve(Edition::Edition2024), Some(e2023));
    assert_eq!(defaults.resolve(Edition::Legacy), None);
}

#[test]
fn merge_only_touches_set_features() {
    let base = FeatureSetDefaults::embedded().resolve(Edition::Edition2023).unwrap();
    let merged = base.merge(&FeatureSet {
        enum_type: Some(EnumType::Closed),
        message_encoding: Some(MessageEncoding::Delimited),
        ..FeatureSet::default()
    });

    assert_eq!(merged.enum_type, EnumType::Closed);
    assert_eq!(merged.message_encoding, MessageEncoding::Delimited);
    assert_eq!(merged.field_presence, base.field_presence);
    assert_eq!(merged.json_format, base.json_format);
    assert_eq!(base.merge(&FeatureSet::default()), base);
}

#[test]
fn fixed_features_win_over_overridable() {
    let defaults = FeatureSetDefaults {
        defaults: vec![FeatureSetEditionDefault {
            edition: Edition::Proto2,
            overridable_features: complete(),
            fixed_features: FeatureSet {
                field_presence: Some(FieldPresence::Implicit),
                ..FeatureSet::default()
            },
        }],
        minimum_edition: Edition::Proto2,
        maximum_edition: Edition::Proto3,
    };
    let resolved = defaults.resolve(Edition::Proto3).unwrap();
    assert_eq!(resolved.field_presence, FieldPresence::Implicit);
    assert_eq!(resolved.enum_type, EnumType::Closed);
}

#[test]
fn validation() {
    let defaults = |entries, min, max| FeatureSetDefaults {
        defaults: entries,
        minimum_edition: min,
        maximum_edition: max,
    };

    let unsorted = defaults(
        vec![entry(Edition::Proto3, complete()), entry(Edition::Proto2, complete())],
        Edition::Proto2,
        Edition::Proto3,
    );
    assert_eq!(unsorted.validate(), Err(DefaultsError::Unsorted));

    let incomplete = defaults(
        vec![entry(Edition::Proto2, FeatureSet::default())],
        Edition::Proto2,
        Edition::Proto3,
    );
    assert_eq!(
        incomplete.validate(),
        Err(DefaultsError::Incomplete(Edition::Proto2))
    );

    let uncovered = defaults(
        vec![entry(Edition::Proto3, complete())],
        Edition::Proto2,
        Edition::Proto3,
    );
    assert_eq!(
        uncovered.validate(),
        Err(DefaultsError::Uncovered(Edition::Proto2))
    );

    let backwards = defaults(
        vec![entry(Edition::Proto2, complete())],
        Edition::Proto3,
        Edition::Proto2,
    );
    assert!(matches!(
        backwards.validate(),
        Err(DefaultsError::InvalidRange { .. })
    ));
}

#[test]
fn json_names() {
    let set: FeatureSet = serde_json::from_str(
        r#"{"fieldPresence": "LEGACY_REQUIRED", "repeatedFieldEncoding": "EXPANDED"}"#,
    )
    .unwrap();
    assert_eq!(set.field_presence, Some(FieldPresence::LegacyRequired));
    assert_eq!(set.repeated_field_encoding, Some(RepeatedFieldEncoding::Expanded));
    assert_eq!(set.enum_type, None);

    let edition: Edition = serde_json::from_str(r#""EDITION_2024""#).unwrap();
    assert_eq!(edition, Edition::Edition2024);
    assert!(Edition::Proto3 < Edition::Edition2023);

    let err = FeatureSetDefaults::from_json(r#"{"defaults": []}"#).unwrap_err();
    assert!(matches!(err, DefaultsError::Parse(_)), "{err:?}");
}
