use indoc::indoc;
use minidesc_table::{ErrorCategory, MiniTableId};

use crate::test_utils::{empty_pool, pool_of, proto};
use crate::{DefPool, DefRef, DefaultsError, Edition, FeatureSetDefaults, FileDescriptorSet};

const GEO: &str = indoc! {r#"
    {
      "name": "geo.proto",
      "package": "geo",
      "messageType": [{
        "name": "Point",
        "field": [
          {"name": "x", "number": 1, "label": "LABEL_OPTIONAL", "type": "TYPE_SINT32"},
          {"name": "y", "number": 2, "label": "LABEL_OPTIONAL", "type": "TYPE_SINT32"}
        ]
      }],
      "enumType": [{"name": "Axis", "value": [{"name": "AXIS_X", "number": 0}, {"name": "AXIS_Y", "number": 1}]}],
      "service": [{
        "name": "Locator",
        "method": [{"name": "Locate", "inputType": "Point", "outputType": "Point"}]
      }]
    }
"#};

const ROUTE: &str = indoc! {r#"
    {
      "name": "route.proto",
      "package": "geo.route",
      "dependency": ["geo.proto"],
      "messageType": [{
        "name": "Route",
        "field": [{"name": "stops", "number": 1, "label": "LABEL_REPEATED", "typeName": "geo.Point"}]
      }]
    }
"#};

const EDITIONS_FILE: &str = indoc! {r#"
    {
      "name": "ed.proto",
      "syntax": "editions",
      "edition": "EDITION_2023",
      "messageType": [{"name": "E"}]
    }
"#};

// ============================================================
// Feature set defaults
// ============================================================

#[test]
fn defaults_freeze_once_a_file_is_added() {
    let mut pool = empty_pool();
    let defaults = FeatureSetDefaults::embedded().clone();
    pool.set_feature_set_defaults(defaults.clone(), Edition::Proto2, Edition::Edition2023)
        .unwrap();
    assert_eq!(
        pool.feature_set_defaults().maximum_edition,
        Edition::Edition2023
    );

    pool.add_file(&proto(GEO)).unwrap();
    assert_eq!(
        pool.set_feature_set_defaults(defaults, Edition::Proto2, Edition::Proto3),
        Err(DefaultsError::FrozenDefaults)
    );
}

#[test]
fn failed_files_freeze_defaults_too() {
    let mut pool = empty_pool();
    assert!(pool.add_file_json("{").is_err());
    assert!(pool.add_file(&proto(r#"{"name": ""}"#)).is_err());
    assert_eq!(
        pool.set_serialized_feature_set_defaults(&[], Edition::Proto2, Edition::Proto3),
        Err(DefaultsError::FrozenDefaults)
    );
}

#[test]
fn edition_range_must_be_ordered_and_covered() {
    let mut pool = empty_pool();
    let defaults = FeatureSetDefaults::embedded();

    let err = pool
        .set_feature_set_defaults(defaults.clone(), Edition::Edition2023, Edition::Proto3)
        .unwrap_err();
    assert!(matches!(err, DefaultsError::InvalidRange { .. }), "{err:?}");

    // Defaults start at proto2.
    let err = pool
        .set_feature_set_defaults(defaults.clone(), Edition::Legacy, Edition::Proto3)
        .unwrap_err();
    assert_eq!(
        err,
        DefaultsError::InvalidRange {
            min: Edition::Legacy,
            max: Edition::Proto3
        }
    );

    assert_eq!(pool.feature_set_defaults(), defaults);
}

#[test]
fn narrowed_editions_reject_newer_files() {
    let mut pool = empty_pool();
    pool.set_feature_set_defaults(
        FeatureSetDefaults::embedded().clone(),
        Edition::Proto2,
        Edition::Proto3,
    )
    .unwrap();

    let err = pool.add_file(&proto(EDITIONS_FILE)).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Malformed);
    assert!(err.message().contains("not supported"), "{err}");
    assert!(pool.find_message("E").is_none());
}

#[test]
fn serialized_defaults() {
    let bytes = FeatureSetDefaults::embedded().to_bytes();

    let mut pool = empty_pool();
    pool.set_serialized_feature_set_defaults(&bytes, Edition::Proto2, Edition::Edition2024)
        .unwrap();
    assert_eq!(pool.feature_set_defaults(), FeatureSetDefaults::embedded());
    pool.add_file(&proto(EDITIONS_FILE)).unwrap();

    let mut pool = empty_pool();
    let err = pool
        .set_serialized_feature_set_defaults(&[0xff, 0xff], Edition::Proto2, Edition::Proto3)
        .unwrap_err();
    assert!(matches!(err, DefaultsError::Parse(_)), "{err:?}");
}

// ============================================================
// Adding files
// ============================================================

#[test]
fn file_contents() {
    let pool = pool_of(&[GEO, ROUTE]);
    assert_eq!(pool.file_count(), 2);

    let names: Vec<_> = pool.files().map(|f| f.name()).collect();
    assert_eq!(names, ["geo.proto", "route.proto"]);

    let route = pool.find_file("route.proto").unwrap();
    assert_eq!(route.package(), "geo.route");
    assert_eq!(route.edition(), Edition::Proto2);
    let deps: Vec<_> = route.dependencies().map(|f| f.name()).collect();
    assert_eq!(deps, ["geo.proto"]);

    let geo = pool.find_file("geo.proto").unwrap();
    assert_eq!(geo.messages().len(), 1);
    assert_eq!(geo.enums().len(), 1);
    assert_eq!(geo.services().len(), 1);
    assert_eq!(geo.extensions().len(), 0);
}

#[test]
fn serialized_files() {
    let bytes = proto(GEO).to_binary();
    let mut pool = empty_pool();
    let file = pool.add_serialized_file(&bytes).unwrap();
    assert_eq!(file.name(), "geo.proto");

    let err = pool.add_serialized_file(&[0xff]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Malformed);
    assert_eq!(pool.file_count(), 1);
}

#[test]
fn json_files() {
    let mut pool = empty_pool();
    let point = pool.add_file_json(GEO).unwrap().messages().next().unwrap().full_name();
    assert_eq!(point, "geo.Point");

    let err = pool.add_file_json(r#"{"name": 7}"#).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Malformed);
    assert!(err.message().starts_with("invalid file JSON"), "{err}");
    assert_eq!(pool.file_count(), 1);
}

#[test]
fn file_sets_stop_at_the_first_failure() {
    let set = FileDescriptorSet {
        file: vec![proto(GEO), proto(ROUTE)],
    };
    let mut pool = empty_pool();
    let ids = pool.add_file_set(&set).unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(pool.file(ids[1]).name(), "route.proto");

    let broken = FileDescriptorSet {
        file: vec![
            proto(GEO),
            proto(r#"{"name": "lost.proto", "dependency": ["missing.proto"]}"#),
            proto(ROUTE),
        ],
    };
    let mut pool = empty_pool();
    let err = pool.add_file_set(&broken).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Unresolved);
    assert!(pool.find_file("geo.proto").is_some());
    assert!(pool.find_file("lost.proto").is_none());
    assert!(pool.find_file("route.proto").is_none());
}

#[test]
fn file_sets_load_from_binary() {
    let set = FileDescriptorSet {
        file: vec![proto(GEO), proto(ROUTE)],
    };
    let set = FileDescriptorSet::from_binary(&set.to_binary()).unwrap();
    let mut pool = empty_pool();
    pool.add_file_set(&set).unwrap();
    assert!(pool.find_message("geo.route.Route").is_some());
}

// ============================================================
// Lookups
// ============================================================

#[test]
fn symbols_of_every_kind() {
    let pool = pool_of(&[GEO]);

    assert!(matches!(pool.find_symbol("geo.Point"), Some(DefRef::Message(_))));
    assert!(matches!(pool.find_symbol("geo.Axis"), Some(DefRef::Enum(_))));
    assert!(matches!(pool.find_symbol("geo.AXIS_Y"), Some(DefRef::EnumValue(_))));
    assert!(matches!(pool.find_symbol("geo.Locator"), Some(DefRef::Service(_))));
    assert_eq!(pool.find_symbol("geo.Point.x"), None);
    assert_eq!(pool.find_symbol(".geo.Point"), None);

    assert_eq!(pool.find_enum_value("geo.AXIS_Y").unwrap().number(), 1);
    assert!(pool.find_message("geo.Axis").is_none());
    assert!(pool.find_enum("geo.Point").is_none());

    let locate = pool.find_service("geo.Locator").unwrap().methods().next().unwrap();
    assert_eq!(locate.full_name(), "geo.Locator.Locate");
    assert_eq!(locate.input_type().unwrap().full_name(), "geo.Point");
}

#[test]
fn messages_by_mini_table() {
    let pool = pool_of(&[GEO, ROUTE]);
    for name in ["geo.Point", "geo.route.Route"] {
        let msg = pool.find_message(name).unwrap();
        assert_eq!(pool.find_message_by_mini_table(msg.mini_table_id()), Some(msg));
    }
    assert!(pool.find_message_by_mini_table(MiniTableId::EMPTY).is_none());
}

#[test]
fn hash_seed_does_not_change_lookups() {
    for seed in [0, 1, u64::MAX] {
        let mut pool = DefPool::with_config(crate::PoolConfig {
            hash_seed: Some(seed),
            ..Default::default()
        });
        pool.add_file(&proto(GEO)).unwrap();
        assert_eq!(pool.find_message("geo.Point").unwrap().field_count(), 2);
        assert!(pool.find_file("geo.proto").is_some());
    }
}
