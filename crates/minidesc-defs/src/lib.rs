#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Reflective descriptor defs built on mini tables.
//!
//! - **Pool**: [`DefPool`] owns every file, def and table, keyed by full name
//! - **Builder**: turns a [`FileDescriptorProto`] into defs, mini tables and links
//! - **Defs**: borrowed views such as [`MessageDef`] and [`FieldDef`]
//! - **Features**: edition defaults and their resolution down to each field
//!
//! ```
//! use minidesc_defs::{DefPool, FileDescriptorProto};
//!
//! let proto = FileDescriptorProto::from_json(r#"{
//!     "name": "point.proto",
//!     "package": "geo",
//!     "messageType": [{
//!         "name": "Point",
//!         "field": [
//!             {"name": "x", "number": 1, "label": "LABEL_OPTIONAL", "type": "TYPE_INT32"},
//!             {"name": "y", "number": 2, "label": "LABEL_OPTIONAL", "type": "TYPE_INT32"}
//!         ]
//!     }]
//! }"#).unwrap();
//!
//! let mut pool = DefPool::new();
//! pool.add_file(&proto).unwrap();
//! let point = pool.find_message("geo.Point").unwrap();
//! assert_eq!(point.mini_table().field_count(), 2);
//! ```

mod builder;
mod default_value;
mod defs;
mod error;
pub mod features;
mod ids;
mod pool;
pub mod proto;
mod symbol;

#[cfg(test)]
mod features_tests;
#[cfg(test)]
mod pool_tests;
#[cfg(test)]
mod test_utils;

pub use builder::FileLayout;
pub use default_value::DefaultValue;
pub use defs::{
    EnumDef, EnumValueDef, FieldDef, FileDef, MessageDef, MethodDef, OneofDef, ServiceDef,
};
pub use error::{BuildError, DefaultsError};
pub use features::{Edition, FeatureSet, FeatureSetDefaults, ResolvedFeatures};
pub use ids::{EnumId, EnumValueId, FieldId, FileId, MessageId, MethodId, OneofId, ServiceId};
pub use pool::{DefPool, PoolConfig};
pub use proto::{FileDescriptorProto, FileDescriptorSet};
pub use symbol::DefRef;
