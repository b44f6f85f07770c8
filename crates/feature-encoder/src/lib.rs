//! Feature Encoding
//!
//! Turns one raw bike-sharing record into the fixed-order numeric vector a
//! trained regressor expects. Hour, month, weekday and day-of-month are encoded
//! as sine/cosine pairs, season and weather as one-hot indicators, and the
//! result is projected onto a [`Schema`] captured at training time.

mod cyclic;
mod encoder;
mod one_hot;
mod record;
mod schema;

pub use cyclic::{encode_cyclic, CyclicField, CYCLIC_FIELDS};
pub use encoder::{assemble, encode_record, FeatureVector, PASSTHROUGH_FIELDS};
pub use one_hot::{one_hot, Vocabulary, SEASONS, WEATHER_SITUATIONS};
pub use record::{canonical_field_name, fields, FieldValue, RawRecord};
pub use schema::{Schema, SchemaError, TARGET_COLUMNS};
