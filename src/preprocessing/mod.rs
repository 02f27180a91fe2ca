//! Request normalization
//!
//! Turns loosely-typed request payloads into tables whose columns match the
//! feature schema exactly, in schema order:
//! - Strict single-record entry: every field required and range-checked
//! - Loose batch entry: extra keys dropped, only column presence checked
//! - Frame projection shared by the batch path and tabular file input
//!
//! Nothing here touches the model; every rejection happens before scoring.

mod batch;
mod record;

pub use batch::{normalize_batch, project_to_schema};
pub use record::normalize_record;
