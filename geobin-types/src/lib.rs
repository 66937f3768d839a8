//! # geobin-types
//!
//! Plain data types shared by the geobin binning pipeline.
//!
//! - **Records**: `FieldValue`, `RecordTable` (inbound rows with named columns)
//! - **Points**: `Point` (validated coordinate plus auxiliary fields)
//! - **Colors**: `Rgb` (8-bit color, serialized as `[r, g, b]`)
//! - **View**: `ViewState` (initial map camera)
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use geobin_types::record::{FieldValue, RecordTable};
//!
//! let mut table = RecordTable::new(vec!["lat".into(), "lon".into()]);
//! table.push_row(vec![FieldValue::from(35.68), FieldValue::from(139.76)]);
//! assert_eq!(table.len(), 1);
//! ```

pub mod color;
pub mod point;
pub mod record;
pub mod view;
