//! Limero values: the universal message payload.
//!
//! - `Value`: a shared, mutable tree of null, bools, numbers, strings, bytes,
//!   maps and arrays, addressed by key or by `Path`
//! - `Snapshot`: an immutable deep copy that may cross threads and actors
//! - `FromValue`: checked extraction into Rust types
//!
//! Reads never mutate; writes create whatever containers the path needs.
//!
//! # Example
//!
//! ```rust
//! use limero_value::{path, Value};
//!
//! let props = Value::map();
//! props.set_path(&path!("led/blink_ms"), 500).unwrap();
//! props.set_path(&path!("led/color"), "green").unwrap();
//!
//! let snapshot = props.freeze();
//! std::thread::spawn(move || {
//!     assert_eq!(snapshot.to_string(), r#"{"led":{"blink_ms":500,"color":"green"}}"#);
//! })
//! .join()
//! .unwrap();
//! ```

mod error;
mod extract;
mod path;
mod snapshot;
mod text;
mod value;

pub use error::ValueError;
pub use extract::FromValue;
pub use path::{Key, Path, PathError};
pub use snapshot::{Frozen, Snapshot};
pub use value::{Kind, Value, MAX_ARRAY_GAP};
