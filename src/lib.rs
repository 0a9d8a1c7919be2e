//! # xsdump
//!
//! Dumps the effective structure of an XML Schema (XSD) document (root
//! elements, named complex and simple types, attributes, content models and
//! facet restrictions) as a canonical, order-independent JSON document.
//!
//! The canonical form is an equality oracle: two independent schema
//! processors can each dump the same schema and be compared byte-for-byte,
//! without agreeing on internal representations or source ordering. All
//! object keys are globally sorted, all lists of declarations are sorted by
//! name, and every optional field has a documented default or omission rule.
//!
//! ## Example
//!
//! ```rust,ignore
//! use xsdump::loader::SchemaLoader;
//! use xsdump::dump::dump_schema;
//!
//! let schema = SchemaLoader::new().load("path/to/schema.xsd")?;
//! let json = dump_schema(&schema).to_canonical_json(true)?;
//! println!("{}", json);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

pub mod namespaces;

pub mod documents;
pub mod locations;

pub mod catalog;

pub mod loader;
pub mod model;

pub mod dump;

// Re-exports for convenience
pub use error::{Error, Result};

/// Version of the xsdump crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XML Schema namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
