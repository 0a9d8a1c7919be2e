//! Resolved schema object model
//!
//! The immutable object graph the dump pipeline consumes. It carries the
//! structural subset of an XSD needed for comparison: global elements, named
//! complex and simple types, attribute declarations, compositor groups and
//! facet tables. It deliberately does not model validation machinery
//! (wildcards, identity constraints, derivation resolution).
//!
//! Global tables are keyed by the declaration's Clark-notation name, so
//! `BTreeMap` iteration is already in the name-sorted order the dump output
//! requires. Facet tables use `IndexMap` because facet order in the source
//! document is semantic and must survive into the output.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;

use crate::namespaces::QName;

/// Occurrence constraints for a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum occurrences
    pub min: u32,
    /// Maximum occurrences (None means unbounded)
    pub max: Option<u32>,
}

impl Default for Occurs {
    fn default() -> Self {
        Self {
            min: 1,
            max: Some(1),
        }
    }
}

impl Occurs {
    /// Parse from `minOccurs`/`maxOccurs` attribute values, applying the
    /// XSD defaults (1/1) for absent or unparseable values.
    pub fn from_attributes(min: Option<&str>, max: Option<&str>) -> Self {
        let min = min.and_then(|v| v.parse().ok()).unwrap_or(1);
        let max = match max {
            Some("unbounded") => None,
            Some(v) => Some(v.parse().unwrap_or(1)),
            None => Some(1),
        };
        Self { min, max }
    }
}

/// Attribute use mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUse {
    /// The attribute may appear (default)
    #[default]
    Optional,
    /// The attribute must appear
    Required,
    /// The attribute must not appear
    Prohibited,
}

impl AttributeUse {
    /// Parse from the `use` attribute value
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "optional" => Some(Self::Optional),
            "required" => Some(Self::Required),
            "prohibited" => Some(Self::Prohibited),
            _ => None,
        }
    }

    /// The string form used in the dump output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optional => "optional",
            Self::Required => "required",
            Self::Prohibited => "prohibited",
        }
    }
}

/// Form default for element declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormDefault {
    /// Unqualified (the XSD default)
    #[default]
    Unqualified,
    /// Qualified
    Qualified,
}

impl FormDefault {
    /// Parse from the `elementFormDefault` attribute value
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "qualified" => Some(Self::Qualified),
            "unqualified" => Some(Self::Unqualified),
            _ => None,
        }
    }
}

impl fmt::Display for FormDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qualified => write!(f, "qualified"),
            Self::Unqualified => write!(f, "unqualified"),
        }
    }
}

/// An attribute declaration attached to a complex type
#[derive(Debug, Clone, PartialEq)]
pub struct XsdAttribute {
    /// Attribute local name (None when the declaration is a bare ref the
    /// loader could not resolve)
    pub name: Option<String>,
    /// Declared type reference (None for untyped declarations)
    pub type_name: Option<QName>,
    /// Use mode
    pub use_mode: AttributeUse,
    /// Default value
    pub default: Option<String>,
}

/// Compositor kind of a model group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// xs:sequence
    Sequence,
    /// xs:choice
    Choice,
    /// xs:all
    All,
}

impl ModelType {
    /// Match an XSD compositor element's local name
    pub fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "sequence" => Some(Self::Sequence),
            "choice" => Some(Self::Choice),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// A particle inside a model group
#[derive(Debug, Clone, PartialEq)]
pub enum GroupParticle {
    /// An element declaration or reference
    Element(ElementParticle),
    /// A nested compositor group
    Group(XsdGroup),
}

/// An element particle inside a content model
#[derive(Debug, Clone, PartialEq)]
pub struct ElementParticle {
    /// Element name (qualified when the schema's target namespace applies)
    pub name: Option<QName>,
    /// Declared type reference
    pub type_ref: Option<QName>,
    /// Occurrence constraints
    pub occurs: Occurs,
}

/// A model group (content model) of a complex type
#[derive(Debug, Clone, PartialEq)]
pub struct XsdGroup {
    /// Compositor kind
    pub model: ModelType,
    /// Particles in declaration order
    pub particles: Vec<GroupParticle>,
}

impl XsdGroup {
    /// Iterate all element particles, flattening nested groups into one
    /// ordered sequence. Occurrence information comes from the innermost
    /// element declaration.
    pub fn iter_elements(&self) -> Vec<&ElementParticle> {
        let mut out = Vec::new();
        collect_elements(&self.particles, &mut out);
        out
    }
}

fn collect_elements<'a>(particles: &'a [GroupParticle], out: &mut Vec<&'a ElementParticle>) {
    for particle in particles {
        match particle {
            GroupParticle::Element(ep) => out.push(ep),
            GroupParticle::Group(group) => collect_elements(&group.particles, out),
        }
    }
}

/// A facet value in a simple type's facet table
#[derive(Debug, Clone, PartialEq)]
pub enum FacetValue {
    /// Accumulated xs:enumeration values
    Enumeration(Vec<String>),
    /// xs:pattern expression
    Pattern(String),
    /// A numeric length bound (minLength/maxLength/length)
    Bound(u64),
    /// A facet the loader records but the dump does not interpret
    /// (whiteSpace, minInclusive, ...)
    Literal(String),
}

/// Facet table, keyed by facet name in schema document order
pub type FacetMap = IndexMap<String, FacetValue>;

/// Variety of a simple type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleVariety {
    /// Atomic value space, usually an xs:restriction
    Atomic,
    /// xs:list
    List,
    /// xs:union
    Union,
}

/// A simple type definition
#[derive(Debug, Clone, PartialEq)]
pub struct XsdSimpleType {
    /// Type name (None for anonymous inline types)
    pub name: Option<QName>,
    /// Variety
    pub variety: SimpleVariety,
    /// Base type (restriction base, or list item type); None for root
    /// primitives and unions
    pub base_type: Option<QName>,
    /// Restriction facets in document order
    pub facets: FacetMap,
}

/// A complex type definition
#[derive(Debug, Clone, PartialEq)]
pub struct XsdComplexType {
    /// Type name (None for anonymous inline types)
    pub name: Option<QName>,
    /// Content model (None for empty content)
    pub content: Option<XsdGroup>,
    /// Attribute declarations in source order
    pub attributes: Vec<XsdAttribute>,
}

/// A named global type
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalType {
    /// A complex type
    Complex(XsdComplexType),
    /// A simple type
    Simple(XsdSimpleType),
}

impl GlobalType {
    /// The type's declared name, if any
    pub fn name(&self) -> Option<&QName> {
        match self {
            Self::Complex(ct) => ct.name.as_ref(),
            Self::Simple(st) => st.name.as_ref(),
        }
    }
}

/// How an element declaration refers to its type
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    /// A reference to a named (global or builtin) type
    Named(QName),
    /// An anonymous inline type definition
    Inline(Box<GlobalType>),
    /// The declaration carries no type
    Unspecified,
}

/// A global element declaration
#[derive(Debug, Clone, PartialEq)]
pub struct XsdElement {
    /// Element qualified name
    pub name: QName,
    /// Type of the element
    pub element_type: ElementType,
    /// Occurrence constraints
    pub occurs: Occurs,
    /// Whether xsi:nil is permitted
    pub nillable: bool,
    /// Default value
    pub default: Option<String>,
}

/// A resolved schema: the immutable object graph a dump is taken from
#[derive(Debug, Clone, Default)]
pub struct XsdSchema {
    /// Target namespace
    pub target_namespace: Option<String>,
    /// Location the schema was loaded from
    pub location: Option<String>,
    /// Declared elementFormDefault (None when the document does not set it)
    pub element_form_default: Option<FormDefault>,
    /// Global element declarations, keyed by Clark-notation name
    pub elements: BTreeMap<String, XsdElement>,
    /// Named type definitions, keyed by Clark-notation name
    pub types: BTreeMap<String, GlobalType>,
}

impl XsdSchema {
    /// Look up a named type
    pub fn lookup_type(&self, name: &QName) -> Option<&GlobalType> {
        self.types.get(&name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurs_defaults() {
        let occurs = Occurs::from_attributes(None, None);
        assert_eq!(occurs, Occurs::default());
        assert_eq!(occurs.min, 1);
        assert_eq!(occurs.max, Some(1));
    }

    #[test]
    fn test_occurs_unbounded() {
        let occurs = Occurs::from_attributes(Some("0"), Some("unbounded"));
        assert_eq!(occurs.min, 0);
        assert_eq!(occurs.max, None);
    }

    #[test]
    fn test_attribute_use_parsing() {
        assert_eq!(AttributeUse::from_str("required"), Some(AttributeUse::Required));
        assert_eq!(AttributeUse::from_str("bogus"), None);
        assert_eq!(AttributeUse::default().as_str(), "optional");
    }

    #[test]
    fn test_group_flattening() {
        let inner = XsdGroup {
            model: ModelType::Choice,
            particles: vec![GroupParticle::Element(ElementParticle {
                name: Some(QName::local("b")),
                type_ref: None,
                occurs: Occurs::default(),
            })],
        };
        let outer = XsdGroup {
            model: ModelType::Sequence,
            particles: vec![
                GroupParticle::Element(ElementParticle {
                    name: Some(QName::local("a")),
                    type_ref: None,
                    occurs: Occurs::default(),
                }),
                GroupParticle::Group(inner),
                GroupParticle::Element(ElementParticle {
                    name: Some(QName::local("c")),
                    type_ref: None,
                    occurs: Occurs::default(),
                }),
            ],
        };

        let names: Vec<_> = outer
            .iter_elements()
            .iter()
            .map(|e| e.name.as_ref().unwrap().local_name.clone())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_schema_type_lookup() {
        let mut schema = XsdSchema::default();
        let qname = QName::namespaced("http://example.com", "OrderType");
        schema.types.insert(
            qname.to_string(),
            GlobalType::Complex(XsdComplexType {
                name: Some(qname.clone()),
                content: None,
                attributes: Vec::new(),
            }),
        );

        assert!(schema.lookup_type(&qname).is_some());
        assert!(schema
            .lookup_type(&QName::namespaced("http://example.com", "Missing"))
            .is_none());
    }
}
