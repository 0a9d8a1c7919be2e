//! Descriptor records for the canonical schema dump
//!
//! These structures define the JSON output format shared by both sides of a
//! schema-processor comparison. The shapes are fixed: key omission rules,
//! default values and the category vocabulary are part of the contract, so
//! two implementations can be diffed byte-for-byte.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;
use crate::namespaces::QName;
use crate::XSD_NAMESPACE;

/// Complete schema dump document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SchemaDump {
    /// Target namespace of the schema
    pub target_namespace: Option<String>,

    /// Schema location (file path or URL)
    pub schema_location: Option<String>,

    /// Declared form for elements (qualified/unqualified)
    pub element_form_default: Option<String>,

    /// Root element declarations, sorted by declared name
    pub root_elements: Vec<ElementInfo>,

    /// Named complex type definitions, sorted by declared name
    pub complex_types: Vec<TypeInfo>,

    /// Named simple type definitions, sorted by declared name
    pub simple_types: Vec<SimpleTypeInfo>,
}

impl SchemaDump {
    /// Render the dump as canonical JSON.
    ///
    /// Object keys are globally sorted at every nesting level: the value
    /// tree is built through `serde_json::to_value`, whose object map is
    /// ordered by key. `pretty` indents with two spaces, otherwise the
    /// output is a single line.
    pub fn to_canonical_json(&self, pretty: bool) -> Result<String> {
        let value = serde_json::to_value(self)?;
        let rendered = if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(rendered)
    }
}

/// Closed classifier over the XSD type categories the dump distinguishes.
///
/// Serialized with the type-class vocabulary both comparison sides agree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeCategory {
    /// A complex type
    #[serde(rename = "XsdComplexType")]
    ComplexType,
    /// A builtin atomic type from the XML Schema namespace
    #[serde(rename = "XsdAtomicBuiltin")]
    AtomicBuiltin,
    /// An atomic simple type derived by restriction
    #[serde(rename = "XsdAtomicRestriction")]
    AtomicRestriction,
    /// A list simple type
    #[serde(rename = "XsdList")]
    List,
    /// A union simple type
    #[serde(rename = "XsdUnion")]
    Union,
}

impl TypeCategory {
    /// The serialized vocabulary string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComplexType => "XsdComplexType",
            Self::AtomicBuiltin => "XsdAtomicBuiltin",
            Self::AtomicRestriction => "XsdAtomicRestriction",
            Self::List => "XsdList",
            Self::Union => "XsdUnion",
        }
    }

    /// True exactly for the complex category
    pub fn is_complex(&self) -> bool {
        matches!(self, Self::ComplexType)
    }

    /// True for every simple category; complement of `is_complex`
    pub fn is_simple(&self) -> bool {
        !self.is_complex()
    }
}

/// Maximum occurrence bound: a non-negative count or the unbounded sentinel.
///
/// The unbounded case serializes as the fixed literal token `"unbounded"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    /// A finite bound
    Bounded(u32),
    /// No upper bound
    Unbounded,
}

impl Default for MaxOccurs {
    fn default() -> Self {
        Self::Bounded(1)
    }
}

impl From<Option<u32>> for MaxOccurs {
    fn from(value: Option<u32>) -> Self {
        match value {
            Some(n) => Self::Bounded(n),
            None => Self::Unbounded,
        }
    }
}

impl Serialize for MaxOccurs {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Bounded(n) => serializer.serialize_u32(*n),
            Self::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

impl<'de> Deserialize<'de> for MaxOccurs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct MaxOccursVisitor;

        impl<'de> Visitor<'de> for MaxOccursVisitor {
            type Value = MaxOccurs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or the token \"unbounded\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
                u32::try_from(v)
                    .map(MaxOccurs::Bounded)
                    .map_err(|_| E::custom(format!("maxOccurs out of range: {}", v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
                u32::try_from(v)
                    .map(MaxOccurs::Bounded)
                    .map_err(|_| E::custom(format!("maxOccurs out of range: {}", v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                if v == "unbounded" {
                    Ok(MaxOccurs::Unbounded)
                } else {
                    Err(E::custom(format!("unexpected maxOccurs token: {}", v)))
                }
            }
        }

        deserializer.deserialize_any(MaxOccursVisitor)
    }
}

/// Root element descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementInfo {
    /// Element name (qualified format: {namespace}localName)
    pub name: String,

    /// Qualified name (same as name)
    pub qualified_name: String,

    /// Type information for this element (absent when the element has no
    /// resolvable type)
    #[serde(rename = "type")]
    pub element_type: Option<TypeInfo>,

    /// Minimum occurrences
    pub min_occurs: u32,

    /// Maximum occurrences
    pub max_occurs: MaxOccurs,

    /// Whether the element is nillable
    pub nillable: bool,

    /// Default value
    pub default: Option<String>,
}

/// Child element reference inside a content model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChildElementInfo {
    /// Element name (qualified format, else local name, else "unknown")
    pub name: String,

    /// Type name (qualified format, else the type's category tag)
    #[serde(rename = "type")]
    pub element_type: String,

    /// Minimum occurrences
    pub min_occurs: u32,

    /// Maximum occurrences
    pub max_occurs: MaxOccurs,
}

/// Attribute descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeInfo {
    /// Attribute name (local name; "unknown" when unresolvable)
    pub name: String,

    /// Type name (qualified format; "xs:string" when unresolvable)
    #[serde(rename = "type")]
    pub attr_type: String,

    /// Use mode: optional, required, prohibited
    #[serde(rename = "use")]
    pub use_mode: String,

    /// Default value
    pub default: Option<String>,
}

/// Type descriptor embedded in elements and listed under complex_types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeInfo {
    /// Type name (qualified format; None for anonymous types)
    pub name: Option<String>,

    /// Qualified name (same as name)
    pub qualified_name: Option<String>,

    /// Category classifier
    pub category: TypeCategory,

    /// Whether this is a complex type
    pub is_complex: bool,

    /// Whether this is a simple type (mutually exclusive with is_complex)
    pub is_simple: bool,

    /// Content model tag (absent when the type has no content)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_model: Option<String>,

    /// Attributes, sorted by name (absent when none declared)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<AttributeInfo>>,

    /// Flattened child elements (absent when none)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_elements: Option<Vec<ChildElementInfo>>,
}

impl TypeInfo {
    /// Create a descriptor for a category with the flag fields derived from
    /// the classifier, all optional sections absent.
    pub fn for_category(category: TypeCategory) -> Self {
        Self {
            name: None,
            qualified_name: None,
            category,
            is_complex: category.is_complex(),
            is_simple: category.is_simple(),
            content_model: None,
            attributes: None,
            child_elements: None,
        }
    }
}

/// Simple type descriptor listed under simple_types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimpleTypeInfo {
    /// Type name (qualified format)
    pub name: Option<String>,

    /// Qualified name (same as name)
    pub qualified_name: Option<String>,

    /// Category classifier
    pub category: TypeCategory,

    /// Base type (qualified format; absent for root primitives and unions)
    pub base_type: Option<String>,

    /// Facet restrictions in source order (key omitted when there are none)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Vec<RestrictionInfo>>,
}

/// A single facet restriction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum RestrictionInfo {
    /// Permitted literal values
    Enumeration {
        /// The literal values in source order
        values: Vec<String>,
    },
    /// A regular expression pattern
    Pattern {
        /// The pattern expression, verbatim
        value: String,
    },
    /// Minimum length bound
    MinLength {
        /// The bound
        value: u64,
    },
    /// Maximum length bound
    MaxLength {
        /// The bound
        value: u64,
    },
    /// Exact length
    Length {
        /// The length
        value: u64,
    },
}

/// Format a qualified name for the dump output.
///
/// Names in the XML Schema namespace use the conventional `xs:` prefix (so
/// the `"xs:string"` fallback is a member of the same vocabulary); all other
/// namespaced names use Clark notation `{namespace}localName`.
pub fn format_type_name(qname: &QName) -> String {
    match qname.namespace.as_deref() {
        Some(XSD_NAMESPACE) => format!("xs:{}", qname.local_name),
        Some(ns) => format!("{{{}}}{}", ns, qname.local_name),
        None => qname.local_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_type_name() {
        assert_eq!(
            format_type_name(&QName::namespaced("http://example.com", "test")),
            "{http://example.com}test"
        );
        assert_eq!(
            format_type_name(&QName::namespaced(XSD_NAMESPACE, "string")),
            "xs:string"
        );
        assert_eq!(format_type_name(&QName::local("local")), "local");
    }

    #[test]
    fn test_max_occurs_serialization() {
        assert_eq!(
            serde_json::to_string(&MaxOccurs::Bounded(3)).unwrap(),
            "3"
        );
        assert_eq!(
            serde_json::to_string(&MaxOccurs::Unbounded).unwrap(),
            "\"unbounded\""
        );

        let bounded: MaxOccurs = serde_json::from_str("1").unwrap();
        assert_eq!(bounded, MaxOccurs::Bounded(1));
        let unbounded: MaxOccurs = serde_json::from_str("\"unbounded\"").unwrap();
        assert_eq!(unbounded, MaxOccurs::Unbounded);
        assert!(serde_json::from_str::<MaxOccurs>("\"lots\"").is_err());
    }

    #[test]
    fn test_category_vocabulary() {
        assert_eq!(
            serde_json::to_string(&TypeCategory::ComplexType).unwrap(),
            "\"XsdComplexType\""
        );
        assert_eq!(
            serde_json::to_string(&TypeCategory::AtomicRestriction).unwrap(),
            "\"XsdAtomicRestriction\""
        );

        for category in [
            TypeCategory::ComplexType,
            TypeCategory::AtomicBuiltin,
            TypeCategory::AtomicRestriction,
            TypeCategory::List,
            TypeCategory::Union,
        ] {
            assert_ne!(category.is_complex(), category.is_simple());
        }
    }

    #[test]
    fn test_restriction_tagging() {
        let json = serde_json::to_value(RestrictionInfo::Enumeration {
            values: vec!["a".to_string(), "b".to_string()],
        })
        .unwrap();
        assert_eq!(json["kind"], "Enumeration");
        assert_eq!(json["values"][1], "b");

        let json = serde_json::to_value(RestrictionInfo::MinLength { value: 3 }).unwrap();
        assert_eq!(json["kind"], "MinLength");
        assert_eq!(json["value"], 3);
    }

    #[test]
    fn test_type_info_optional_keys_omitted() {
        let info = TypeInfo::for_category(TypeCategory::ComplexType);
        let json = serde_json::to_value(&info).unwrap();

        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("content_model"));
        assert!(!obj.contains_key("attributes"));
        assert!(!obj.contains_key("child_elements"));
        assert!(obj.contains_key("name"));
        assert_eq!(json["is_complex"], true);
        assert_eq!(json["is_simple"], false);
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let dump = SchemaDump {
            target_namespace: Some("http://example.com".to_string()),
            schema_location: None,
            element_form_default: Some("qualified".to_string()),
            root_elements: vec![],
            complex_types: vec![],
            simple_types: vec![],
        };

        let compact = dump.to_canonical_json(false).unwrap();
        let complex = compact.find("\"complex_types\"").unwrap();
        let element = compact.find("\"element_form_default\"").unwrap();
        let root = compact.find("\"root_elements\"").unwrap();
        let schema = compact.find("\"schema_location\"").unwrap();
        let simple = compact.find("\"simple_types\"").unwrap();
        let target = compact.find("\"target_namespace\"").unwrap();
        assert!(complex < element && element < root && root < schema);
        assert!(schema < simple && simple < target);
    }

    #[test]
    fn test_schema_dump_round_trip() {
        let dump = SchemaDump {
            target_namespace: Some("http://example.com/book".to_string()),
            schema_location: Some("/tmp/book.xsd".to_string()),
            element_form_default: Some("qualified".to_string()),
            root_elements: vec![ElementInfo {
                name: "{http://example.com/book}book".to_string(),
                qualified_name: "{http://example.com/book}book".to_string(),
                element_type: Some(TypeInfo::for_category(TypeCategory::ComplexType)),
                min_occurs: 1,
                max_occurs: MaxOccurs::Bounded(1),
                nillable: false,
                default: None,
            }],
            complex_types: vec![],
            simple_types: vec![],
        };

        let json = dump.to_canonical_json(true).unwrap();
        let parsed: SchemaDump = serde_json::from_str(&json).unwrap();
        assert_eq!(dump, parsed);
    }
}
