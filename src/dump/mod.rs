//! Canonical schema dumping
//!
//! Walks a resolved schema object graph and produces the normalized
//! descriptor document defined in [`schema_model`]. Everything here is a
//! pure function of the input graph: declaration and attribute lists are
//! sorted by name, facet lists keep source order, and every local
//! resolution failure maps to its documented fallback (never an error).

pub mod schema_model;

use log::warn;

pub use schema_model::{
    format_type_name, AttributeInfo, ChildElementInfo, ElementInfo, MaxOccurs, RestrictionInfo,
    SchemaDump, SimpleTypeInfo, TypeCategory, TypeInfo,
};

use crate::model::{
    ElementType, FacetMap, FacetValue, GlobalType, XsdAttribute, XsdComplexType, XsdElement,
    XsdGroup, XsdSchema, XsdSimpleType,
};
use crate::model::SimpleVariety;
use crate::namespaces::QName;
use crate::XSD_NAMESPACE;

/// Content model tag emitted for any compositor group
const GROUP_CONTENT_MODEL: &str = "XsdGroup";

/// Fallback for names and type references that cannot be described
const UNKNOWN: &str = "unknown";

/// Fallback type for attributes without a resolvable type
const DEFAULT_ATTRIBUTE_TYPE: &str = "xs:string";

/// Classify a named type. Total over the model: every global type lands in
/// exactly one category.
pub fn type_category(global_type: &GlobalType) -> TypeCategory {
    match global_type {
        GlobalType::Complex(_) => TypeCategory::ComplexType,
        GlobalType::Simple(st) => simple_category(st),
    }
}

fn simple_category(simple_type: &XsdSimpleType) -> TypeCategory {
    match simple_type.variety {
        SimpleVariety::Atomic => TypeCategory::AtomicRestriction,
        SimpleVariety::List => TypeCategory::List,
        SimpleVariety::Union => TypeCategory::Union,
    }
}

/// Convert a facet table into restriction descriptors.
///
/// The facet table's iteration order (schema document order) is preserved.
/// Returns `None` when no facet produced a descriptor, so callers omit the
/// restrictions key entirely rather than emitting an empty list.
pub fn normalize_facets(facets: &FacetMap) -> Option<Vec<RestrictionInfo>> {
    let mut restrictions = Vec::new();

    for (name, value) in facets {
        match (name.as_str(), value) {
            ("enumeration", FacetValue::Enumeration(values)) if !values.is_empty() => {
                restrictions.push(RestrictionInfo::Enumeration {
                    values: values.clone(),
                });
            }
            ("pattern", FacetValue::Pattern(pattern)) if !pattern.is_empty() => {
                restrictions.push(RestrictionInfo::Pattern {
                    value: pattern.clone(),
                });
            }
            ("minLength", FacetValue::Bound(value)) => {
                restrictions.push(RestrictionInfo::MinLength { value: *value });
            }
            ("maxLength", FacetValue::Bound(value)) => {
                restrictions.push(RestrictionInfo::MaxLength { value: *value });
            }
            ("length", FacetValue::Bound(value)) => {
                restrictions.push(RestrictionInfo::Length { value: *value });
            }
            // whiteSpace, value bounds and anything else are not part of
            // the comparison surface
            _ => {}
        }
    }

    if restrictions.is_empty() {
        None
    } else {
        Some(restrictions)
    }
}

fn build_attribute_info(attr: &XsdAttribute) -> AttributeInfo {
    AttributeInfo {
        name: attr.name.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        attr_type: attr
            .type_name
            .as_ref()
            .map(format_type_name)
            .unwrap_or_else(|| DEFAULT_ATTRIBUTE_TYPE.to_string()),
        use_mode: attr.use_mode.as_str().to_string(),
        default: attr.default.clone(),
    }
}

/// Attribute list sorted by name; `None` when nothing is declared.
/// Declaration order in the source schema is not semantically significant
/// and must not leak into the comparison.
fn build_attributes(attributes: &[XsdAttribute]) -> Option<Vec<AttributeInfo>> {
    if attributes.is_empty() {
        return None;
    }

    let mut infos: Vec<AttributeInfo> = attributes.iter().map(build_attribute_info).collect();
    infos.sort_by(|a, b| a.name.cmp(&b.name));
    Some(infos)
}

/// Type name shown for a child element particle: its declared type
/// reference, the referenced global element's type, or a fallback.
fn child_type_name(particle_name: Option<&QName>, type_ref: Option<&QName>, schema: &XsdSchema) -> String {
    if let Some(type_ref) = type_ref {
        return format_type_name(type_ref);
    }

    let Some(name) = particle_name else {
        return UNKNOWN.to_string();
    };

    match schema.elements.get(&name.to_string()).map(|e| &e.element_type) {
        Some(ElementType::Named(qname)) => format_type_name(qname),
        Some(ElementType::Inline(global_type)) => match global_type.name() {
            Some(qname) => format_type_name(qname),
            None => type_category(global_type).as_str().to_string(),
        },
        Some(ElementType::Unspecified) | None => UNKNOWN.to_string(),
    }
}

/// Flatten a content model into one ordered child-element list.
///
/// Choice/sequence/all nesting collapses into a single sequence; occurrence
/// information comes from the innermost element declaration. An empty
/// result deterministically omits the field (`None`).
fn build_child_elements(group: &XsdGroup, schema: &XsdSchema) -> Option<Vec<ChildElementInfo>> {
    let children: Vec<ChildElementInfo> = group
        .iter_elements()
        .into_iter()
        .map(|particle| ChildElementInfo {
            name: particle
                .name
                .as_ref()
                .map(format_type_name)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            element_type: child_type_name(particle.name.as_ref(), particle.type_ref.as_ref(), schema),
            min_occurs: particle.occurs.min,
            max_occurs: particle.occurs.max.into(),
        })
        .collect();

    if children.is_empty() {
        None
    } else {
        Some(children)
    }
}

/// Build the descriptor of a complex type
pub fn build_complex_type_info(complex_type: &XsdComplexType, schema: &XsdSchema) -> TypeInfo {
    let name = complex_type.name.as_ref().map(format_type_name);

    TypeInfo {
        name: name.clone(),
        qualified_name: name,
        content_model: complex_type
            .content
            .as_ref()
            .map(|_| GROUP_CONTENT_MODEL.to_string()),
        attributes: build_attributes(&complex_type.attributes),
        child_elements: complex_type
            .content
            .as_ref()
            .and_then(|group| build_child_elements(group, schema)),
        ..TypeInfo::for_category(TypeCategory::ComplexType)
    }
}

/// Build the descriptor of a named simple type
pub fn build_simple_type_info(simple_type: &XsdSimpleType) -> SimpleTypeInfo {
    let name = simple_type.name.as_ref().map(format_type_name);

    SimpleTypeInfo {
        name: name.clone(),
        qualified_name: name,
        category: simple_category(simple_type),
        base_type: simple_type.base_type.as_ref().map(format_type_name),
        restrictions: normalize_facets(&simple_type.facets),
    }
}

/// Build the descriptor embedded in an element for any resolved type
pub fn build_type_info(global_type: &GlobalType, schema: &XsdSchema) -> TypeInfo {
    match global_type {
        GlobalType::Complex(complex_type) => build_complex_type_info(complex_type, schema),
        GlobalType::Simple(simple_type) => {
            let name = simple_type.name.as_ref().map(format_type_name);
            TypeInfo {
                name: name.clone(),
                qualified_name: name,
                ..TypeInfo::for_category(simple_category(simple_type))
            }
        }
    }
}

/// Descriptor for a reference to a builtin XSD type
fn build_builtin_type_info(qname: &QName) -> TypeInfo {
    let name = Some(format_type_name(qname));
    TypeInfo {
        name: name.clone(),
        qualified_name: name,
        ..TypeInfo::for_category(TypeCategory::AtomicBuiltin)
    }
}

/// Build the descriptor of a root element declaration.
///
/// The embedded type resolves through: inline definition, then the named
/// type tables, then the builtin namespace. An element with no resolvable
/// type gets an absent type field, not an error.
pub fn build_element_info(element: &XsdElement, schema: &XsdSchema) -> ElementInfo {
    let element_type = match &element.element_type {
        ElementType::Inline(global_type) => Some(build_type_info(global_type, schema)),
        ElementType::Named(qname) => match schema.lookup_type(qname) {
            Some(global_type) => Some(build_type_info(global_type, schema)),
            None if qname.namespace.as_deref() == Some(XSD_NAMESPACE) => {
                Some(build_builtin_type_info(qname))
            }
            None => {
                warn!(
                    "type {} of element {} is not resolvable, dumping without type",
                    qname, element.name
                );
                None
            }
        },
        ElementType::Unspecified => None,
    };

    let name = format_type_name(&element.name);
    ElementInfo {
        name: name.clone(),
        qualified_name: name,
        element_type,
        min_occurs: element.occurs.min,
        max_occurs: element.occurs.max.into(),
        nillable: element.nillable,
        default: element.default.clone(),
    }
}

/// Dump a resolved schema into the canonical descriptor document.
///
/// Root elements and named types are emitted in name-sorted order (the
/// global tables iterate by declaration key), and every named type is
/// routed to exactly one of the complex/simple lists by the classifier.
pub fn dump_schema(schema: &XsdSchema) -> SchemaDump {
    let mut dump = SchemaDump {
        target_namespace: schema.target_namespace.clone(),
        schema_location: schema.location.clone(),
        element_form_default: schema.element_form_default.map(|f| f.to_string()),
        root_elements: Vec::new(),
        complex_types: Vec::new(),
        simple_types: Vec::new(),
    };

    for element in schema.elements.values() {
        dump.root_elements.push(build_element_info(element, schema));
    }

    for global_type in schema.types.values() {
        match global_type {
            GlobalType::Complex(complex_type) => {
                dump.complex_types
                    .push(build_complex_type_info(complex_type, schema));
            }
            GlobalType::Simple(simple_type) => {
                dump.simple_types.push(build_simple_type_info(simple_type));
            }
        }
    }

    dump
}
