//! Structural XSD loader
//!
//! Builds the resolved schema object model from an XSD document on disk.
//! This is not a schema compiler: it extracts the declarations the dump
//! consumes (global elements, named types, attributes, compositor groups,
//! facets) and chases `xs:include`/`xs:import` chains, optionally through a
//! URI catalog. Validation semantics, derivation resolution and identity
//! constraints are out of scope.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::catalog::UriCatalog;
use crate::documents::{Document, Element};
use crate::error::{Error, ParseError, Result};
use crate::locations::resolve_location;
use crate::model::{
    AttributeUse, ElementParticle, ElementType, FacetMap, FacetValue, FormDefault, GlobalType,
    GroupParticle, ModelType, Occurs, SimpleVariety, XsdAttribute, XsdComplexType, XsdElement,
    XsdGroup, XsdSchema, XsdSimpleType,
};
use crate::namespaces::{NamespaceContext, QName};

/// Per-document context while walking one schema file
struct DocContext {
    /// Target namespace of this document
    target_namespace: Option<String>,
    /// Effective elementFormDefault of this document
    form_default: FormDefault,
    /// Namespace prefix bindings declared on the xs:schema root
    namespaces: NamespaceContext,
    /// Directory the document was loaded from, for relative locations
    base_dir: Option<PathBuf>,
}

impl DocContext {
    /// Resolve a possibly-prefixed type or element reference. Unresolvable
    /// prefixes are tolerated: the reference is dropped and logged.
    fn resolve_ref(&self, value: &str) -> Option<QName> {
        match self.namespaces.resolve(value) {
            Ok(qname) => Some(qname),
            Err(_) => {
                warn!("dropping reference with unknown prefix: {}", value);
                None
            }
        }
    }

    /// Qualified name of a global declaration (always in the target
    /// namespace).
    fn global_name(&self, local: &str) -> QName {
        QName::new(self.target_namespace.clone(), local)
    }

    /// Name of a locally declared element particle, qualified according to
    /// the document's element form rules.
    fn particle_name(&self, local: &str, form: Option<&str>) -> QName {
        let qualified = match form {
            Some("qualified") => true,
            Some("unqualified") => false,
            _ => self.form_default == FormDefault::Qualified,
        };
        if qualified {
            QName::new(self.target_namespace.clone(), local)
        } else {
            QName::local(local)
        }
    }
}

/// Parse an XSD boolean attribute value. The lexical space admits both
/// `true`/`false` and `1`/`0`. An absent attribute is false; anything else
/// is logged and treated as false.
fn parse_xsd_bool(value: Option<&str>) -> bool {
    match value {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") | None => false,
        Some(other) => {
            warn!("treating non-boolean attribute value as false: {}", other);
            false
        }
    }
}

/// Loads XSD documents into the resolved schema model
#[derive(Debug, Default)]
pub struct SchemaLoader {
    catalog: Option<UriCatalog>,
}

impl SchemaLoader {
    /// Create a loader without catalog support
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader that resolves external references through a catalog
    pub fn with_catalog(catalog: UriCatalog) -> Self {
        Self {
            catalog: Some(catalog),
        }
    }

    /// Load a schema document, following its include/import chain
    pub fn load(&self, path: impl AsRef<Path>) -> Result<XsdSchema> {
        let path = path.as_ref();
        let mut schema = XsdSchema::default();
        let mut visited = HashSet::new();

        self.load_document(path, &mut schema, &mut visited, true)?;
        Ok(schema)
    }

    fn load_document(
        &self,
        path: &Path,
        schema: &mut XsdSchema,
        visited: &mut HashSet<PathBuf>,
        is_root: bool,
    ) -> Result<()> {
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !visited.insert(canonical) {
            debug!("already loaded, skipping: {}", path.display());
            return Ok(());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            Error::Resource(format!("failed to read schema '{}': {}", path.display(), e))
        })?;

        let doc = Document::from_string(&content)?;
        let root = doc.root().ok_or_else(|| {
            Error::Parse(ParseError::new("empty schema document").with_location(path.display().to_string()))
        })?;

        if root.local_name() != "schema" {
            return Err(Error::Parse(
                ParseError::new(format!(
                    "expected xs:schema root element, got {}",
                    root.local_name()
                ))
                .with_location(path.display().to_string()),
            ));
        }

        let declared_form = root
            .get_attribute("elementFormDefault")
            .and_then(FormDefault::from_str);

        let ctx = DocContext {
            target_namespace: root.get_attribute("targetNamespace").map(String::from),
            form_default: declared_form.unwrap_or_default(),
            namespaces: root.namespaces.clone(),
            base_dir: path.parent().map(|p| p.to_path_buf()),
        };

        if is_root {
            schema.target_namespace = ctx.target_namespace.clone();
            schema.location = Some(path.display().to_string());
            schema.element_form_default = declared_form;
        }

        for child in &root.children {
            match child.local_name() {
                "element" => {
                    if let Some(element) = self.parse_global_element(child, &ctx) {
                        schema
                            .elements
                            .entry(element.name.to_string())
                            .or_insert(element);
                    }
                }
                "complexType" => {
                    if let Some(name) = child.get_attribute("name") {
                        let qname = ctx.global_name(name);
                        let ct = self.parse_complex_type(child, &ctx, Some(qname.clone()));
                        schema
                            .types
                            .entry(qname.to_string())
                            .or_insert(GlobalType::Complex(ct));
                    } else {
                        warn!("skipping unnamed top-level complexType");
                    }
                }
                "simpleType" => {
                    if let Some(name) = child.get_attribute("name") {
                        let qname = ctx.global_name(name);
                        let st = self.parse_simple_type(child, &ctx, Some(qname.clone()));
                        schema
                            .types
                            .entry(qname.to_string())
                            .or_insert(GlobalType::Simple(st));
                    } else {
                        warn!("skipping unnamed top-level simpleType");
                    }
                }
                "include" | "import" => {
                    self.follow_reference(child, &ctx, schema, visited)?;
                }
                // annotations, groups, notations, attribute declarations
                other => debug!("skipping top-level {}", other),
            }
        }

        Ok(())
    }

    /// Resolve and load the target of an xs:include or xs:import
    fn follow_reference(
        &self,
        elem: &Element,
        ctx: &DocContext,
        schema: &mut XsdSchema,
        visited: &mut HashSet<PathBuf>,
    ) -> Result<()> {
        // For imports the namespace URI itself may be catalog-mapped (URN
        // catalogs key on the namespace, not a location).
        let mut location = None;

        if elem.local_name() == "import" {
            if let (Some(ns), Some(catalog)) = (elem.get_attribute("namespace"), &self.catalog) {
                let mapped = catalog.resolve(ns);
                if mapped != ns {
                    location = Some(mapped);
                }
            }
        }

        if location.is_none() {
            if let Some(loc) = elem.get_attribute("schemaLocation") {
                location = Some(match &self.catalog {
                    Some(catalog) => catalog.resolve(loc),
                    None => loc.to_string(),
                });
            }
        }

        let Some(location) = location else {
            debug!("{} without resolvable location, skipping", elem.local_name());
            return Ok(());
        };

        let target = resolve_location(&location, ctx.base_dir.as_deref())?;
        debug!("following {} -> {}", elem.local_name(), target.display());
        self.load_document(&target, schema, visited, false)
    }

    fn parse_global_element(&self, elem: &Element, ctx: &DocContext) -> Option<XsdElement> {
        let Some(name) = elem.get_attribute("name") else {
            warn!("skipping global element without a name");
            return None;
        };

        let element_type = if let Some(type_ref) = elem.get_attribute("type") {
            match ctx.resolve_ref(type_ref) {
                Some(qname) => ElementType::Named(qname),
                None => ElementType::Unspecified,
            }
        } else if let Some(inline) = elem.find_child("complexType") {
            ElementType::Inline(Box::new(GlobalType::Complex(
                self.parse_complex_type(inline, ctx, None),
            )))
        } else if let Some(inline) = elem.find_child("simpleType") {
            ElementType::Inline(Box::new(GlobalType::Simple(
                self.parse_simple_type(inline, ctx, None),
            )))
        } else {
            ElementType::Unspecified
        };

        Some(XsdElement {
            name: ctx.global_name(name),
            element_type,
            occurs: Occurs::from_attributes(
                elem.get_attribute("minOccurs"),
                elem.get_attribute("maxOccurs"),
            ),
            nillable: parse_xsd_bool(elem.get_attribute("nillable")),
            default: elem.get_attribute("default").map(String::from),
        })
    }

    fn parse_complex_type(
        &self,
        elem: &Element,
        ctx: &DocContext,
        name: Option<QName>,
    ) -> XsdComplexType {
        let mut content = None;
        let mut attributes = Vec::new();

        self.parse_complex_body(elem, ctx, &mut content, &mut attributes);

        // complexContent/simpleContent wrap the particles and attributes in
        // an extension or restriction. Only the derived type's own
        // declarations are recorded; base merging is the engine's job.
        for wrapper_name in ["complexContent", "simpleContent"] {
            if let Some(wrapper) = elem.find_child(wrapper_name) {
                for derivation_name in ["extension", "restriction"] {
                    if let Some(derivation) = wrapper.find_child(derivation_name) {
                        debug!(
                            "recording own declarations of {} without base merge",
                            derivation.get_attribute("base").unwrap_or("(no base)")
                        );
                        self.parse_complex_body(derivation, ctx, &mut content, &mut attributes);
                    }
                }
            }
        }

        XsdComplexType {
            name,
            content,
            attributes,
        }
    }

    /// Collect the compositor group and attribute declarations that are
    /// immediate children of a complexType, extension or restriction element.
    fn parse_complex_body(
        &self,
        elem: &Element,
        ctx: &DocContext,
        content: &mut Option<XsdGroup>,
        attributes: &mut Vec<XsdAttribute>,
    ) {
        for child in &elem.children {
            if let Some(model) = ModelType::from_local_name(child.local_name()) {
                if content.is_none() {
                    *content = Some(self.parse_group(child, ctx, model));
                }
            } else if child.local_name() == "attribute" {
                attributes.push(self.parse_attribute(child, ctx));
            }
        }
    }

    fn parse_group(&self, elem: &Element, ctx: &DocContext, model: ModelType) -> XsdGroup {
        let mut particles = Vec::new();

        for child in &elem.children {
            if let Some(nested_model) = ModelType::from_local_name(child.local_name()) {
                particles.push(GroupParticle::Group(
                    self.parse_group(child, ctx, nested_model),
                ));
                continue;
            }

            match child.local_name() {
                "element" => {
                    let occurs = Occurs::from_attributes(
                        child.get_attribute("minOccurs"),
                        child.get_attribute("maxOccurs"),
                    );

                    let (name, type_ref) = if let Some(local) = child.get_attribute("name") {
                        let type_ref = child
                            .get_attribute("type")
                            .and_then(|t| ctx.resolve_ref(t));
                        (
                            Some(ctx.particle_name(local, child.get_attribute("form"))),
                            type_ref,
                        )
                    } else if let Some(reference) = child.get_attribute("ref") {
                        // The referenced declaration's type is resolved at
                        // dump time from the global element table.
                        (ctx.resolve_ref(reference), None)
                    } else {
                        warn!("skipping element particle without name or ref");
                        continue;
                    };

                    particles.push(GroupParticle::Element(ElementParticle {
                        name,
                        type_ref,
                        occurs,
                    }));
                }
                // wildcards and group refs carry no child element names
                other => debug!("skipping particle {}", other),
            }
        }

        XsdGroup { model, particles }
    }

    fn parse_attribute(&self, elem: &Element, ctx: &DocContext) -> XsdAttribute {
        let name = elem
            .get_attribute("name")
            .map(String::from)
            .or_else(|| {
                elem.get_attribute("ref")
                    .map(|r| r.split(':').last().unwrap_or(r).to_string())
            });

        let type_name = elem.get_attribute("type").and_then(|t| ctx.resolve_ref(t));

        let use_mode = elem
            .get_attribute("use")
            .and_then(AttributeUse::from_str)
            .unwrap_or_default();

        XsdAttribute {
            name,
            type_name,
            use_mode,
            default: elem.get_attribute("default").map(String::from),
        }
    }

    fn parse_simple_type(
        &self,
        elem: &Element,
        ctx: &DocContext,
        name: Option<QName>,
    ) -> XsdSimpleType {
        if let Some(restriction) = elem.find_child("restriction") {
            let base_type = restriction
                .get_attribute("base")
                .and_then(|b| ctx.resolve_ref(b));

            return XsdSimpleType {
                name,
                variety: SimpleVariety::Atomic,
                base_type,
                facets: self.parse_facets(restriction),
            };
        }

        if let Some(list) = elem.find_child("list") {
            let base_type = list
                .get_attribute("itemType")
                .and_then(|t| ctx.resolve_ref(t));

            return XsdSimpleType {
                name,
                variety: SimpleVariety::List,
                base_type,
                facets: FacetMap::new(),
            };
        }

        if elem.find_child("union").is_some() {
            return XsdSimpleType {
                name,
                variety: SimpleVariety::Union,
                base_type: None,
                facets: FacetMap::new(),
            };
        }

        XsdSimpleType {
            name,
            variety: SimpleVariety::Atomic,
            base_type: None,
            facets: FacetMap::new(),
        }
    }

    /// Collect restriction facets in document order. Enumeration values
    /// accumulate into a single facet entry anchored at the first
    /// occurrence.
    fn parse_facets(&self, restriction: &Element) -> FacetMap {
        let mut facets = FacetMap::new();

        for child in &restriction.children {
            let facet_name = child.local_name();
            let value = child.get_attribute("value");

            match facet_name {
                "enumeration" => {
                    let Some(value) = value else { continue };
                    let entry = facets
                        .entry("enumeration".to_string())
                        .or_insert_with(|| FacetValue::Enumeration(Vec::new()));
                    if let FacetValue::Enumeration(values) = entry {
                        values.push(value.to_string());
                    }
                }
                "pattern" => {
                    if let Some(value) = value {
                        facets.insert(facet_name.to_string(), FacetValue::Pattern(value.to_string()));
                    }
                }
                "minLength" | "maxLength" | "length" => match value.and_then(|v| v.parse().ok()) {
                    Some(bound) => {
                        facets.insert(facet_name.to_string(), FacetValue::Bound(bound));
                    }
                    None => warn!("skipping {} facet with non-numeric value", facet_name),
                },
                _ => {
                    if let Some(value) = value {
                        facets.insert(facet_name.to_string(), FacetValue::Literal(value.to_string()));
                    }
                }
            }
        }

        facets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SimpleVariety;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BOOK_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:tns="http://example.com/book"
           targetNamespace="http://example.com/book"
           elementFormDefault="qualified">
  <xs:element name="book" type="tns:bookType"/>
  <xs:complexType name="bookType">
    <xs:sequence>
      <xs:element name="title" type="xs:string"/>
      <xs:element name="author" type="xs:string" minOccurs="1" maxOccurs="unbounded"/>
    </xs:sequence>
    <xs:attribute name="isbn" type="tns:isbnType" use="required"/>
  </xs:complexType>
  <xs:simpleType name="isbnType">
    <xs:restriction base="xs:string">
      <xs:pattern value="[0-9]{13}"/>
      <xs:length value="13"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

    fn load_str(xsd: &str) -> XsdSchema {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(xsd.as_bytes()).unwrap();
        SchemaLoader::new().load(file.path()).unwrap()
    }

    #[test]
    fn test_load_book_schema() {
        let schema = load_str(BOOK_XSD);

        assert_eq!(
            schema.target_namespace.as_deref(),
            Some("http://example.com/book")
        );
        assert_eq!(schema.element_form_default, Some(FormDefault::Qualified));
        assert_eq!(schema.elements.len(), 1);
        assert_eq!(schema.types.len(), 2);

        let book = schema.elements.values().next().unwrap();
        assert_eq!(book.name.to_string(), "{http://example.com/book}book");
        assert!(matches!(
            &book.element_type,
            ElementType::Named(q) if q.local_name == "bookType"
        ));
    }

    #[test]
    fn test_complex_type_content_and_attributes() {
        let schema = load_str(BOOK_XSD);

        let GlobalType::Complex(book_type) = schema
            .lookup_type(&QName::namespaced("http://example.com/book", "bookType"))
            .unwrap()
        else {
            panic!("bookType should be complex");
        };

        let content = book_type.content.as_ref().unwrap();
        assert_eq!(content.model, ModelType::Sequence);

        let children = content.iter_elements();
        assert_eq!(children.len(), 2);
        assert_eq!(
            children[0].name.as_ref().unwrap().to_string(),
            "{http://example.com/book}title"
        );
        assert_eq!(children[1].occurs.max, None);

        assert_eq!(book_type.attributes.len(), 1);
        assert_eq!(book_type.attributes[0].name.as_deref(), Some("isbn"));
        assert_eq!(book_type.attributes[0].use_mode, AttributeUse::Required);
    }

    #[test]
    fn test_facets_preserve_document_order() {
        let schema = load_str(BOOK_XSD);

        let GlobalType::Simple(isbn) = schema
            .lookup_type(&QName::namespaced("http://example.com/book", "isbnType"))
            .unwrap()
        else {
            panic!("isbnType should be simple");
        };

        assert_eq!(isbn.variety, SimpleVariety::Atomic);
        assert_eq!(
            isbn.base_type.as_ref().unwrap().to_string(),
            "{http://www.w3.org/2001/XMLSchema}string"
        );

        let names: Vec<_> = isbn.facets.keys().cloned().collect();
        assert_eq!(names, vec!["pattern", "length"]);
    }

    #[test]
    fn test_enumeration_values_accumulate() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:simpleType name="color">
    <xs:restriction base="xs:string">
      <xs:enumeration value="red"/>
      <xs:enumeration value="green"/>
      <xs:enumeration value="blue"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

        let schema = load_str(xsd);
        let GlobalType::Simple(color) = schema.types.values().next().unwrap() else {
            panic!("expected a simple type");
        };

        assert_eq!(
            color.facets.get("enumeration"),
            Some(&FacetValue::Enumeration(vec![
                "red".to_string(),
                "green".to_string(),
                "blue".to_string()
            ]))
        );
    }

    #[test]
    fn test_nillable_boolean_lexical_forms() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="a" type="xs:string" nillable="1"/>
  <xs:element name="b" type="xs:string" nillable="true"/>
  <xs:element name="c" type="xs:string" nillable="0"/>
  <xs:element name="d" type="xs:string" nillable="maybe"/>
  <xs:element name="e" type="xs:string"/>
</xs:schema>"#;

        let schema = load_str(xsd);
        let nillable = |name: &str| schema.elements.get(name).unwrap().nillable;

        assert!(nillable("a"));
        assert!(nillable("b"));
        assert!(!nillable("c"));
        assert!(!nillable("d"));
        assert!(!nillable("e"));
    }

    #[test]
    fn test_include_merges_globals() {
        let dir = tempfile::TempDir::new().unwrap();

        fs::write(
            dir.path().join("types.xsd"),
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://example.com/main">
  <xs:simpleType name="code">
    <xs:restriction base="xs:string"/>
  </xs:simpleType>
</xs:schema>"#,
        )
        .unwrap();

        fs::write(
            dir.path().join("main.xsd"),
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://example.com/main">
  <xs:include schemaLocation="types.xsd"/>
  <xs:element name="root" type="xs:string"/>
</xs:schema>"#,
        )
        .unwrap();

        let schema = SchemaLoader::new().load(dir.path().join("main.xsd")).unwrap();

        assert_eq!(schema.elements.len(), 1);
        assert_eq!(schema.types.len(), 1);
        assert!(schema
            .lookup_type(&QName::namespaced("http://example.com/main", "code"))
            .is_some());
    }

    #[test]
    fn test_missing_include_is_fatal() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:include schemaLocation="does-not-exist.xsd"/>
</xs:schema>"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(xsd.as_bytes()).unwrap();

        assert!(SchemaLoader::new().load(file.path()).is_err());
    }

    #[test]
    fn test_non_schema_root_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"<not-a-schema/>").unwrap();

        let err = SchemaLoader::new().load(file.path()).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
