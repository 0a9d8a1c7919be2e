//! XML document handling
//!
//! A lightweight element tree over a quick-xml event reader, sufficient for
//! walking schema documents. Element and attribute names keep their raw
//! prefixed form; lookups match on the local part, since schema documents are
//! navigated by XSD local names regardless of the prefix they bind.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::namespaces::NamespaceContext;

/// XML Element in the document tree
#[derive(Debug, Clone)]
pub struct Element {
    /// Raw element name as written (possibly prefixed)
    pub name: String,
    /// Attributes, keyed by raw attribute name
    pub attributes: HashMap<String, String>,
    /// Text content (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// Namespace declarations made on this element
    pub namespaces: NamespaceContext,
}

impl Element {
    /// Create a new element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
            text: None,
            children: Vec::new(),
            namespaces: NamespaceContext::new(),
        }
    }

    /// Get the local name of the element (prefix stripped)
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Get an attribute value by local name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        for (key, value) in &self.attributes {
            let local = key.split_once(':').map(|(_, l)| l).unwrap_or(key);
            if local == name {
                return Some(value);
            }
        }
        None
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Find the first child element with the given local name
    pub fn find_child(&self, local_name: &str) -> Option<&Element> {
        self.children.iter().find(|e| e.local_name() == local_name)
    }
}

/// XML Document representation
#[derive(Debug)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Element>,
}

impl Document {
    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut root = None;
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let element = Self::parse_element(&e)?;
                    element_stack.push(element);
                }
                Ok(Event::End(_)) => {
                    if let Some(current) = element_stack.pop() {
                        if let Some(parent) = element_stack.last_mut() {
                            parent.add_child(current);
                        } else {
                            root = Some(current);
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let element = Self::parse_element(&e)?;
                    if let Some(parent) = element_stack.last_mut() {
                        parent.add_child(element);
                    } else {
                        root = Some(element);
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("failed to unescape text: {}", e)))?
                            .to_string();
                        if !text.trim().is_empty() {
                            current.text = Some(text);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Ignore comments, processing instructions, etc.
            }
            buf.clear();
        }

        Ok(Document { root })
    }

    /// Parse element from a BytesStart event
    fn parse_element(start: &BytesStart) -> Result<Element> {
        let name_bytes = start.name();
        let name = std::str::from_utf8(name_bytes.as_ref())
            .map_err(|e| Error::Xml(format!("invalid element name: {}", e)))?
            .to_string();

        let mut element = Element::new(name);

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("invalid attribute name: {}", e)))?;

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_name == "xmlns" {
                element.namespaces.set_default_namespace(&attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                element.namespaces.add_prefix(prefix, &attr_value);
            } else {
                element.attributes.insert(attr_name.to_string(), attr_value);
            }
        }

        Ok(element)
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.local_name(), "root");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].local_name(), "child");
        assert_eq!(root.children[0].text.as_deref(), Some("text"));
    }

    #[test]
    fn test_parse_with_attributes() {
        let xml = r#"<root attr1="value1" attr2="value2"><child/></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.get_attribute("attr1"), Some("value1"));
        assert_eq!(root.get_attribute("attr2"), Some("value2"));
    }

    #[test]
    fn test_parse_with_namespaces() {
        let xml = r#"<root xmlns="http://example.com" xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(
            root.namespaces.get_default_namespace(),
            Some("http://example.com")
        );
        assert_eq!(
            root.namespaces.get_namespace("xs"),
            Some("http://www.w3.org/2001/XMLSchema")
        );
    }

    #[test]
    fn test_prefixed_names_match_local() {
        let xml = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="order" xs:dummy="v"/>
        </xs:schema>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert_eq!(root.local_name(), "schema");

        let children = root.find_children("element");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].get_attribute("name"), Some("order"));
        assert_eq!(children[0].get_attribute("dummy"), Some("v"));
    }

    #[test]
    fn test_find_child() {
        let xml = r#"<root><a/><b/><a/></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root.unwrap();
        assert!(root.find_child("b").is_some());
        assert!(root.find_child("c").is_none());
        assert_eq!(root.find_children("a").len(), 2);
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(Document::from_string("<root><unclosed></root>").is_err());
    }
}
