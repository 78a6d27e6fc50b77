//! Parsed XML representations for XML-typed column values.
//!
//! Vendor XML columns arrive as [`crate::convert::CellValue::Xml`] text. The
//! conversion matrix can parse that text into an [`XmlElement`] tree or an
//! [`XmlDocument`] that supports name-indexed lookup over the whole tree.
//! Malformed XML propagates as a parse failure from the XML layer; nothing is
//! swallowed or repaired.
//!
//! # Key Components
//!
//! - [`XmlElement`]: one element with attributes, text and child elements
//! - [`XmlDocument`]: a parsed tree with recursive name lookup
//! - [`parse_element`] / [`parse_document`]: entry points used by the
//!   conversion matrix

use quick_xml::{events::Event, Reader};

use crate::Result;

/// One parsed XML element: name, attributes, concatenated text and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Element name as written in the source text
    pub name: String,
    /// Attribute name/value pairs in document order
    pub attributes: Vec<(String, String)>,
    /// Concatenated, unescaped character data directly inside this element
    pub text: String,
    /// Child elements in document order
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Look up an attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given element name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }
}

/// A fully parsed XML document with name-indexed lookup across the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// The document's root element
    pub root: XmlElement,
}

impl XmlDocument {
    /// First element anywhere in the tree with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&XmlElement> {
        fn walk<'a>(element: &'a XmlElement, name: &str) -> Option<&'a XmlElement> {
            if element.name == name {
                return Some(element);
            }
            element.children.iter().find_map(|child| walk(child, name))
        }
        walk(&self.root, name)
    }

    /// All elements anywhere in the tree with the given name, document order.
    #[must_use]
    pub fn all(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        fn walk<'a>(element: &'a XmlElement, name: &str, found: &mut Vec<&'a XmlElement>) {
            if element.name == name {
                found.push(element);
            }
            for child in &element.children {
                walk(child, name, found);
            }
        }
        walk(&self.root, name, &mut found);
        found
    }
}

/// Parse XML text into its root [`XmlElement`].
///
/// # Errors
/// Returns [`crate::Error::Xml`] for malformed XML (mismatched tags, invalid
/// attributes, bad escapes) and [`crate::Error::Error`] when the text contains
/// no root element at all.
pub fn parse_element(text: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = true;

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let mut element = XmlElement {
                    name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                    ..XmlElement::default()
                };
                for attribute in start.attributes() {
                    let attribute = attribute.map_err(quick_xml::Error::from)?;
                    element.attributes.push((
                        String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
                        attribute.unescape_value()?.into_owned(),
                    ));
                }
                stack.push(element);
            }
            Event::Empty(start) => {
                let mut element = XmlElement {
                    name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                    ..XmlElement::default()
                };
                for attribute in start.attributes() {
                    let attribute = attribute.map_err(quick_xml::Error::from)?;
                    element.attributes.push((
                        String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
                        attribute.unescape_value()?.into_owned(),
                    ));
                }
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None if root.is_none() => root = Some(element),
                    None => {
                        return Err(crate::Error::Error(
                            "XML text has content after the root element".to_string(),
                        ))
                    }
                }
            }
            Event::Text(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&data.unescape()?);
                }
            }
            Event::End(_) => {
                let finished = match stack.pop() {
                    Some(element) => element,
                    None => {
                        return Err(crate::Error::Error(
                            "XML end tag without matching start tag".to_string(),
                        ))
                    }
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(finished),
                    None if root.is_none() => root = Some(finished),
                    None => {
                        return Err(crate::Error::Error(
                            "XML text has more than one root element".to_string(),
                        ))
                    }
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and CDATA do not
            // contribute to the materialized tree.
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(crate::Error::Error(format!(
            "XML element `{}` is never closed",
            stack[stack.len() - 1].name
        )));
    }

    root.ok_or_else(|| crate::Error::Error("XML text has no root element".to_string()))
}

/// Parse XML text into an [`XmlDocument`].
///
/// # Errors
/// Same failure modes as [`parse_element`].
pub fn parse_document(text: &str) -> Result<XmlDocument> {
    Ok(XmlDocument {
        root: parse_element(text)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_tree() {
        let element =
            parse_element("<order id=\"7\"><item sku=\"A\"/><item sku=\"B\">two</item></order>")
                .unwrap();
        assert_eq!(element.name, "order");
        assert_eq!(element.attribute("id"), Some("7"));
        assert_eq!(element.children.len(), 2);
        assert_eq!(element.children[1].text, "two");
        assert_eq!(element.child("item").unwrap().attribute("sku"), Some("A"));
    }

    #[test]
    fn test_document_index() {
        let document = parse_document("<a><b><c v=\"1\"/></b><c v=\"2\"/></a>").unwrap();
        assert_eq!(document.get("c").unwrap().attribute("v"), Some("1"));
        assert_eq!(document.all("c").len(), 2);
        assert!(document.get("missing").is_none());
    }

    #[test]
    fn test_malformed_input_fails() {
        assert!(parse_element("<a><b></a>").is_err());
        assert!(parse_element("no xml here").is_err());
        assert!(parse_element("<unclosed>").is_err());
    }
}
