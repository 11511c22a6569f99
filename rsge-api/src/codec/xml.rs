//! XML element helpers for the waybill service records

use std::fmt::Display;
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::error::{Result, RsgeError};

/// Parse a record from a service XML element
pub trait FromXml: Sized {
    fn from_xml(element: &Element) -> Self;
}

/// Build the XML element the service expects for a writable record
pub trait ToXml {
    fn to_xml(&self) -> Element;
}

/// Trimmed text of child `tag`, empty when missing
pub fn text(element: &Element, tag: &str) -> String {
    text_or(element, tag, "")
}

pub fn text_or(element: &Element, tag: &str, default: &str) -> String {
    element
        .get_child(tag)
        .and_then(|child| child.get_text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Integer value of child `tag`; missing, blank or non-numeric text yields `default`
pub fn int(element: &Element, tag: &str, default: i64) -> i64 {
    text(element, tag).parse().unwrap_or(default)
}

pub fn decimal(element: &Element, tag: &str, default: f64) -> f64 {
    text(element, tag).parse().unwrap_or(default)
}

/// Trimmed own text of an element
pub fn own_text(element: &Element) -> String {
    element
        .get_text()
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// The element itself followed by all descendant elements, in document order
pub fn walk(element: &Element) -> Vec<&Element> {
    let mut out = Vec::new();
    visit(element, &mut out);
    out
}

fn visit<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
    out.push(element);
    for child in element.children.iter().filter_map(XMLNode::as_element) {
        visit(child, out);
    }
}

/// Every element named `name` at any depth, including `element` itself
pub fn descendants<'a>(element: &'a Element, name: &str) -> Vec<&'a Element> {
    walk(element).into_iter().filter(|e| e.name == name).collect()
}

/// Parse every element named `name` at any depth
pub fn collect<T: FromXml>(element: &Element, name: &str) -> Vec<T> {
    descendants(element, name).into_iter().map(T::from_xml).collect()
}

/// Parse the `item` children of the `list` child, e.g. `GOODS_LIST/GOODS`
pub fn list<T: FromXml>(element: &Element, list: &str, item: &str) -> Vec<T> {
    element
        .get_child(list)
        .map(|container| {
            container
                .children
                .iter()
                .filter_map(XMLNode::as_element)
                .filter(|e| e.name == item)
                .map(T::from_xml)
                .collect()
        })
        .unwrap_or_default()
}

/// Append `<tag>value</tag>`; an empty value yields an empty element
pub fn push<'a>(parent: &'a mut Element, tag: &str, value: impl Display) -> &'a mut Element {
    let mut child = Element::new(tag);
    let text = value.to_string();
    if !text.is_empty() {
        child.children.push(XMLNode::Text(text));
    }
    parent.children.push(XMLNode::Element(child));
    parent
}

/// Append a float that always carries a fractional part, `1790` as `1790.0`
pub fn push_decimal<'a>(parent: &'a mut Element, tag: &str, value: f64) -> &'a mut Element {
    push(parent, tag, format!("{:?}", value))
}

/// Append a prepared child element
pub fn push_element(parent: &mut Element, child: Element) -> &mut Element {
    parent.children.push(XMLNode::Element(child));
    parent
}

/// Serialize an element as a fragment, without an XML declaration
pub fn to_string(element: &Element) -> Result<String> {
    let mut buffer = Vec::new();
    let config = EmitterConfig::new()
        .write_document_declaration(false)
        .perform_indent(false);
    element
        .write_with_config(&mut buffer, config)
        .map_err(|e| RsgeError::validation(format!("cannot serialize <{}>: {}", element.name, e)))?;
    String::from_utf8(buffer).map_err(|e| RsgeError::validation(e.to_string()))
}

/// Parse an XML fragment
pub fn parse(xml: &str) -> Result<Element> {
    Element::parse(xml.as_bytes()).map_err(|e| RsgeError::connection(format!("malformed XML: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        parse(
            r#"<WAYBILL>
                 <ID> 42 </ID>
                 <FULL_AMOUNT>1790.00</FULL_AMOUNT>
                 <BUYER_NAME></BUYER_NAME>
                 <STATUS>abc</STATUS>
                 <GOODS_LIST>
                   <GOODS><ID>1</ID></GOODS>
                   <GOODS><ID>2</ID></GOODS>
                 </GOODS_LIST>
               </WAYBILL>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_getters_fall_back_to_defaults() {
        let el = sample();
        assert_eq!(int(&el, "ID", 0), 42);
        assert_eq!(decimal(&el, "FULL_AMOUNT", 0.0), 1790.0);
        assert_eq!(text(&el, "BUYER_NAME"), "");
        assert_eq!(text_or(&el, "BUYER_NAME", "n/a"), "n/a");
        assert_eq!(int(&el, "STATUS", 1), 1);
        assert_eq!(int(&el, "MISSING", -1), -1);
        assert_eq!(decimal(&el, "MISSING", 0.0), 0.0);
    }

    #[test]
    fn test_walk_is_document_order() {
        let el = sample();
        let names: Vec<&str> = walk(&el).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["WAYBILL", "ID", "FULL_AMOUNT", "BUYER_NAME", "STATUS", "GOODS_LIST", "GOODS", "ID", "GOODS", "ID"]
        );

        let goods = descendants(&el, "GOODS");
        assert_eq!(goods.len(), 2);
        assert_eq!(int(goods[1], "ID", 0), 2);
    }

    #[test]
    fn test_builder_serializes_without_declaration() {
        let mut el = Element::new("GOODS");
        push(&mut el, "ID", 0);
        push(&mut el, "W_NAME", "ფქვილი & შაქარი");
        push(&mut el, "BAR_CODE", "");

        let xml = to_string(&el).unwrap();
        assert!(!xml.starts_with("<?xml"));
        assert!(xml.contains("<ID>0</ID>"));
        assert!(xml.contains("<W_NAME>ფქვილი &amp; შაქარი</W_NAME>"));

        let mut amounts = Element::new("WAYBILL");
        push_decimal(&mut amounts, "FULL_AMOUNT", 1790.0);
        push_decimal(&mut amounts, "PRICE", 2.5);
        let amounts = to_string(&amounts).unwrap();
        assert!(amounts.contains("<FULL_AMOUNT>1790.0</FULL_AMOUNT>"));
        assert!(amounts.contains("<PRICE>2.5</PRICE>"));

        let back = parse(&xml).unwrap();
        assert_eq!(text(&back, "W_NAME"), "ფქვილი & შაქარი");
        assert_eq!(text(&back, "BAR_CODE"), "");
    }
}
