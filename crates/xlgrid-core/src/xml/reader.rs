//! XML parsing into the arena

use super::{NodeId, XmlDocument};
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

impl XmlDocument {
    /// Parse an XML document
    ///
    /// Whitespace-only text of elements that have child elements is dropped;
    /// text of leaf elements is kept as is. Comments, processing instructions
    /// and the declaration are not retained.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let xml = xml.strip_prefix(UTF8_BOM).unwrap_or(xml);
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(false);

        let mut buf = Vec::new();
        let mut doc: Option<XmlDocument> = None;
        let mut stack: Vec<NodeId> = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let id = open_element(&mut doc, &stack, e)?;
                    stack.push(id);
                }
                Event::Empty(ref e) => {
                    open_element(&mut doc, &stack, e)?;
                }
                Event::End(_) => {
                    let id = stack
                        .pop()
                        .ok_or_else(|| Error::MalformedXml("unexpected end tag".into()))?;
                    if let Some(doc) = doc.as_mut() {
                        drop_layout_whitespace(doc, id);
                    }
                }
                Event::Text(ref e) => {
                    let text = e.unescape()?;
                    push_text(&mut doc, &stack, &text)?;
                }
                Event::CData(e) => {
                    let raw = e.into_inner();
                    let text = std::str::from_utf8(&raw)
                        .map_err(|err| Error::MalformedXml(err.to_string()))?;
                    push_text(&mut doc, &stack, text)?;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::MalformedXml("unclosed element at end of input".into()));
        }
        doc.ok_or_else(|| Error::MalformedXml("no root element".into()))
    }
}

fn open_element(
    doc: &mut Option<XmlDocument>,
    stack: &[NodeId],
    e: &BytesStart<'_>,
) -> Result<NodeId> {
    let name = utf8(e.name().into_inner())?;

    let id = match (doc.as_mut(), stack.last()) {
        (Some(doc), Some(&parent)) => doc.append_child(parent, name),
        (Some(_), None) => {
            return Err(Error::MalformedXml(format!(
                "second root element <{}>",
                name
            )))
        }
        (None, _) => doc.insert(XmlDocument::new(name)).root(),
    };
    let Some(doc) = doc.as_mut() else {
        return Err(Error::internal("document missing after opening an element"));
    };

    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        doc.node_mut(id).attributes.push((key, value));
    }

    Ok(id)
}

fn push_text(doc: &mut Option<XmlDocument>, stack: &[NodeId], text: &str) -> Result<()> {
    match (doc.as_mut(), stack.last()) {
        (Some(doc), Some(&id)) => {
            doc.node_mut(id)
                .text
                .get_or_insert_with(String::new)
                .push_str(text);
            Ok(())
        }
        _ if text.trim().is_empty() => Ok(()),
        _ => Err(Error::MalformedXml("text outside of the root element".into())),
    }
}

fn drop_layout_whitespace(doc: &mut XmlDocument, id: NodeId) {
    let node = doc.node_mut(id);
    if node.first_child.is_some()
        && node
            .text
            .as_deref()
            .is_some_and(|text| text.trim().is_empty())
    {
        node.text = None;
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|err| Error::MalformedXml(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_elements_attributes_and_text() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1"/></row>
  </sheetData>
</worksheet>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let root = doc.root();
        assert_eq!(doc.name(root), "worksheet");
        assert_eq!(doc.text(root), None);

        let sheet_data = doc.child(root, "sheetData").unwrap();
        let row = doc.child(sheet_data, "row").unwrap();
        assert_eq!(doc.attribute(row, "r"), Some("1"));
        let cells: Vec<_> = doc.children(row).collect();
        assert_eq!(cells.len(), 2);
        assert_eq!(doc.attribute(cells[0], "t"), Some("s"));
        assert_eq!(doc.text(doc.child(cells[0], "v").unwrap()), Some("0"));
    }

    #[test]
    fn test_leaf_whitespace_and_entities_kept() {
        let xml = br#"<sst><si><t xml:space="preserve">  a &amp; b </t></si><si><t><![CDATA[<x>]]></t></si></sst>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let texts: Vec<_> = doc
            .descendants(doc.root())
            .filter(|&n| doc.name(n) == "t")
            .map(|n| doc.text(n).unwrap().to_string())
            .collect();
        assert_eq!(texts, ["  a & b ", "<x>"]);
    }

    #[test]
    fn test_bom_is_skipped() {
        let mut xml = UTF8_BOM.to_vec();
        xml.extend_from_slice(b"<a b=\"1\"/>");
        let doc = XmlDocument::parse(&xml).unwrap();
        assert_eq!(doc.attribute(doc.root(), "b"), Some("1"));
    }

    #[test]
    fn test_malformed_input() {
        assert!(XmlDocument::parse(b"").is_err());
        assert!(XmlDocument::parse(b"<a><b></a>").is_err());
        assert!(XmlDocument::parse(b"<a/><b/>").is_err());
        assert!(XmlDocument::parse(b"<a>").is_err());
    }
}
