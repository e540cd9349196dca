//! XML serialization of the arena

use super::{NodeId, XmlDocument};
use crate::error::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

impl XmlDocument {
    /// Serialize the document, declaration included
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        writer.get_mut().extend_from_slice(b"\r\n");
        self.write_element(&mut writer, self.root)?;
        Ok(writer.into_inner())
    }

    /// Serialize a subtree without a declaration
    pub fn to_xml_fragment(&self, id: NodeId) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        self.write_element(&mut writer, id)?;
        Ok(writer.into_inner())
    }

    fn write_element(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<()> {
        let name = self.name(id);
        let mut start = BytesStart::new(name);
        for (key, value) in self.attributes(id) {
            start.push_attribute((key, value));
        }

        let text = self.text(id).filter(|text| !text.is_empty());
        if text.is_none() && self.first_child(id).is_none() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if let Some(text) = text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in self.children(id) {
            self.write_element(writer, child)?;
        }
        writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }
}
