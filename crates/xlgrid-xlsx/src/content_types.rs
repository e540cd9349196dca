//! `[Content_Types].xml`

use xlgrid_core::{NodeId, XmlDocument};

use crate::error::XlsxResult;

/// Path of the content types part
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

const NAMESPACE: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Well-known content types
pub mod content_type {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const WORKBOOK: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
    pub const WORKSHEET: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
    pub const SHARED_STRINGS: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
    pub const STYLES: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
}

/// Default (by extension) and override (by part name) content types
#[derive(Debug, Clone)]
pub struct ContentTypes {
    xml: XmlDocument,
}

impl ContentTypes {
    /// Content types with the `rels` and `xml` defaults and no overrides
    pub fn new() -> Self {
        let mut xml = XmlDocument::new("Types");
        let root = xml.root();
        xml.set_attribute(root, "xmlns", NAMESPACE);
        for (extension, content_type) in [
            ("rels", content_type::RELATIONSHIPS),
            ("xml", content_type::XML),
        ] {
            let node = xml.append_child(root, "Default");
            xml.set_attribute(node, "Extension", extension);
            xml.set_attribute(node, "ContentType", content_type);
        }
        Self { xml }
    }

    /// Parse the part
    pub fn parse(data: &[u8]) -> XlsxResult<Self> {
        Ok(Self {
            xml: XmlDocument::parse(data)?,
        })
    }

    /// Serialize the part
    pub fn to_xml(&self) -> XlsxResult<Vec<u8>> {
        Ok(self.xml.to_xml()?)
    }

    /// Check if a part has an override; `part_name` may omit the leading '/'
    pub fn has_override(&self, part_name: &str) -> bool {
        self.find_override(part_name).is_some()
    }

    /// Set the override of a part, replacing an existing one
    pub fn add_override(&mut self, part_name: &str, content_type: &str) {
        let part_name = absolute(part_name);
        let node = match self.find_override(&part_name) {
            Some(node) => node,
            None => {
                let root = self.xml.root();
                let node = self.xml.append_child(root, "Override");
                self.xml.set_attribute(node, "PartName", &part_name);
                node
            }
        };
        self.xml.set_attribute(node, "ContentType", content_type);
    }

    /// Remove the override of a part; returns whether it existed
    pub fn remove_override(&mut self, part_name: &str) -> bool {
        match self.find_override(part_name) {
            Some(node) => {
                self.xml.detach(node);
                true
            }
            None => false,
        }
    }

    /// Effective content type of a part: its override, else its extension default
    pub fn content_type_of(&self, part_name: &str) -> Option<&str> {
        if let Some(node) = self.find_override(part_name) {
            return self.xml.attribute(node, "ContentType");
        }
        let extension = part_name.rsplit_once('.')?.1;
        let root = self.xml.root();
        self.xml
            .children_named(root, "Default")
            .find(|&node| {
                self.xml
                    .attribute(node, "Extension")
                    .is_some_and(|e| e.eq_ignore_ascii_case(extension))
            })
            .and_then(|node| self.xml.attribute(node, "ContentType"))
    }

    fn find_override(&self, part_name: &str) -> Option<NodeId> {
        let part_name = absolute(part_name);
        let root = self.xml.root();
        self.xml
            .children_named(root, "Override")
            .find(|&node| {
                self.xml
                    .attribute(node, "PartName")
                    .is_some_and(|p| p.eq_ignore_ascii_case(&part_name))
            })
    }
}

impl Default for ContentTypes {
    fn default() -> Self {
        Self::new()
    }
}

/// Part name with a leading '/'
fn absolute(part_name: &str) -> String {
    if part_name.starts_with('/') {
        part_name.to_string()
    } else {
        format!("/{}", part_name)
    }
}
