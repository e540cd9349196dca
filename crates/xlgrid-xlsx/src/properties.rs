//! Core document properties (`docProps/core.xml`)

use chrono::{DateTime, Utc};
use xlgrid_core::{NodeId, XmlDocument};

use crate::error::XlsxResult;

/// Default path of the core properties part
pub const CORE_PROPERTIES_PATH: &str = "docProps/core.xml";

const CP_NS: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const DCTERMS_NS: &str = "http://purl.org/dc/terms/";
const DCMITYPE_NS: &str = "http://purl.org/dc/dcmitype/";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// A core property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Title,
    Subject,
    Creator,
    Keywords,
    Description,
    LastModifiedBy,
    Category,
    Created,
    Modified,
}

impl Property {
    /// Every property, in the order Excel writes them
    pub const ALL: [Property; 9] = [
        Property::Title,
        Property::Subject,
        Property::Creator,
        Property::Keywords,
        Property::Description,
        Property::LastModifiedBy,
        Property::Category,
        Property::Created,
        Property::Modified,
    ];

    /// Qualified element name
    pub fn element(self) -> &'static str {
        match self {
            Property::Title => "dc:title",
            Property::Subject => "dc:subject",
            Property::Creator => "dc:creator",
            Property::Keywords => "cp:keywords",
            Property::Description => "dc:description",
            Property::LastModifiedBy => "cp:lastModifiedBy",
            Property::Category => "cp:category",
            Property::Created => "dcterms:created",
            Property::Modified => "dcterms:modified",
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Property::Title => "Title",
            Property::Subject => "Subject",
            Property::Creator => "Creator",
            Property::Keywords => "Keywords",
            Property::Description => "Description",
            Property::LastModifiedBy => "Last modified by",
            Property::Category => "Category",
            Property::Created => "Created",
            Property::Modified => "Modified",
        }
    }

    fn is_timestamp(self) -> bool {
        matches!(self, Property::Created | Property::Modified)
    }
}

/// The core properties part
#[derive(Debug, Clone)]
pub struct DocumentProperties {
    xml: XmlDocument,
    modified: bool,
}

impl DocumentProperties {
    /// Empty properties part with the usual namespace declarations
    pub fn new() -> Self {
        let mut xml = XmlDocument::new("cp:coreProperties");
        let root = xml.root();
        for (key, value) in [
            ("xmlns:cp", CP_NS),
            ("xmlns:dc", DC_NS),
            ("xmlns:dcterms", DCTERMS_NS),
            ("xmlns:dcmitype", DCMITYPE_NS),
            ("xmlns:xsi", XSI_NS),
        ] {
            xml.set_attribute(root, key, value);
        }
        Self {
            xml,
            modified: true,
        }
    }

    /// Parse the part
    pub fn parse(data: &[u8]) -> XlsxResult<Self> {
        Ok(Self {
            xml: XmlDocument::parse(data)?,
            modified: false,
        })
    }

    /// Serialize the part
    pub fn to_xml(&self) -> XlsxResult<Vec<u8>> {
        Ok(self.xml.to_xml()?)
    }

    /// Value of a property, if set
    pub fn property(&self, property: Property) -> Option<&str> {
        self.node(property).and_then(|node| self.xml.text(node))
    }

    /// Set a property, creating its element if needed
    pub fn set_property(&mut self, property: Property, value: &str) {
        let node = match self.node(property) {
            Some(node) => node,
            None => {
                let root = self.xml.root();
                let node = self.xml.append_child(root, property.element());
                if property.is_timestamp() {
                    self.xml.set_attribute(node, "xsi:type", "dcterms:W3CDTF");
                }
                node
            }
        };
        self.xml.set_text(node, value);
        self.modified = true;
    }

    /// Remove a property; returns whether it was set
    pub fn remove_property(&mut self, property: Property) -> bool {
        let root = self.xml.root();
        let removed = self.xml.remove_child(root, property.element());
        self.modified |= removed;
        removed
    }

    /// Set properties as (property, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (Property, &str)> {
        Property::ALL
            .into_iter()
            .filter_map(|p| self.property(p).map(|value| (p, value)))
    }

    /// Set `modified` (and `created`, if absent) to `time`
    pub fn stamp_modified(&mut self, time: DateTime<Utc>) {
        let stamp = format_timestamp(time);
        if self.node(Property::Created).is_none() {
            self.set_property(Property::Created, &stamp);
        }
        self.set_property(Property::Modified, &stamp);
    }

    /// Whether the part changed since it was loaded or last saved
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Reset the modified flag
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    fn node(&self, property: Property) -> Option<NodeId> {
        self.xml.child(self.xml.root(), property.element())
    }
}

impl Default for DocumentProperties {
    fn default() -> Self {
        Self::new()
    }
}

/// W3CDTF timestamp with second precision, e.g. `2024-01-02T03:04:05Z`
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
