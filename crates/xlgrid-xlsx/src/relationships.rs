//! Relationship parts (`_rels/*.rels`)

use xlgrid_core::{NodeId, XmlDocument};

use crate::error::XlsxResult;

const NAMESPACE: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Well-known relationship types
pub mod rel_type {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const WORKSHEET: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
    pub const SHARED_STRINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
}

/// One relationship entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// The relationships of one part
#[derive(Debug, Clone)]
pub struct Relationships {
    xml: XmlDocument,
}

impl Relationships {
    /// Empty relationship part
    pub fn new() -> Self {
        let mut xml = XmlDocument::new("Relationships");
        let root = xml.root();
        xml.set_attribute(root, "xmlns", NAMESPACE);
        Self { xml }
    }

    /// Parse a relationship part
    pub fn parse(data: &[u8]) -> XlsxResult<Self> {
        Ok(Self {
            xml: XmlDocument::parse(data)?,
        })
    }

    /// Serialize the part
    pub fn to_xml(&self) -> XlsxResult<Vec<u8>> {
        Ok(self.xml.to_xml()?)
    }

    /// All entries in document order
    pub fn list(&self) -> Vec<Relationship> {
        self.nodes().map(|node| self.entry(node)).collect()
    }

    /// Entry with the given id
    pub fn by_id(&self, id: &str) -> Option<Relationship> {
        self.find(|rel| rel.id == id)
    }

    /// First entry of the given type
    pub fn by_type(&self, rel_type: &str) -> Option<Relationship> {
        self.find(|rel| rel.rel_type == rel_type)
    }

    /// First entry pointing at `target`
    pub fn by_target(&self, target: &str) -> Option<Relationship> {
        self.find(|rel| rel.target == target)
    }

    /// Add an entry under the lowest free `rIdN` id and return that id
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let id = self.next_id();
        let root = self.xml.root();
        let node = self.xml.append_child(root, "Relationship");
        self.xml.set_attribute(node, "Id", &id);
        self.xml.set_attribute(node, "Type", rel_type);
        self.xml.set_attribute(node, "Target", target);
        id
    }

    /// Remove the entry with the given id; returns whether it existed
    pub fn remove(&mut self, id: &str) -> bool {
        let found = self
            .nodes()
            .find(|&node| self.xml.attribute(node, "Id") == Some(id));
        match found {
            Some(node) => {
                self.xml.detach(node);
                true
            }
            None => false,
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.nodes().count()
    }

    /// Check if the part has no entries
    pub fn is_empty(&self) -> bool {
        self.nodes().next().is_none()
    }

    fn next_id(&self) -> String {
        let mut n = 1;
        loop {
            let id = format!("rId{}", n);
            if self.by_id(&id).is_none() {
                return id;
            }
            n += 1;
        }
    }

    fn find<F: Fn(&Relationship) -> bool>(&self, predicate: F) -> Option<Relationship> {
        self.nodes()
            .map(|node| self.entry(node))
            .find(|rel| predicate(rel))
    }

    fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.xml.children_named(self.xml.root(), "Relationship")
    }

    fn entry(&self, node: NodeId) -> Relationship {
        let attr = |key: &str| self.xml.attribute(node, key).unwrap_or_default().to_string();
        Relationship {
            id: attr("Id"),
            rel_type: attr("Type"),
            target: attr("Target"),
        }
    }
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new()
    }
}

/// Path of the relationship part belonging to `part`
///
/// `xl/workbook.xml` has its relationships in `xl/_rels/workbook.xml.rels`;
/// the package itself (empty part name) in `_rels/.rels`.
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns it
///
/// Absolute targets ("/xl/x.xml") are package-relative. Relative targets
/// are resolved against the directory of `base`, with "." and ".." handled.
pub fn resolve_target(base: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match base.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Express package path `path` relative to the directory of `base`
///
/// Only handles `path` inside that directory, which covers every part this
/// crate creates; anything else becomes an absolute target.
pub fn relative_target(base: &str, path: &str) -> String {
    let dir = match base.rsplit_once('/') {
        Some((dir, _)) => format!("{}/", dir),
        None => String::new(),
    };
    match path.strip_prefix(&dir) {
        Some(relative) => relative.to_string(),
        None => format!("/{}", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_uses_lowest_free_id() {
        let mut rels = Relationships::new();
        assert_eq!(rels.add(rel_type::WORKSHEET, "worksheets/sheet1.xml"), "rId1");
        assert_eq!(rels.add(rel_type::WORKSHEET, "worksheets/sheet2.xml"), "rId2");
        assert_eq!(rels.add(rel_type::STYLES, "styles.xml"), "rId3");
        assert!(rels.remove("rId2"));
        assert_eq!(rels.add(rel_type::WORKSHEET, "worksheets/sheet3.xml"), "rId2");
        assert_eq!(rels.len(), 3);

        let styles = rels.by_type(rel_type::STYLES).unwrap();
        assert_eq!(styles.id, "rId3");
        assert_eq!(
            rels.by_target("worksheets/sheet3.xml").map(|r| r.id),
            Some("rId2".to_string())
        );
    }

    #[test]
    fn test_parse() {
        let rels = Relationships::parse(
            br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId7" Type="t" Target="a.xml"/></Relationships>"#,
        )
        .unwrap();
        assert_eq!(
            rels.list(),
            [Relationship {
                id: "rId7".into(),
                rel_type: "t".into(),
                target: "a.xml".into(),
            }]
        );
    }

    #[test]
    fn test_paths() {
        assert_eq!(rels_path_for("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
        assert_eq!(rels_path_for(""), "_rels/.rels");
        assert_eq!(
            resolve_target("xl/workbook.xml", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            resolve_target("xl/worksheets/sheet1.xml", "../drawings/d1.xml"),
            "xl/drawings/d1.xml"
        );
        assert_eq!(resolve_target("", "xl/workbook.xml"), "xl/workbook.xml");
        assert_eq!(resolve_target("xl/workbook.xml", "/xl/styles.xml"), "xl/styles.xml");
        assert_eq!(
            relative_target("xl/workbook.xml", "xl/worksheets/sheet4.xml"),
            "worksheets/sheet4.xml"
        );
        assert_eq!(relative_target("", "docProps/core.xml"), "docProps/core.xml");
    }
}
