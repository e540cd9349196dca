//! The workbook part (`xl/workbook.xml`): sheet list and active tab

use std::fmt;

use xlgrid_core::{NodeId, XmlDocument};

use crate::error::{XlsxError, XlsxResult};

/// Whether a sheet shows up as a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetVisibility {
    #[default]
    Visible,
    /// Hidden, can be unhidden from the UI
    Hidden,
    /// Hidden, can only be unhidden programmatically
    VeryHidden,
}

impl SheetVisibility {
    fn from_state(state: Option<&str>) -> Self {
        match state {
            Some("hidden") => SheetVisibility::Hidden,
            Some("veryHidden") => SheetVisibility::VeryHidden,
            _ => SheetVisibility::Visible,
        }
    }

    fn state(self) -> Option<&'static str> {
        match self {
            SheetVisibility::Visible => None,
            SheetVisibility::Hidden => Some("hidden"),
            SheetVisibility::VeryHidden => Some("veryHidden"),
        }
    }
}

impl fmt::Display for SheetVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetVisibility::Visible => write!(f, "visible"),
            SheetVisibility::Hidden => write!(f, "hidden"),
            SheetVisibility::VeryHidden => write!(f, "very hidden"),
        }
    }
}

/// One `<sheet>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub sheet_id: u32,
    pub r_id: String,
    pub visibility: SheetVisibility,
}

/// The parsed workbook part
#[derive(Debug, Clone)]
pub struct WorkbookPart {
    xml: XmlDocument,
}

impl WorkbookPart {
    /// Parse the part
    pub fn parse(data: &[u8]) -> XlsxResult<Self> {
        let xml = XmlDocument::parse(data)?;
        if xml.name(xml.root()) != "workbook" {
            return Err(XlsxError::InvalidFormat(format!(
                "expected <workbook>, found <{}>",
                xml.name(xml.root())
            )));
        }
        Ok(Self { xml })
    }

    /// Serialize the part
    pub fn to_xml(&self) -> XlsxResult<Vec<u8>> {
        Ok(self.xml.to_xml()?)
    }

    /// Sheets in tab order (worksheets, chartsheets and dialog sheets alike)
    pub fn sheets(&self) -> Vec<SheetEntry> {
        self.sheet_nodes()
            .into_iter()
            .map(|node| SheetEntry {
                name: self.xml.attribute(node, "name").unwrap_or_default().to_string(),
                sheet_id: self
                    .xml
                    .attribute(node, "sheetId")
                    .and_then(|id| id.parse().ok())
                    .unwrap_or(0),
                r_id: relationship_id(&self.xml, node).unwrap_or_default().to_string(),
                visibility: SheetVisibility::from_state(self.xml.attribute(node, "state")),
            })
            .collect()
    }

    /// Tab position of a sheet; names compare case-insensitively
    pub fn position(&self, name: &str) -> Option<usize> {
        self.sheet_nodes()
            .into_iter()
            .position(|node| self.xml.attribute(node, "name").is_some_and(|n| same_name(n, name)))
    }

    /// Append a `<sheet>` and return its new `sheetId`
    pub fn add_sheet(&mut self, name: &str, r_id: &str) -> u32 {
        let sheet_id = self.sheets().iter().map(|s| s.sheet_id).max().unwrap_or(0) + 1;
        let sheets = self.sheets_node();
        let node = self.xml.append_child(sheets, "sheet");
        self.xml.set_attribute(node, "name", name);
        self.xml.set_attribute(node, "sheetId", &sheet_id.to_string());
        self.xml.set_attribute(node, "r:id", r_id);
        sheet_id
    }

    /// Remove a `<sheet>`, keeping the active tab on a remaining sheet
    pub fn remove_sheet(&mut self, name: &str) -> XlsxResult<SheetEntry> {
        let position = self.require(name)?;
        let entry = self.sheets().remove(position);
        let node = self.sheet_nodes()[position];
        self.xml.detach(node);

        let active = self.active_tab();
        let remaining = self.sheet_nodes().len();
        if active > position || active >= remaining {
            self.set_active_tab(active.saturating_sub(1));
        }
        if self.visibility_at(self.active_tab()) != SheetVisibility::Visible {
            self.activate_first_visible();
        }
        Ok(entry)
    }

    /// Rename a `<sheet>`
    pub fn rename_sheet(&mut self, old: &str, new: &str) -> XlsxResult<()> {
        let position = self.require(old)?;
        let node = self.sheet_nodes()[position];
        self.xml.set_attribute(node, "name", new);
        Ok(())
    }

    /// Change the visibility of a sheet
    ///
    /// Hiding the active sheet moves the active tab to the first visible one.
    pub fn set_visibility(&mut self, name: &str, visibility: SheetVisibility) -> XlsxResult<()> {
        let position = self.require(name)?;
        let node = self.sheet_nodes()[position];
        match visibility.state() {
            Some(state) => self.xml.set_attribute(node, "state", state),
            None => {
                self.xml.remove_attribute(node, "state");
            }
        }
        if position == self.active_tab() && visibility != SheetVisibility::Visible {
            self.activate_first_visible();
        }
        Ok(())
    }

    /// Index of the selected tab
    pub fn active_tab(&self) -> usize {
        self.workbook_view()
            .and_then(|view| self.xml.attribute(view, "activeTab"))
            .and_then(|tab| tab.parse().ok())
            .unwrap_or(0)
    }

    /// Select a tab; 0 removes the attribute, as Excel does
    pub fn set_active_tab(&mut self, index: usize) {
        let view = match self.workbook_view() {
            Some(view) => view,
            None => {
                if index == 0 {
                    return;
                }
                let root = self.xml.root();
                let views = match self.xml.child(root, "bookViews") {
                    Some(views) => views,
                    None => match self.xml.child(root, "sheets") {
                        Some(sheets) => self.xml.insert_before(sheets, "bookViews"),
                        None => self.xml.append_child(root, "bookViews"),
                    },
                };
                self.xml.append_child(views, "workbookView")
            }
        };
        if index == 0 {
            self.xml.remove_attribute(view, "activeTab");
        } else {
            self.xml
                .set_attribute(view, "activeTab", &index.to_string());
        }
    }

    fn activate_first_visible(&mut self) {
        let first = self
            .sheets()
            .iter()
            .position(|s| s.visibility == SheetVisibility::Visible)
            .unwrap_or(0);
        self.set_active_tab(first);
    }

    fn visibility_at(&self, position: usize) -> SheetVisibility {
        self.sheet_nodes()
            .get(position)
            .map(|&node| SheetVisibility::from_state(self.xml.attribute(node, "state")))
            .unwrap_or_default()
    }

    fn require(&self, name: &str) -> XlsxResult<usize> {
        self.position(name)
            .ok_or_else(|| XlsxError::SheetNotFound(name.to_string()))
    }

    fn workbook_view(&self) -> Option<NodeId> {
        let views = self.xml.child(self.xml.root(), "bookViews")?;
        self.xml.child(views, "workbookView")
    }

    fn sheet_nodes(&self) -> Vec<NodeId> {
        match self.xml.child(self.xml.root(), "sheets") {
            Some(sheets) => self.xml.children_named(sheets, "sheet").collect(),
            None => Vec::new(),
        }
    }

    fn sheets_node(&mut self) -> NodeId {
        let root = self.xml.root();
        if let Some(sheets) = self.xml.child(root, "sheets") {
            return sheets;
        }
        let after = self
            .xml
            .child(root, "bookViews")
            .or_else(|| self.xml.child(root, "workbookPr"));
        match after {
            Some(after) => self.xml.insert_after(after, "sheets"),
            None => self.xml.prepend_child(root, "sheets"),
        }
    }
}

/// Sheet names are unique regardless of case
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// The relationship id of a `<sheet>`, whatever prefix the namespace got
fn relationship_id(xml: &XmlDocument, node: NodeId) -> Option<&str> {
    xml.attribute(node, "r:id").or_else(|| {
        xml.attributes(node)
            .find(|(key, _)| key.ends_with(":id"))
            .map(|(_, value)| value)
    })
}
