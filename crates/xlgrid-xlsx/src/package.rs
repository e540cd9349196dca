//! The ZIP container of an XLSX document
//!
//! Every entry is held in memory as raw bytes, in archive order. Parts this
//! crate does not understand are written back exactly as they were read.

use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{XlsxError, XlsxResult};

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
}

/// In-memory ZIP package
#[derive(Debug, Clone, Default)]
pub struct Package {
    entries: Vec<Entry>,
}

impl Package {
    /// Create an empty package
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every file entry of an archive
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(Entry { name, data });
        }

        log::debug!("read package with {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Read a package from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Write all entries, deflate-compressed, in their current order
    pub fn write<W: Write + Seek>(&self, writer: W) -> XlsxResult<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in &self.entries {
            zip.start_file(entry.name.as_str(), options)?;
            zip.write_all(&entry.data)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Raw bytes of an entry
    pub fn entry(&self, name: &str) -> Option<&[u8]> {
        self.position(name).map(|i| self.entries[i].data.as_slice())
    }

    /// Entry decoded as UTF-8
    pub fn entry_text(&self, name: &str) -> XlsxResult<Option<&str>> {
        self.entry(name)
            .map(|data| {
                std::str::from_utf8(data).map_err(|_| {
                    XlsxError::InvalidFormat(format!("part '{}' is not valid UTF-8", name))
                })
            })
            .transpose()
    }

    /// Replace an entry, or append it if it does not exist
    pub fn set_entry<S: Into<String>>(&mut self, name: S, data: Vec<u8>) {
        let name = name.into();
        match self.position(&name) {
            Some(i) => self.entries[i].data = data,
            None => self.entries.push(Entry { name, data }),
        }
    }

    /// Remove an entry; returns whether it existed
    pub fn remove_entry(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    /// Check if an entry exists
    pub fn has_entry(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Entry names in archive order
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the package has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_entries_round_trip_in_order() {
        let mut package = Package::new();
        package.set_entry("b.xml", b"<b/>".to_vec());
        package.set_entry("a/c.bin", vec![0, 1, 2, 255]);
        package.set_entry("b.xml", b"<b>2</b>".to_vec());
        assert_eq!(package.len(), 2);

        let mut buf = Vec::new();
        package.write(Cursor::new(&mut buf)).unwrap();
        let read = Package::read(Cursor::new(&buf)).unwrap();

        assert_eq!(read.entry_names().collect::<Vec<_>>(), ["b.xml", "a/c.bin"]);
        assert_eq!(read.entry_text("b.xml").unwrap(), Some("<b>2</b>"));
        assert_eq!(read.entry("a/c.bin"), Some(&[0u8, 1, 2, 255][..]));
        assert!(read.entry_text("a/c.bin").is_err());
        assert_eq!(read.entry_text("missing").unwrap(), None);
    }

    #[test]
    fn test_remove_entry() {
        let mut package = Package::new();
        package.set_entry("x", Vec::new());
        assert!(package.has_entry("x"));
        assert!(package.remove_entry("x"));
        assert!(!package.remove_entry("x"));
        assert!(package.is_empty());
    }

    #[test]
    fn test_not_a_zip() {
        let err = Package::read(Cursor::new(b"plain text".to_vec())).unwrap_err();
        assert!(matches!(err, XlsxError::Zip(_)));
    }
}
