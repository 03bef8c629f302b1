//! XML row reader for the meter export schema.
//!
//! Exports are dataset documents whose row records are `Items` elements
//! in the `ArrayFieldDataSet` namespace; each child element of a record
//! is one cell, in document order. Cell text that parses as a number
//! becomes numeric.

use std::fs;
use std::path::Path;

use super::{ReadError, ReadResult, RowReader};
use crate::models::{RawRow, RawTable, Scalar};

/// Namespace of the meter export dataset schema.
pub const SOURCE_NAMESPACE: &str = "http://tempuri.org/ArrayFieldDataSet.xsd";

/// Element name of one row record.
pub const SOURCE_ROW_ELEMENT: &str = "Items";

/// Reader for meter export XML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlRowReader;

impl XmlRowReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse document text into a row table.
    pub fn parse(&self, path: &Path, content: &str) -> ReadResult<RawTable> {
        let doc = roxmltree::Document::parse(content).map_err(|e| ReadError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut rows = Vec::new();
        for node in doc.descendants().filter(|n| is_row_element(n)) {
            let cells: Vec<Scalar> = node
                .children()
                .filter(|c| c.is_element())
                .map(|c| Scalar::from_text(c.text().unwrap_or_default()))
                .collect();
            rows.push(RawRow::new(rows.len(), cells));
        }

        if rows.is_empty() {
            return Err(ReadError::NoRows {
                path: path.to_path_buf(),
            });
        }
        Ok(RawTable::new(rows))
    }
}

/// A row record: an `Items` element, namespaced to the dataset schema
/// when a namespace is present at all.
fn is_row_element(node: &roxmltree::Node) -> bool {
    if !node.is_element() || node.tag_name().name() != SOURCE_ROW_ELEMENT {
        return false;
    }
    match node.tag_name().namespace() {
        Some(ns) => ns == SOURCE_NAMESPACE,
        None => true,
    }
}

impl RowReader for XmlRowReader {
    fn read_rows(&self, path: &Path) -> ReadResult<RawTable> {
        let content = fs::read_to_string(path).map_err(|e| ReadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.parse(path, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<ArrayFieldDataSet xmlns="http://tempuri.org/ArrayFieldDataSet.xsd">
  <Items>
    <Field0>/ArrayFieldDataSet/Items</Field0>
    <Field1>Clock</Field1>
  </Items>
  <Items>
    <Field0>row1</Field0>
    <Field1>2024-01-05 10:15:00</Field1>
    <Field2>00000000</Field2>
    <Field3>12.5</Field3>
    <Field4></Field4>
  </Items>
</ArrayFieldDataSet>
"#;

    fn path() -> PathBuf {
        PathBuf::from("sample.xml")
    }

    #[test]
    fn parses_rows_and_cell_types() {
        let table = XmlRowReader::new().parse(&path(), SAMPLE).unwrap();
        assert_eq!(table.len(), 2);
        let row = &table.rows[1];
        assert_eq!(row.origin, 1);
        assert_eq!(row.cells[0], Scalar::Text("row1".to_string()));
        assert_eq!(
            row.cells[1],
            Scalar::Text("2024-01-05 10:15:00".to_string())
        );
        // Leading-zero codes still parse as numbers here; the status
        // column's text styling protects them at export time.
        assert_eq!(row.cells[2], Scalar::Number(0.0));
        assert_eq!(row.cells[3], Scalar::Number(12.5));
        assert_eq!(row.cells[4], Scalar::Empty);
    }

    #[test]
    fn rejects_documents_without_rows() {
        let result = XmlRowReader::new().parse(&path(), "<root><other/></root>");
        assert!(matches!(result, Err(ReadError::NoRows { .. })));
    }

    #[test]
    fn rejects_malformed_xml() {
        let result = XmlRowReader::new().parse(&path(), "<root><Items>");
        assert!(matches!(result, Err(ReadError::Parse { .. })));
    }

    #[test]
    fn foreign_namespace_rows_are_ignored() {
        let content = r#"<root xmlns:o="http://example.com/other">
            <o:Items><o:A>1</o:A></o:Items>
        </root>"#;
        let result = XmlRowReader::new().parse(&path(), content);
        assert!(matches!(result, Err(ReadError::NoRows { .. })));
    }

    #[test]
    fn unnamespaced_rows_are_accepted() {
        let content = "<root><Items><A>1</A><B>two</B></Items></root>";
        let table = XmlRowReader::new().parse(&path(), content).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].cells.len(), 2);
    }

    #[test]
    fn read_rows_reports_missing_file() {
        let result = XmlRowReader::new().read_rows(Path::new("/definitely/missing.xml"));
        assert!(matches!(result, Err(ReadError::Io { .. })));
    }
}
