//! Word-processor style document: paragraphs, tables and section headers/footers

use super::{DocumentError, TextSource};
use crate::block::Address;
use serde::{Deserialize, Serialize};

/// A word-processor document
///
/// Walk order is body paragraphs, then tables (row by row, cell by cell),
/// then each section's header followed by its footer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordDocument {
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub paragraphs: Vec<String>,
}

/// Page header and footer of one document section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub header: Vec<String>,
    #[serde(default)]
    pub footer: Vec<String>,
}

impl WordDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paragraph(mut self, text: &str) -> Self {
        self.paragraphs.push(text.to_string());
        self
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    fn slot(&self, address: &Address) -> Option<&String> {
        match address.segments()?.as_slice() {
            [("p", p)] => self.paragraphs.get(*p),
            [("table", t), ("row", r), ("cell", c), ("p", p)] => self
                .tables
                .get(*t)?
                .rows
                .get(*r)?
                .get(*c)?
                .paragraphs
                .get(*p),
            [("header", s), ("p", p)] => self.sections.get(*s)?.header.get(*p),
            [("footer", s), ("p", p)] => self.sections.get(*s)?.footer.get(*p),
            _ => None,
        }
    }

    fn slot_mut(&mut self, address: &Address) -> Option<&mut String> {
        match address.segments()?.as_slice() {
            [("p", p)] => self.paragraphs.get_mut(*p),
            [("table", t), ("row", r), ("cell", c), ("p", p)] => self
                .tables
                .get_mut(*t)?
                .rows
                .get_mut(*r)?
                .get_mut(*c)?
                .paragraphs
                .get_mut(*p),
            [("header", s), ("p", p)] => self.sections.get_mut(*s)?.header.get_mut(*p),
            [("footer", s), ("p", p)] => self.sections.get_mut(*s)?.footer.get_mut(*p),
            _ => None,
        }
    }
}

impl Table {
    /// Build a table from rows of single-paragraph cells
    pub fn from_rows(rows: &[&[&str]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|text| Cell::from_text(text)).collect())
                .collect(),
        }
    }
}

impl Cell {
    pub fn from_text(text: &str) -> Self {
        Self {
            paragraphs: vec![text.to_string()],
        }
    }
}

impl TextSource for WordDocument {
    fn positions(&self) -> Vec<Address> {
        let mut positions = Vec::new();

        for p in 0..self.paragraphs.len() {
            positions.push(Address::from_path(&[("p", p)]));
        }

        for (t, table) in self.tables.iter().enumerate() {
            for (r, row) in table.rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    for p in 0..cell.paragraphs.len() {
                        positions.push(Address::from_path(&[
                            ("table", t),
                            ("row", r),
                            ("cell", c),
                            ("p", p),
                        ]));
                    }
                }
            }
        }

        for (s, section) in self.sections.iter().enumerate() {
            for p in 0..section.header.len() {
                positions.push(Address::from_path(&[("header", s), ("p", p)]));
            }
            for p in 0..section.footer.len() {
                positions.push(Address::from_path(&[("footer", s), ("p", p)]));
            }
        }

        positions
    }

    fn read(&self, address: &Address) -> Result<String, DocumentError> {
        self.slot(address)
            .cloned()
            .ok_or_else(|| DocumentError::UnknownAddress(address.clone()))
    }

    fn write(&mut self, address: &Address, text: &str) -> Result<(), DocumentError> {
        let slot = self
            .slot_mut(address)
            .ok_or_else(|| DocumentError::UnknownAddress(address.clone()))?;
        *slot = text.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WordDocument {
        WordDocument::new()
            .with_paragraph("Title")
            .with_paragraph("   ")
            .with_table(Table::from_rows(&[&["a", "b"], &["c", "d"]]))
            .with_section(Section {
                header: vec!["Head".to_string()],
                footer: vec!["Foot".to_string()],
            })
    }

    #[test]
    fn test_positions_follow_document_order() {
        let doc = sample();
        let positions: Vec<String> = doc
            .positions()
            .iter()
            .map(|a| a.as_str().to_string())
            .collect();
        assert_eq!(
            positions,
            vec![
                "p[0]",
                "p[1]",
                "table[0]/row[0]/cell[0]/p[0]",
                "table[0]/row[0]/cell[1]/p[0]",
                "table[0]/row[1]/cell[0]/p[0]",
                "table[0]/row[1]/cell[1]/p[0]",
                "header[0]/p[0]",
                "footer[0]/p[0]",
            ]
        );
    }

    #[test]
    fn test_read_every_position() {
        let doc = sample();
        let texts: Vec<String> = doc
            .positions()
            .iter()
            .map(|a| doc.read(a).unwrap())
            .collect();
        assert_eq!(texts, vec!["Title", "   ", "a", "b", "c", "d", "Head", "Foot"]);
    }

    #[test]
    fn test_write_table_cell() {
        let mut doc = sample();
        let addr = Address::from_path(&[("table", 0), ("row", 1), ("cell", 0), ("p", 0)]);
        doc.write(&addr, "C").unwrap();
        assert_eq!(doc.tables[0].rows[1][0].paragraphs[0], "C");
        assert_eq!(doc.read(&addr).unwrap(), "C");
    }

    #[test]
    fn test_write_footer() {
        let mut doc = sample();
        let addr = Address::from_path(&[("footer", 0), ("p", 0)]);
        doc.write(&addr, "Pie").unwrap();
        assert_eq!(doc.sections[0].footer[0], "Pie");
    }

    #[test]
    fn test_unknown_address() {
        let mut doc = sample();
        let out_of_range = Address::from_path(&[("p", 9)]);
        let foreign = Address::from_path(&[("slide", 0), ("shape", 0), ("p", 0)]);

        assert_eq!(
            doc.read(&out_of_range),
            Err(DocumentError::UnknownAddress(out_of_range.clone()))
        );
        assert!(doc.write(&foreign, "x").is_err());
        assert!(doc.read(&Address::from("garbage")).is_err());
    }

    #[test]
    fn test_deserialize_with_missing_regions() {
        let doc: WordDocument = serde_json::from_str(r#"{"paragraphs": ["one"]}"#).unwrap();
        assert_eq!(doc.paragraphs, vec!["one"]);
        assert!(doc.tables.is_empty());
        assert!(doc.sections.is_empty());
    }
}
