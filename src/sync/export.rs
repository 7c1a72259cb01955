//! Row export: forms to a header-plus-rows grid of cell text.
//!
//! # Snapshot Mode
//!
//! A grid always represents the full current state of the form table, not a
//! log of changes. Publishing replaces the sheet contents wholesale.
//!
//! The grid is total: exactly one row per input in input order, and exactly
//! [`COLUMN_COUNT`] cells per row. Missing fields render as empty cells.

use serde_json::{Map, Value};

use crate::model::Form;
use crate::sync::field::{field_value, FormField, FormSource};
use crate::sync::hash::rows_hash;

/// Number of exported columns (sheet columns A through H).
pub const COLUMN_COUNT: usize = FormField::EXPORTED.len();

/// Header row, in column order.
pub const HEADER: [&str; COLUMN_COUNT] = [
    "ID",
    "Name",
    "Email",
    "Phone",
    "Message",
    "Company",
    "Service",
    "Created At",
];

/// One exported row.
pub type Row = [String; COLUMN_COUNT];

/// Header plus one row per form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Row>,
}

impl Grid {
    /// Build a grid from any mix of form shapes. Order is preserved.
    pub fn from_sources<'a, I>(sources: I) -> Self
    where
        I: IntoIterator<Item = FormSource<'a>>,
    {
        let rows = sources
            .into_iter()
            .map(|src| FormField::EXPORTED.map(|field| field_value(src, field)))
            .collect();
        Self { rows }
    }

    #[must_use]
    pub fn from_forms(forms: &[Form]) -> Self {
        Self::from_sources(forms.iter().map(FormSource::Record))
    }

    #[must_use]
    pub fn from_maps(maps: &[Map<String, Value>]) -> Self {
        Self::from_sources(maps.iter().map(FormSource::Map))
    }

    /// Data rows, without the header.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows including the header.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }

    /// Number of cells including the header.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.row_count() * COLUMN_COUNT
    }

    /// Header and rows as the payload written to the sheet.
    #[must_use]
    pub fn values(&self) -> Vec<Vec<String>> {
        std::iter::once(HEADER.map(String::from).to_vec())
            .chain(self.rows.iter().map(|row| row.to_vec()))
            .collect()
    }

    /// SHA256 over every cell, header included.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        rows_hash(self.values())
    }

    /// Render as CSV, header first.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = HEADER.join(",");
        out.push('\n');
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(|cell| crate::csv_escape(cell)).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn form(id: i64, name: &str) -> Form {
        Form {
            id,
            name: name.to_string(),
            email: "a@x.com".to_string(),
            phone_number: "123456789".to_string(),
            message: None,
            company: "C".to_string(),
            service: "S".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn test_header_matches_exported_fields() {
        let titles = FormField::EXPORTED.map(FormField::header);
        assert_eq!(titles, HEADER);
    }

    #[test]
    fn test_empty_grid_is_header_only() {
        let grid = Grid::from_forms(&[]);
        assert!(grid.is_empty());
        assert_eq!(grid.row_count(), 1);
        assert_eq!(grid.values(), vec![HEADER.map(String::from).to_vec()]);
    }

    #[test]
    fn test_rows_follow_input_order() {
        let grid = Grid::from_forms(&[form(3, "C"), form(1, "A"), form(2, "B")]);
        let ids: Vec<&str> = grid.rows().iter().map(|r| r[0].as_str()).collect();
        assert_eq!(ids, ["3", "1", "2"]);
        assert_eq!(grid.cell_count(), 4 * COLUMN_COUNT);
    }

    #[test]
    fn test_record_row_contents() {
        let grid = Grid::from_forms(&[form(1, "A")]);
        assert_eq!(
            grid.rows()[0],
            [
                "1",
                "A",
                "a@x.com",
                "123456789",
                "",
                "C",
                "S",
                "2024-03-05 14:30:00"
            ]
            .map(String::from)
        );
    }

    #[test]
    fn test_maps_with_missing_fields_still_fill_every_column() {
        let Value::Object(sparse) = json!({"name": "Only"}) else {
            unreachable!()
        };
        let grid = Grid::from_maps(&[sparse]);
        assert_eq!(grid.rows()[0].len(), COLUMN_COUNT);
        assert_eq!(grid.rows()[0][1], "Only");
        assert!(grid.rows()[0].iter().enumerate().all(|(i, c)| i == 1 || c.is_empty()));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = Grid::from_forms(&[form(1, "A")]);
        let b = Grid::from_forms(&[form(1, "B")]);
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_to_csv_escapes_cells() {
        let mut f = form(1, "Doe, Jane");
        f.message = Some("said \"hi\"".to_string());
        let csv = Grid::from_forms(&[f]).to_csv();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("ID,Name,Email,Phone,Message,Company,Service,Created At"));
        assert_eq!(
            lines.next(),
            Some("1,\"Doe, Jane\",a@x.com,123456789,\"said \"\"hi\"\"\",C,S,2024-03-05 14:30:00")
        );
    }
}
