//! Table import
//!
//! [`TableImporter`] reads a worksheet back into an [`ImportedTable`] or into
//! typed records. Column names come from a header row, or are synthesized as
//! `Column0`, `Column1`, ... when there is none. Every cell goes through
//! [`codec::decode`], so formula cells yield their cached result and error
//! cells their error text.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::codec;
use crate::config::ImportOptions;
use crate::document::{SheetView, Workbook};
use crate::error::Result;
use crate::record::{FieldSetter, FromTableRow, ImportedTable};
use crate::types::{CellSlot, Column, DecodedValue, EmptyReason, TableOutcome, TypeTag};

/// Reads worksheets into tables and records
///
/// # Examples
///
/// ```
/// use sheetbind::config::ImportOptions;
/// use sheetbind::document::Workbook;
/// use sheetbind::import::TableImporter;
/// use sheetbind::types::CellSlot;
///
/// let mut workbook = Workbook::new();
/// let index = workbook.create_sheet("Data");
/// let sheet = workbook.sheet_mut(index).unwrap();
/// sheet.set_cell(CellSlot::new(0, 0), "Name", None);
/// sheet.set_cell(CellSlot::new(0, 1), "Name", None);
/// sheet.set_cell(CellSlot::new(1, 0), "Ann", None);
///
/// let importer = TableImporter::new(ImportOptions::default());
/// let table = importer
///     .import_table(workbook.view(index)?)
///     .into_produced()
///     .unwrap();
/// assert_eq!(table.column_names(), vec!["Name", "Name_dup1"]);
/// # Ok::<(), sheetbind::ExcelError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableImporter {
    options: ImportOptions,
}

impl TableImporter {
    /// Create an importer with the given options
    pub fn new(options: ImportOptions) -> Self {
        TableImporter { options }
    }

    /// Import options in use
    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Import a sheet of `workbook` by name
    pub fn import_sheet(
        &self,
        workbook: &Workbook,
        sheet_name: &str,
    ) -> Result<TableOutcome<ImportedTable>> {
        Ok(self.import_table(workbook.view_by_name(sheet_name)?))
    }

    /// Import a sheet of `workbook` by name into records
    pub fn import_sheet_records<T: FromTableRow>(
        &self,
        workbook: &Workbook,
        sheet_name: &str,
    ) -> Result<TableOutcome<Vec<T>>> {
        Ok(self.import_records(workbook.view_by_name(sheet_name)?))
    }

    /// Read every row after the header into a table of decoded values
    pub fn import_table(&self, view: SheetView<'_>) -> TableOutcome<ImportedTable> {
        let (columns, first_data_row) = match self.resolve_columns(view) {
            Ok(resolved) => resolved,
            Err(reason) => {
                log::debug!("nothing imported from '{}': {}", view.name(), reason);
                return TableOutcome::Empty(reason);
            }
        };

        let mut table = ImportedTable::new(columns);
        let mut skipped = 0usize;
        for row in first_data_row..view.row_span() {
            let values: Vec<DecodedValue> = table
                .columns()
                .iter()
                .map(|column| {
                    codec::decode(view.raw_value(CellSlot::new(row as u32, column.ordinal as u32)))
                })
                .collect();

            if self.options.skip_blank_rows && values.iter().all(DecodedValue::is_missing) {
                skipped += 1;
                continue;
            }
            table.push_row(values);
        }

        log::info!(
            "imported {} rows x {} columns from '{}'{}",
            table.row_count(),
            table.columns().len(),
            view.name(),
            if skipped > 0 {
                format!(" ({} blank rows skipped)", skipped)
            } else {
                String::new()
            }
        );
        TableOutcome::Produced(table)
    }

    /// Read every row after the header into records of type `T`
    ///
    /// Header names are matched to the record's fields case-insensitively.
    /// A cell that cannot be converted leaves its field at the default value.
    pub fn import_records<T: FromTableRow>(&self, view: SheetView<'_>) -> TableOutcome<Vec<T>> {
        let table = match self.import_table(view) {
            TableOutcome::Produced(table) => table,
            TableOutcome::Empty(reason) => return TableOutcome::Empty(reason),
        };

        let setters: IndexMap<String, FieldSetter<T>> = T::setters()
            .into_iter()
            .map(|setter| (setter.name.to_lowercase(), setter))
            .collect();
        let mapping: Vec<(usize, FieldSetter<T>)> = table
            .columns()
            .iter()
            .filter_map(|column| match setters.get(&column.name.to_lowercase()) {
                Some(setter) => Some((column.ordinal, *setter)),
                None => {
                    log::debug!("column '{}' has no matching field", column.name);
                    None
                }
            })
            .collect();
        if mapping.is_empty() {
            log::debug!("no column of '{}' matches a field", view.name());
            return TableOutcome::Empty(EmptyReason::NoColumns);
        }

        let mut records = Vec::with_capacity(table.row_count());
        for (index, row) in table.rows().iter().enumerate() {
            let mut record = T::default();
            let mut populated = false;
            for (ordinal, setter) in &mapping {
                let value = &row[*ordinal];
                if value.is_missing() {
                    continue;
                }
                if (setter.set)(&mut record, value) {
                    populated = true;
                } else {
                    log::debug!(
                        "row {}: value '{}' does not convert to field '{}'",
                        index,
                        value,
                        setter.name
                    );
                }
            }

            if !populated && self.options.skip_blank_rows {
                continue;
            }
            records.push(record);
        }

        TableOutcome::Produced(records)
    }

    /// Column list and first data row
    fn resolve_columns(
        &self,
        view: SheetView<'_>,
    ) -> std::result::Result<(Vec<Column>, usize), EmptyReason> {
        if view.row_span() == 0 {
            return Err(EmptyReason::SheetEmpty);
        }

        let Some(header_row) = self.options.header_row else {
            let count = view.sheet().max_column_count();
            if count == 0 {
                return Err(EmptyReason::NoColumns);
            }
            let columns = (0..count)
                .map(|i| Column::new(format!("Column{}", i), TypeTag::Unknown, i))
                .collect();
            return Ok((columns, 0));
        };

        let header_index =
            u32::try_from(header_row).map_err(|_| EmptyReason::HeaderRowMissing)?;
        let row = view
            .sheet()
            .row(header_index)
            .ok_or(EmptyReason::HeaderRowMissing)?;
        if row.is_empty() {
            return Err(EmptyReason::NoColumns);
        }

        let mut seen = HashSet::with_capacity(row.len());
        let mut columns = Vec::with_capacity(row.len());
        for index in 0..row.len() {
            let raw = view.raw_value(CellSlot::new(header_index, index as u32));
            let name = codec::decode(raw)
                .as_text()
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| format!("Column{}", index));

            let name = if seen.contains(&name.to_lowercase()) {
                let renamed = format!("{}{}{}", name, self.options.duplicate_marker, index);
                log::warn!(
                    "duplicate header '{}' in column {} renamed to '{}'",
                    name,
                    index,
                    renamed
                );
                renamed
            } else {
                name
            };
            seen.insert(name.to_lowercase());
            columns.push(Column::new(name, TypeTag::Unknown, index));
        }

        Ok((columns, header_row + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::datetime_to_serial;
    use crate::document::{CellData, StyleSpec};
    use chrono::NaiveDate;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Person {
        name: String,
        age: Option<u8>,
        active: bool,
    }

    crate::table_record!(Person {
        name: String => "Name",
        age: Option<u8> => "Age",
        active: bool => "Active",
    });

    fn people() -> Workbook {
        let mut workbook = Workbook::new();
        let index = workbook.create_sheet("People");
        let sheet = workbook.sheet_mut(index).unwrap();
        for (col, name) in ["NAME", "age", "Active", "Extra"].iter().enumerate() {
            sheet.set_cell(CellSlot::new(0, col as u32), *name, None);
        }
        sheet.set_cell(CellSlot::new(1, 0), "Ann", None);
        sheet.set_cell(CellSlot::new(1, 1), 31.0, None);
        sheet.set_cell(CellSlot::new(1, 2), true, None);
        sheet.set_cell(CellSlot::new(2, 0), "Bob", None);
        sheet.set_cell(CellSlot::new(2, 1), "unknown", None);
        sheet.set_cell(CellSlot::new(4, 3), "only extra", None);
        workbook
    }

    #[test]
    fn test_import_records_by_header_name() {
        let workbook = people();
        let records: Vec<Person> = TableImporter::default()
            .import_sheet_records(&workbook, "people")
            .unwrap()
            .into_produced()
            .unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(
            records[0],
            Person {
                name: "Ann".to_string(),
                age: Some(31),
                active: true,
            }
        );
        // "unknown" does not convert; age stays at its default
        assert_eq!(records[1].age, None);
        assert_eq!(records[2], Person::default());
    }

    #[test]
    fn test_skip_blank_rows() {
        let workbook = people();
        let importer = TableImporter::new(ImportOptions::default().with_skip_blank_rows(true));

        let table = importer
            .import_sheet(&workbook, "People")
            .unwrap()
            .into_produced()
            .unwrap();
        // row 3 is fully blank, row 4 has the extra column
        assert_eq!(table.row_count(), 3);

        let records: Vec<Person> = importer
            .import_sheet_records(&workbook, "People")
            .unwrap()
            .into_produced()
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_is_not_empty_text() {
        let mut workbook = Workbook::new();
        let index = workbook.create_sheet("S");
        let sheet = workbook.sheet_mut(index).unwrap();
        sheet.set_cell(CellSlot::new(0, 0), "A", None);
        sheet.set_cell(CellSlot::new(0, 1), "B", None);
        sheet.set_cell(CellSlot::new(1, 0), "", None);

        let table = TableImporter::default()
            .import_table(workbook.view(0).unwrap())
            .into_produced()
            .unwrap();
        assert_eq!(table.rows()[0][0], DecodedValue::Text(String::new()));
        assert_eq!(table.rows()[0][1], DecodedValue::Missing);
    }

    #[test]
    fn test_duplicate_headers_keep_both_columns() {
        let mut workbook = Workbook::new();
        let index = workbook.create_sheet("S");
        let sheet = workbook.sheet_mut(index).unwrap();
        for (col, name) in ["Name", "Name", "name", ""].iter().enumerate() {
            sheet.set_cell(CellSlot::new(0, col as u32), *name, None);
        }
        sheet.set_cell(CellSlot::new(1, 1), "second", None);

        let table = TableImporter::default()
            .import_table(workbook.view(0).unwrap())
            .into_produced()
            .unwrap();
        assert_eq!(
            table.column_names(),
            vec!["Name", "Name_dup1", "name_dup2", "Column3"]
        );
        assert_eq!(
            table.get(0, "Name_dup1"),
            Some(&DecodedValue::Text("second".to_string()))
        );
    }

    #[test]
    fn test_without_header_synthesizes_names() {
        let mut workbook = Workbook::new();
        let index = workbook.create_sheet("S");
        let sheet = workbook.sheet_mut(index).unwrap();
        sheet.set_cell(CellSlot::new(0, 0), 1.0, None);
        sheet.set_cell(CellSlot::new(2, 2), 3.0, None);

        let table = TableImporter::new(ImportOptions::default().without_header())
            .import_table(workbook.view(0).unwrap())
            .into_produced()
            .unwrap();
        assert_eq!(table.column_names(), vec!["Column0", "Column1", "Column2"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows()[2][2], DecodedValue::Number(3.0));
    }

    #[test]
    fn test_formula_with_date_result_decodes_as_datetime() {
        let mut workbook = Workbook::new();
        let date_style = workbook.styles_mut().create_style(&StyleSpec {
            num_format: Some("yyyy-mm-dd".to_string()),
            ..Default::default()
        });
        let index = workbook.create_sheet("S");
        let hired = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let sheet = workbook.sheet_mut(index).unwrap();
        sheet.set_cell(CellSlot::new(0, 0), "Plain", None);
        sheet.set_cell(CellSlot::new(0, 1), "Formula", None);
        sheet.set_cell(
            CellSlot::new(1, 0),
            datetime_to_serial(hired),
            Some(date_style),
        );
        sheet.set_cell(
            CellSlot::new(1, 1),
            CellData::Formula {
                formula: "A2".to_string(),
                cached: Box::new(CellData::Number(datetime_to_serial(hired))),
            },
            Some(date_style),
        );

        let table = TableImporter::default()
            .import_table(workbook.view(0).unwrap())
            .into_produced()
            .unwrap();
        assert_eq!(table.rows()[0][0], DecodedValue::DateTime(hired));
        assert_eq!(table.rows()[0][1], DecodedValue::DateTime(hired));
    }

    #[test]
    fn test_empty_outcomes() {
        let mut workbook = Workbook::new();
        workbook.create_sheet("Empty");
        let index = workbook.create_sheet("Data");
        workbook
            .sheet_mut(index)
            .unwrap()
            .set_cell(CellSlot::new(0, 0), "A", None);

        let importer = TableImporter::default();
        let outcome = importer.import_sheet(&workbook, "Empty").unwrap();
        assert_eq!(outcome.empty_reason(), Some(EmptyReason::SheetEmpty));

        let outcome = TableImporter::new(ImportOptions::default().with_header_row(5))
            .import_sheet(&workbook, "Data")
            .unwrap();
        assert_eq!(outcome.empty_reason(), Some(EmptyReason::HeaderRowMissing));

        let outcome = importer.import_sheet_records::<Person>(&workbook, "Data").unwrap();
        assert_eq!(outcome.empty_reason(), Some(EmptyReason::NoColumns));

        assert!(importer.import_sheet(&workbook, "Missing").is_err());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_header_row_beyond_sheet_range() {
        let mut workbook = Workbook::new();
        let index = workbook.create_sheet("Data");
        let sheet = workbook.sheet_mut(index).unwrap();
        sheet.set_cell(CellSlot::new(0, 0), "Name", None);
        sheet.set_cell(CellSlot::new(1, 0), "Ann", None);

        // 2^32 would wrap to row 0 if narrowed unchecked
        let options = ImportOptions::default().with_header_row(1usize << 32);
        let outcome = TableImporter::new(options)
            .import_sheet(&workbook, "Data")
            .unwrap();
        assert_eq!(outcome.empty_reason(), Some(EmptyReason::HeaderRowMissing));
    }
}
