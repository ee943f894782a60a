//! Loading of tabular input and composition of address records.
//!
//! Column auto-detection is not done here. Callers name the columns to use
//! with a [`ColumnMapping`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{AddressRecord, DEFAULT_REGION, ErrorKind, Result, RowId, is_supported_region};

/// One data row of the input, as read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    /// Zero-based position of the row, header excluded
    pub row_id: RowId,
    /// Cell values, one per header
    pub values: Vec<String>,
}

impl crate::merge::Keyed for InputRow {
    fn row_id(&self) -> RowId {
        self.row_id
    }
}

/// Which columns hold the address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressColumns {
    /// The whole address in a single column
    Full {
        /// Column name
        column: String,
    },
    /// Street, city, state and zip in separate columns
    Components {
        /// Street address column
        address: String,
        /// City column
        city: String,
        /// State or province column
        state: String,
        /// Postal code column
        zip: String,
    },
}

/// Maps input columns to address roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Where to find the address
    pub address: AddressColumns,
    /// Optional column with a per-row region code
    pub region: Option<String>,
    /// Region for rows without one
    pub default_region: String,
}

impl ColumnMapping {
    /// Read the whole address from one column
    pub fn full<S: Into<String>>(column: S) -> Self {
        Self {
            address: AddressColumns::Full {
                column: column.into(),
            },
            region: None,
            default_region: DEFAULT_REGION.to_string(),
        }
    }

    /// Compose the address from four columns
    pub fn components<S: Into<String>>(address: S, city: S, state: S, zip: S) -> Self {
        Self {
            address: AddressColumns::Components {
                address: address.into(),
                city: city.into(),
                state: state.into(),
                zip: zip.into(),
            },
            region: None,
            default_region: DEFAULT_REGION.to_string(),
        }
    }

    /// Read per-row region codes from `column`
    #[must_use]
    pub fn with_region_column<S: Into<String>>(mut self, column: S) -> Self {
        self.region = Some(column.into());
        self
    }

    /// Use `region` for rows without a region of their own
    #[must_use]
    pub fn with_default_region<S: Into<String>>(mut self, region: S) -> Self {
        self.default_region = region.into();
        self
    }

    fn columns(&self) -> Vec<&str> {
        let mut columns = match &self.address {
            AddressColumns::Full { column } => vec![column.as_str()],
            AddressColumns::Components {
                address,
                city,
                state,
                zip,
            } => vec![address.as_str(), city.as_str(), state.as_str(), zip.as_str()],
        };
        if let Some(region) = &self.region {
            columns.push(region);
        }
        columns
    }
}

/// Input table: a header row plus data rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<InputRow>,
}

impl Dataset {
    /// Read a CSV file with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not valid CSV.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| ErrorKind::from((path.to_path_buf(), e)))?;
        let dataset = Self::from_reader(file)?;
        debug!(
            "Loaded {} rows with columns [{}] from {}",
            dataset.len(),
            dataset.headers.join(", "),
            path.display()
        );
        Ok(dataset)
    }

    /// Read CSV data with a header row.
    ///
    /// Every row must have as many cells as the header.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Csv`] for malformed input.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let rows = reader
            .records()
            .enumerate()
            .map(|(position, record)| {
                Ok(InputRow {
                    row_id: RowId::new(position),
                    values: record?.iter().map(ToString::to_string).collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { headers, rows })
    }

    /// Create a dataset from already parsed rows
    #[must_use]
    pub const fn new(headers: Vec<String>, rows: Vec<InputRow>) -> Self {
        Self { headers, rows }
    }

    /// Column names, in input order
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows, in input order
    #[must_use]
    pub fn rows(&self) -> &[InputRow] {
        &self.rows
    }

    /// Number of data rows
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no data rows
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column called `name`
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Compose one [`AddressRecord`] per row.
    ///
    /// Rows with a blank address still get a record, so that every row ends
    /// up with a result.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MissingColumns`] if a mapped column does not exist
    /// and [`ErrorKind::Configuration`] if the default region is not
    /// supported.
    pub fn records(&self, mapping: &ColumnMapping) -> Result<Vec<AddressRecord>> {
        if !is_supported_region(&mapping.default_region) {
            return Err(ErrorKind::config(format!(
                "Unsupported region code `{}`",
                mapping.default_region
            )));
        }
        let default_region = mapping.default_region.trim().to_ascii_uppercase();

        let missing: Vec<&str> = mapping
            .columns()
            .into_iter()
            .filter(|column| self.column_index(column).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ErrorKind::MissingColumns {
                message: format!("Missing required columns: {}", missing.join(", ")),
                available: self.headers.clone(),
            });
        }

        let index = |name: &str| self.column_index(name).unwrap_or_default();
        let region_index = mapping.region.as_deref().map(index);

        let compose: Box<dyn Fn(&InputRow) -> String> = match &mapping.address {
            AddressColumns::Full { column } => {
                let i = index(column);
                Box::new(move |row| cell(row, i).trim().to_string())
            }
            AddressColumns::Components {
                address,
                city,
                state,
                zip,
            } => {
                let (a, c, s, z) = (index(address), index(city), index(state), index(zip));
                Box::new(move |row| {
                    concatenate_address_fields(cell(row, a), cell(row, c), cell(row, s), cell(row, z))
                })
            }
        };

        Ok(self
            .rows
            .iter()
            .map(|row| {
                let region = region_index
                    .map(|i| cell(row, i).trim())
                    .filter(|region| !is_blank(region))
                    .map_or_else(|| default_region.clone(), str::to_ascii_uppercase);
                AddressRecord::new(row.row_id, compose(row), region)
            })
            .collect())
    }
}

fn cell(row: &InputRow, index: usize) -> &str {
    row.values.get(index).map_or("", String::as_str)
}

/// Spreadsheet exports write missing values as `nan`
fn is_blank(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == "nan"
}

/// Join address components as `"<address>, <city>, <state> <zip>"`.
///
/// Blank and `nan` components are left out. Without city and state the zip
/// code stands on its own.
#[must_use]
pub fn concatenate_address_fields(address: &str, city: &str, state: &str, zip: &str) -> String {
    let clean = |value: &str| {
        if is_blank(value) {
            None
        } else {
            Some(value.trim().to_string())
        }
    };

    let mut parts = Vec::new();
    if let Some(address) = clean(address) {
        parts.push(address);
    }

    let location: Vec<String> = [city, state].into_iter().filter_map(clean).collect();
    match (location.is_empty(), clean(zip)) {
        (false, Some(zip)) => parts.push(format!("{} {zip}", location.join(", "))),
        (false, None) => parts.push(location.join(", ")),
        (true, Some(zip)) => parts.push(zip),
        (true, None) => {}
    }

    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const COMPONENTS: &str = "\
Site,Street,Town,State,Zip,Country
1,1 Main St,Springfield,IL,62701,US
2,,,,,
3,5 Rue de Rivoli,Paris,,75001,fr
4,nan,Austin,TX,nan,
";

    fn dataset() -> Dataset {
        Dataset::from_reader(COMPONENTS.as_bytes()).unwrap()
    }

    #[rstest]
    #[case("1 Main St", "Springfield", "IL", "62701", "1 Main St, Springfield, IL 62701")]
    #[case("1 Main St", "", "", "62701", "1 Main St, 62701")]
    #[case("", "Springfield", "", "", "Springfield")]
    #[case("nan", "nan", "nan", "nan", "")]
    #[case("  1 Main St ", " Springfield", "IL ", "", "1 Main St, Springfield, IL")]
    fn test_concatenate_address_fields(
        #[case] address: &str,
        #[case] city: &str,
        #[case] state: &str,
        #[case] zip: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(concatenate_address_fields(address, city, state, zip), expected);
    }

    #[test]
    fn test_load_assigns_row_ids() {
        let dataset = dataset();
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.headers()[1], "Street");
        let ids: Vec<_> = dataset.rows().iter().map(|r| r.row_id.get()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_component_records() {
        let mapping =
            ColumnMapping::components("Street", "Town", "State", "Zip").with_region_column("Country");
        let records = dataset().records(&mapping).unwrap();

        assert_eq!(
            records,
            vec![
                AddressRecord::new(RowId::new(0), "1 Main St, Springfield, IL 62701", "US"),
                AddressRecord::new(RowId::new(1), "", "US"),
                AddressRecord::new(RowId::new(2), "5 Rue de Rivoli, Paris 75001", "FR"),
                AddressRecord::new(RowId::new(3), "Austin, TX", "US"),
            ]
        );
        assert!(records[1].is_empty());
    }

    #[test]
    fn test_full_address_column() {
        let data = "id,address\n1,\" 10 Downing St, London \"\n";
        let dataset = Dataset::from_reader(data.as_bytes()).unwrap();
        let mapping = ColumnMapping::full("address").with_default_region("gb");

        let records = dataset.records(&mapping).unwrap();
        assert_eq!(
            records,
            vec![AddressRecord::new(RowId::new(0), "10 Downing St, London", "GB")]
        );
    }

    #[test]
    fn test_missing_columns() {
        let err = dataset()
            .records(&ColumnMapping::components("Street", "City", "State", "Postcode"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required columns: City, Postcode. Available columns: Site, Street, Town, State, Zip, Country"
        );
    }

    #[test]
    fn test_unsupported_region() {
        let mapping = ColumnMapping::full("Street").with_default_region("XX");
        assert!(dataset().records(&mapping).unwrap_err().is_configuration());
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = Dataset::from_reader("a,b\n1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ErrorKind::Csv(_)));
    }
}
