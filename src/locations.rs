//! Location lists for batch queries.
//!
//! The file has no header and three columns per row: latitude, longitude and
//! a short name (at most 12 characters), matching the portal's bulk format.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PrismError, ValidationError};
use crate::query::Coordinates;
use crate::validate::{check_coordinates, is_float_string};

pub const MAX_NAME_LEN: usize = 12;
/// Row limit of the portal's bulk form.
pub const BULK_ROW_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

impl Location {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

pub fn read_locations(path: impl AsRef<Path>) -> Result<Vec<Location>, PrismError> {
    let file = std::fs::File::open(path.as_ref())?;
    parse_locations(file)
}

pub fn parse_locations<R: Read>(reader: R) -> Result<Vec<Location>, PrismError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut locations: Vec<Location> = Vec::new();
    let mut names = HashSet::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let location = parse_row(i + 1, &record)?;
        if !names.insert(location.name.clone()) {
            return Err(ValidationError::LocationRow {
                row: i + 1,
                reason: format!("duplicate name '{}'", location.name),
            }
            .into());
        }
        locations.push(location);
    }

    if locations.is_empty() {
        return Err(ValidationError::NoLocations.into());
    }

    info!("Location file passed validation: {} rows", locations.len());
    if locations.len() > BULK_ROW_LIMIT {
        info!(
            "More than {} locations; the portal's bulk form would need partitioning",
            BULK_ROW_LIMIT
        );
    }
    Ok(locations)
}

fn parse_row(row: usize, record: &csv::StringRecord) -> Result<Location, ValidationError> {
    let bad = |reason: &str| ValidationError::LocationRow {
        row,
        reason: reason.to_string(),
    };

    if record.len() != 3 {
        return Err(bad("row must have exactly 3 columns"));
    }
    if !is_float_string(&record[0]) {
        return Err(bad("first column must be a float coordinate"));
    }
    if !is_float_string(&record[1]) {
        return Err(bad("second column must be a float coordinate"));
    }

    let name = &record[2];
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(bad("third column must be a name of 1 to 12 characters"));
    }
    if name.contains(['/', '\\']) {
        return Err(bad("name must not contain path separators"));
    }

    let latitude: f64 = record[0].parse().map_err(|_| bad("bad latitude"))?;
    let longitude: f64 = record[1].parse().map_err(|_| bad("bad longitude"))?;
    check_coordinates(latitude, longitude).map_err(|e| bad(&e.to_string()))?;

    Ok(Location {
        latitude,
        longitude,
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_error(input: &str) -> (usize, String) {
        match parse_locations(input.as_bytes()) {
            Err(PrismError::Validation(ValidationError::LocationRow { row, reason })) => {
                (row, reason)
            }
            other => panic!("expected a row error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_locations() {
        let input = "44.0582,-121.3153,bend\n45.5152, -122.6784, portland\n";
        let locations = parse_locations(input.as_bytes()).unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(
            locations[1],
            Location {
                latitude: 45.5152,
                longitude: -122.6784,
                name: "portland".into(),
            }
        );
        assert_eq!(locations[0].coordinates(), Coordinates::new(44.0582, -121.3153));
    }

    #[test]
    fn test_wrong_column_count() {
        let (row, reason) = row_error("44.0,-121.0,bend\n44.0,-121.0\n");
        assert_eq!(row, 2);
        assert!(reason.contains("3 columns"));
    }

    #[test]
    fn test_non_numeric_coordinates() {
        let (row, reason) = row_error("abc,-121.0,bend\n");
        assert_eq!(row, 1);
        assert!(reason.contains("first column"));

        let (_, reason) = row_error("44.0,west,bend\n");
        assert!(reason.contains("second column"));
    }

    #[test]
    fn test_duplicate_names() {
        let (row, reason) = row_error("44.0,-121.0,bend\n45.0,-122.0,bend\n");
        assert_eq!(row, 2);
        assert!(reason.contains("duplicate name 'bend'"));
    }

    #[test]
    fn test_long_name() {
        let (_, reason) = row_error("44.0,-121.0,thisnameistoolong\n");
        assert!(reason.contains("12 characters"));
    }

    #[test]
    fn test_out_of_range_latitude() {
        let (_, reason) = row_error("95.0,-121.0,north\n");
        assert!(reason.contains("Latitude"));
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(
            parse_locations("".as_bytes()),
            Err(PrismError::Validation(ValidationError::NoLocations))
        ));
    }

    #[test]
    fn test_large_files_are_accepted() {
        let input: String = (0..BULK_ROW_LIMIT + 1)
            .map(|i| format!("44.0,-121.0,p{}\n", i))
            .collect();
        assert_eq!(
            parse_locations(input.as_bytes()).unwrap().len(),
            BULK_ROW_LIMIT + 1
        );
    }

    #[test]
    fn test_read_locations_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.csv");
        std::fs::write(&path, "44.0582,-121.3153,bend\n").unwrap();
        assert_eq!(read_locations(&path).unwrap()[0].name, "bend");
    }
}
