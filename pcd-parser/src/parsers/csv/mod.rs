use std::{collections::HashMap, path::Path, path::PathBuf};

use csv::ReaderBuilder;

use pcd_core::pointcloud::point::{Classification, ClassifiedPointCloud};

use super::{log_cloud_overview, Parser, ParserProvider};
use crate::error::ParseError;
use crate::tree_id::{normalize_field_name, parse_tree_id, resolve_tree_id_field};

pub struct CsvParserProvider {
    pub filenames: Vec<PathBuf>,
    pub tree_id_field: Option<String>,
}

impl ParserProvider for CsvParserProvider {
    fn get_parser(&self) -> Box<dyn Parser> {
        Box::new(CsvParser {
            filenames: self.filenames.clone(),
            tree_id_field: self.tree_id_field.clone(),
        })
    }
}

pub struct CsvParser {
    pub filenames: Vec<PathBuf>,
    pub tree_id_field: Option<String>,
}

// Column order assumed when the header row is blank.
const POSITIONAL_COLUMNS: [&str; 5] = ["x", "y", "z", "classification", "treeid"];

/// Maps normalized header names to column indices.
fn create_field_mapping(headers: &csv::StringRecord) -> Result<HashMap<String, usize>, ParseError> {
    let has_headers = !headers.iter().all(|h| h.trim().is_empty());

    let mut mapping = HashMap::new();
    if has_headers {
        for (index, header) in headers.iter().enumerate() {
            mapping.entry(normalize_field_name(header)).or_insert(index);
        }
    } else {
        for (index, name) in POSITIONAL_COLUMNS.iter().enumerate() {
            mapping.insert(name.to_string(), index);
        }
    }

    for attr_name in ["x", "y", "z"] {
        if !mapping.contains_key(attr_name) {
            return Err(ParseError::MissingColumn(attr_name.to_string()));
        }
    }

    Ok(mapping)
}

fn get_field_value<'a>(
    record: &'a csv::StringRecord,
    field_mapping: &HashMap<String, usize>,
    field_name: &str,
) -> Option<&'a str> {
    field_mapping
        .get(field_name)
        .and_then(|&index| record.get(index))
}

fn invalid_value(row: usize, field: &str, value: &str) -> ParseError {
    ParseError::InvalidValue {
        row,
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn parse_coordinate(
    record: &csv::StringRecord,
    field_mapping: &HashMap<String, usize>,
    field_name: &str,
    row: usize,
) -> Result<f64, ParseError> {
    let value = get_field_value(record, field_mapping, field_name).unwrap_or("");
    value
        .trim()
        .parse()
        .map_err(|_| invalid_value(row, field_name, value))
}

fn parse_classification(value: Option<&str>, row: usize) -> Result<Classification, ParseError> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(Classification::Ground),
        Some(value) => value,
    };
    let code = value
        .parse::<f64>()
        .ok()
        .filter(|v| v.fract() == 0.0 && (0.0..=255.0).contains(v))
        .ok_or_else(|| invalid_value(row, "classification", value))?;
    Ok(Classification::from(code as u8))
}

impl CsvParser {
    fn parse_file(&self, path: &Path) -> Result<ClassifiedPointCloud, ParseError> {
        let start = std::time::Instant::now();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let field_mapping = create_field_mapping(&headers)?;

        let tree_id_field = resolve_tree_id_field(self.tree_id_field.as_deref(), |f| {
            field_mapping.contains_key(f)
        });
        match (&tree_id_field, &self.tree_id_field) {
            (None, Some(forced)) => return Err(ParseError::UnknownTreeIdField(forced.clone())),
            (None, None) => log::warn!(
                "No tree ID column in {:?}; no point is assigned to a tree",
                path
            ),
            (Some(field), _) => log::info!("Found tree ID data in field: {}", field),
        }

        let mut cloud = ClassifiedPointCloud::default();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            // 1-based, counting the header line.
            let row = index + 2;

            let x = parse_coordinate(&record, &field_mapping, "x", row)?;
            let y = parse_coordinate(&record, &field_mapping, "y", row)?;
            let z = parse_coordinate(&record, &field_mapping, "z", row)?;

            let classification = parse_classification(
                get_field_value(&record, &field_mapping, "classification"),
                row,
            )?;

            let tree_id = match &tree_id_field {
                Some(field) => {
                    let value = get_field_value(&record, &field_mapping, field).unwrap_or("");
                    parse_tree_id(value).ok_or_else(|| invalid_value(row, field, value))?
                }
                None => 0,
            };

            cloud.push([x, y, z], classification, tree_id);
        }
        log::info!("Read CSV time: {:?}", start.elapsed());

        cloud.metadata.tree_id_field = tree_id_field;
        cloud.metadata.sources.push(path.to_path_buf());
        Ok(cloud)
    }
}

impl Parser for CsvParser {
    fn parse(&self) -> Result<ClassifiedPointCloud, ParseError> {
        if self.filenames.is_empty() {
            return Err(ParseError::NoInput);
        }

        let mut merged = ClassifiedPointCloud::default();
        for path in &self.filenames {
            merged.extend(self.parse_file(path)?);
        }
        log_cloud_overview(&merged);

        Ok(merged)
    }
}
