use std::{ffi::OsStr, path::PathBuf};

use pcd_core::pointcloud::point::ClassifiedPointCloud;

use crate::error::ParseError;

pub mod csv;
pub mod las;

pub trait ParserProvider {
    fn get_parser(&self) -> Box<dyn Parser>;
}

pub trait Parser {
    fn parse(&self) -> Result<ClassifiedPointCloud, ParseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Las,
    Laz,
    Csv,
    Txt,
}

pub fn get_extension(extension: &str) -> Result<Extension, ParseError> {
    match extension.to_lowercase().as_str() {
        "las" => Ok(Extension::Las),
        "laz" => Ok(Extension::Laz),
        "csv" => Ok(Extension::Csv),
        "txt" => Ok(Extension::Txt),
        other => Err(ParseError::UnsupportedExtension(other.to_string())),
    }
}

/// Returns the common extension of all input files.
///
/// LAS and LAZ may be mixed, as may CSV and TXT; anything else is rejected.
pub fn check_and_get_extension(paths: &[PathBuf]) -> Result<Extension, ParseError> {
    let mut extensions = vec![];
    for path in paths {
        let extension = path
            .extension()
            .and_then(OsStr::to_str)
            .ok_or_else(|| ParseError::MissingExtension(path.clone()))?;
        extensions.push(get_extension(extension)?);
    }

    let first = *extensions.first().ok_or(ParseError::NoInput)?;
    let compatible = |a: Extension, b: Extension| {
        use Extension::*;
        matches!((a, b), (Las | Laz, Las | Laz) | (Csv | Txt, Csv | Txt))
    };
    if extensions.iter().any(|&e| !compatible(first, e)) {
        let mut names: Vec<String> = extensions.iter().map(|e| format!("{:?}", e)).collect();
        names.sort();
        names.dedup();
        return Err(ParseError::MixedExtensions(names));
    }

    Ok(first)
}

/// Builds the parser for the given files.
pub fn parser_for(
    filenames: Vec<PathBuf>,
    tree_id_field: Option<String>,
) -> Result<Box<dyn Parser>, ParseError> {
    let provider: Box<dyn ParserProvider> = match check_and_get_extension(&filenames)? {
        Extension::Las | Extension::Laz => Box::new(las::LasParserProvider {
            filenames,
            tree_id_field,
        }),
        Extension::Csv | Extension::Txt => Box::new(csv::CsvParserProvider {
            filenames,
            tree_id_field,
        }),
    };
    Ok(provider.get_parser())
}

pub(crate) fn log_cloud_overview(cloud: &ClassifiedPointCloud) {
    if cloud.is_empty() {
        log::warn!("Point cloud is empty");
        return;
    }

    let bv = &cloud.metadata.bounding_volume;
    log::info!(
        "Point cloud bounds: X({:.2} to {:.2}), Y({:.2} to {:.2}), Z({:.2} to {:.2})",
        bv.min[0],
        bv.max[0],
        bv.min[1],
        bv.max[1],
        bv.min[2],
        bv.max[2]
    );
    log::info!("Classification values: {:?}", cloud.unique_classes());
    log::info!("Found {} unique trees", cloud.tree_ids().len());
}
