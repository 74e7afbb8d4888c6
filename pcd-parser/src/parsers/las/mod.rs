pub mod extra_bytes;

use std::path::{Path, PathBuf};

use las::Reader;

use pcd_core::pointcloud::point::{Classification, ClassifiedPointCloud};

use super::{log_cloud_overview, Parser, ParserProvider};
use crate::error::ParseError;
use crate::tree_id::{normalize_field_name, resolve_tree_id_field};
use extra_bytes::{extra_bytes_fields, ExtraBytesField};

pub struct LasParserProvider {
    pub filenames: Vec<PathBuf>,
    pub tree_id_field: Option<String>,
}

impl ParserProvider for LasParserProvider {
    fn get_parser(&self) -> Box<dyn Parser> {
        Box::new(LasParser {
            filenames: self.filenames.clone(),
            tree_id_field: self.tree_id_field.clone(),
        })
    }
}

pub struct LasParser {
    pub filenames: Vec<PathBuf>,
    pub tree_id_field: Option<String>,
}

/// Where the tree id of a LAS point is read from.
#[derive(Debug, Clone, PartialEq)]
pub enum LasTreeIdSource {
    ExtraBytes(ExtraBytesField),
    UserData,
    PointSourceId,
}

impl LasTreeIdSource {
    pub fn name(&self) -> &str {
        match self {
            LasTreeIdSource::ExtraBytes(field) => &field.name,
            LasTreeIdSource::UserData => "user_data",
            LasTreeIdSource::PointSourceId => "point_source_id",
        }
    }

    fn read(&self, point: &las::Point) -> i64 {
        match self {
            // Unreadable ids fall back to "no tree".
            LasTreeIdSource::ExtraBytes(field) => field.read_id(&point.extra_bytes).unwrap_or(0),
            LasTreeIdSource::UserData => point.user_data as i64,
            LasTreeIdSource::PointSourceId => point.point_source_id as i64,
        }
    }
}

/// Picks the tree id source among the declared extra-bytes fields and the standard
/// point attributes.
pub fn resolve_las_tree_id_source(
    extra_fields: &[ExtraBytesField],
    forced: Option<&str>,
) -> Result<LasTreeIdSource, ParseError> {
    let find_extra = |normalized: &str| {
        extra_fields
            .iter()
            .find(|f| normalize_field_name(&f.name) == normalized)
    };
    let is_present = |normalized: &str| {
        matches!(normalized, "userdata" | "pointsourceid") || find_extra(normalized).is_some()
    };

    let resolved = resolve_tree_id_field(forced, is_present).ok_or_else(|| {
        ParseError::UnknownTreeIdField(forced.unwrap_or("treeID").to_string())
    })?;

    let source = match find_extra(&resolved) {
        Some(field) => LasTreeIdSource::ExtraBytes(field.clone()),
        None if resolved == "userdata" => LasTreeIdSource::UserData,
        None => LasTreeIdSource::PointSourceId,
    };
    Ok(source)
}

impl LasParser {
    fn parse_file(&self, path: &Path) -> Result<ClassifiedPointCloud, ParseError> {
        let start = std::time::Instant::now();
        let mut reader = Reader::from_path(path)?;

        let header = reader.header();
        let point_count = header.number_of_points();
        let version = header.version().to_string();
        log::info!("Found {} points in {:?} (LAS {})", point_count, path, version);

        let extra_fields = extra_bytes_fields(header.vlrs().iter().chain(header.evlrs()))?;
        log::debug!(
            "Extra bytes attributes: {:?}",
            extra_fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>()
        );

        let source = resolve_las_tree_id_source(&extra_fields, self.tree_id_field.as_deref())?;
        log::info!("Found tree ID data in field: {}", source.name());

        let mut cloud = ClassifiedPointCloud::with_capacity(point_count as usize);
        for las_point in reader.points() {
            let las_point = las_point?;
            let classification = Classification::from(u8::from(las_point.classification));
            let tree_id = source.read(&las_point);
            cloud.push([las_point.x, las_point.y, las_point.z], classification, tree_id);
        }
        log::info!("Read LAS time: {:?}", start.elapsed());

        cloud.metadata.tree_id_field = Some(source.name().to_string());
        cloud.metadata.sources.push(path.to_path_buf());

        Ok(cloud)
    }
}

impl Parser for LasParser {
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
