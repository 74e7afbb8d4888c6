use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PointCloudError {
    #[error(
        "point cloud arrays differ in length: xyz={xyz}, classification={classification}, tree_id={tree_id}"
    )]
    LengthMismatch {
        xyz: usize,
        classification: usize,
        tree_id: usize,
    },
}
