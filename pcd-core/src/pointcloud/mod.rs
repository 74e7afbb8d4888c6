pub mod grouping;
pub mod point;
pub mod slice;
