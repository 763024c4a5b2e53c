//! Coordinate reference systems and geometry reprojection for map plotting.
//!
//! A [`Registry`] holds projection families and presets and turns a
//! [`ProjectionSpec`] into a cached [`Crs`]. A [`Transformer`] moves single
//! points between two CRSs; [`reproject`] moves whole shapes, cutting them
//! where they leave the target's valid region or cross its antimeridian and
//! stitching polygons back together along the region boundary.

pub mod crs;
pub mod domain;
pub mod error;
mod families;
pub mod geometry;
pub mod proj;
pub mod proj_string;
pub mod registry;
pub mod reproject;
pub mod spec;
pub mod transform;

pub use crs::Crs;
pub use domain::{crosses_discontinuity, split_point, Discontinuity, Domain, Region};
pub use error::{CrsError, ProjError, ReprojectError};
pub use geometry::{Coordinate, Geometry, Leaf, Shape};
pub use proj_string::{parse_proj_string, proj_params, to_proj_string};
pub use registry::{FamilySchema, ParamKind, ParamSchema, Preset, Registry};
pub use reproject::{
    reproject, reproject_with, DroppedVertex, ReprojectOptions, Status, TransformResult,
};
pub use spec::{ParamValue, ProjectionSpec};
pub use transform::Transformer;
