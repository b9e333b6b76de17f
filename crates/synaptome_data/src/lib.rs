//! # Synaptome Data
//!
//! Plain value types shared by the tissue substrate, its analyzers and the
//! embedding simulation: coordinates, territorial states and delimiters,
//! neighbourhood radii and out-degree histograms.

pub mod data;

pub use data::coordinates::{NeighbourhoodRadii, Shift, TissueCoordinates};
pub use data::histogram::OutDegreeHistogram;
pub use data::territory::{
    Delimiters, TerritorialLists, TerritorialState, NUM_DELIMITERS, NUM_TERRITORIAL_STATES,
};
