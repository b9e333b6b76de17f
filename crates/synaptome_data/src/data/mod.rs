//! Core data structures for the Synaptome tissue.

pub mod coordinates;
pub mod histogram;
pub mod territory;
