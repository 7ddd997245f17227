//! Importers from other graph formats

pub mod geojson;
