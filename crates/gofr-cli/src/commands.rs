pub mod angles;
pub mod rdf;
