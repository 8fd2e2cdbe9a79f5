use gofr::engine::config::{
    DEFAULT_ANGLE_SELECTION, DEFAULT_MAX_DISTANCE, DEFAULT_POINTS, DEFAULT_SELECTION,
};

pub const RDF_EXTENSION: &str = "rdf";
pub const ANGLES_EXTENSION: &str = "ang";

pub struct DefaultsConfig {
    pub selection: String,
    pub angle_selection: String,
    pub max_distance: f64,
    pub points: usize,
    pub format: String,
    pub start: usize,
    pub stride: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            selection: DEFAULT_SELECTION.to_string(),
            angle_selection: DEFAULT_ANGLE_SELECTION.to_string(),
            max_distance: DEFAULT_MAX_DISTANCE,
            points: DEFAULT_POINTS,
            format: "XYZ".to_string(),
            start: 0,
            stride: 1,
        }
    }
}
