pub mod cache;
pub mod heuristics;
pub mod mapping_model;
pub mod resolver;
pub mod service;
pub mod url_shape;
