pub mod detector;
pub mod field_model;
pub mod labels;
pub mod rules;
