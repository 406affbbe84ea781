pub mod executor;
pub mod inline;
