pub mod builder;
pub mod locator;
