pub mod channel;
pub mod tools;
