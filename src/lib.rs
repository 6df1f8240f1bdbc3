pub mod analyze;
pub mod config;
pub mod correlation;
pub mod error;
pub mod parse;
pub mod reference;
pub mod schema;
pub mod validate;
pub mod wasm;
