pub mod create;
pub mod token;
