pub mod firebase;
pub mod frankfurter;
