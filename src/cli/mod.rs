pub mod account;
pub mod history;
pub mod rates;
pub mod setup;
pub mod ui;
