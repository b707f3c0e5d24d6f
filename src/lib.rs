#[macro_use] pub mod core;
#[macro_use] pub mod time;

pub mod cli;
pub mod config;
pub mod dataset;
pub mod extraction;
pub mod folders;
pub mod formats;
pub mod formatting;
pub mod records;
pub mod report;
