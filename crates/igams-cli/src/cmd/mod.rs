pub mod config;
pub mod day;
pub mod db;
pub mod range;
pub mod serve;
