pub mod config;
pub mod core;
pub mod persistence;
pub mod review;
pub mod wanikani;
