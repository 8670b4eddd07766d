pub mod clear;
pub mod config;
pub mod context;
pub mod daemon;
pub mod ratings;
pub mod shows;
pub mod sync;
