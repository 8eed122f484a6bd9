pub mod adapters;
pub mod config;
pub mod documents;
pub mod error;
pub mod tokens;
pub mod web;
