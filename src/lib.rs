// Library exports for Retronet
// This allows integration tests and external code to use Retronet modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod forms;
pub mod mail;
pub mod market;
pub mod repository;
pub mod routes;
pub mod social;
pub mod state;
