pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod inventory;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod response;
pub mod routes;
pub mod scope;
pub mod services;
pub mod state;
