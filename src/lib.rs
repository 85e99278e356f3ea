//! datagrid-tui - paginated, filterable, sortable record tables for the terminal
//!
//! The reusable pieces live in `components::data_table` and `model`; `app`
//! wires them to an account dataset.

pub mod action;
pub mod app;
pub mod component;
pub mod components;
pub mod config;
pub mod export;
pub mod logging;
pub mod model;
pub mod services;
pub mod tui;
