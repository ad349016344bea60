//! `curator` command-line front end: loads CSV files from disk, renders the
//! product groups as text and writes export files.

pub mod commands;
pub mod config;
pub mod presenter;
