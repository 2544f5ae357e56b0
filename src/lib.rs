//! Least-cost generation and storage capacity expansion for a single region at hourly resolution.
#![warn(missing_docs)]
use anyhow::{Context, Result};
use std::path::PathBuf;

pub mod cli;
pub mod finance;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod optimisation;
pub mod output;
pub mod planning;
pub mod results;
pub mod settings;
pub mod solver;
pub mod technology;
pub mod time_index;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the config folder for the program
pub fn get_gencap_config_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("Unable to determine config directory")?;
    path.push("gencap");

    Ok(path)
}
