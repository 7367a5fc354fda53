//! Preparation steps for synthetic clinical-trial datasets: JSON record
//! files to CSV, conditional field rules, date interval consistency and
//! donor cohort subsampling.

pub mod adjust;
pub mod config;
pub mod convert;
pub mod data;
pub mod error;
pub mod interval;
pub mod rules;
pub mod subsample;

pub use config::PrepConfig;
pub use data::{Dataset, EntityType, Table};
pub use error::{PrepError, Result};
