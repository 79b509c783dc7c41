//! DNA motif position-specific scoring matrices, integer score scaling and exact p-value tables in Rust

pub mod alphabet;
pub mod config;
pub mod error;
pub mod motif;
pub mod motif_set;
pub mod pvalue;
pub mod report;
pub mod scaling;
pub mod types;
pub mod utils;

pub use alphabet::{Background, DNA_ALPHABET};
pub use config::ScalingConfig;
pub use error::{ErrorKind, MotifError, Result};
pub use motif::{Motif, MotifInfo, ScaledMotif};
pub use motif_set::MotifSet;
pub use pvalue::PvalueTable;
pub use types::MatrixKind;
