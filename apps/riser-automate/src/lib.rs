//! Shaft cross-section automation for Speckle-hosted design models.
//!
//! One invocation fetches MEP shaft sizing tables for the model version
//! that triggered the run, draws a schematic cross-section per shaft, and
//! reports the outcome back to the host with the images attached.

pub mod config;
pub mod context;
pub mod run;
