//! Load, render and compare run files written by `crumbtrail-runtime`.

pub mod demo;
pub mod error;
pub mod report;
