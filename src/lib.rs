//! cadstar-pcb-import: imports CADSTAR PCB archives into a KiCad-style board
//!
//! The archive arrives as an already-parsed object model (read here from
//! JSON) and is rebuilt as a host board: stackup, design rules, footprints,
//! graphics, texts, dimensions, rule areas, zones, tracks and vias.
//!
//! # Architecture
//!
//! - **Archive model**: the foreign design as plain data, referenced by ids
//! - **Board model**: the host items the importer produces
//! - **Import engine**: stages that translate one into the other, recording
//!   every lossy translation as a warning
//!
//! # Modules
//!
//! - [`archive`] - Foreign design object model
//! - [`board`] - Host board object model
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Configuration and front-end error types
//! - [`geometry`] - Points, segments and polygon sets
//! - [`import`] - The import engine

pub mod archive;
pub mod board;
pub mod config;
pub mod error;
pub mod geometry;
pub mod import;
