//! smk-lib: incremental native-code build engine.
//!
//! This crate turns a fixed set of C/C++ sources into one executable while
//! skipping work that is already up to date:
//! - `compile`: per-file staleness checks driven by compiler dependency files,
//!   and bounded parallel compilation
//! - `link`: link-command fingerprinting and relink decisions
//! - `build`: the `Builder` that sequences configure, compile, link and
//!   compile-database emission
//! - `config`: build configuration and `smk.toml` loading

pub mod build;
pub mod compile;
pub mod config;
pub mod consts;
pub mod depfile;
pub mod layout;
pub mod library;
pub mod link;
pub mod util;
