// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Error
//! The error type for the binary

use miette::Diagnostic;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Failures of the command line application outside the numerical engines
pub enum AppError {
    /// Reading the device or writing the spectrum failed
    #[error(transparent)]
    #[diagnostic(code(landauer_negf::io_error))]
    IoError(#[from] std::io::Error),
    /// The configuration could not be read or deserialised
    #[error(transparent)]
    #[diagnostic(code(landauer_negf::config_error))]
    ConfigError(#[from] config::ConfigError),
    /// The device or energy grid is malformed
    #[error(transparent)]
    Structural(#[from] crate::error::StructuralError),
}
