// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Controls the deserialization and storage of the tight-binding strip describing the
//! device, which is read from a `.toml` file:
//!
//! ```toml
//! width = 3
//! hopping = 1.0
//! lead_potentials = [0.0, 0.0]
//!
//! [[layers]]
//! potential = 0.5
//! slices = 4
//! ```

/// The deserialization and storage of the `Device`
pub(crate) mod reader;

pub use reader::{Device, Layer};
