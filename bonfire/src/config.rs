// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use std::path::Path;

pub fn load_options(path: Option<&Path>) -> bonfire_core::Result<bonfire_core::Options> {
    match path {
        Some(path) => bonfire_core::config::load_options_from_yaml_file(path),
        None => Ok(bonfire_core::Options::default()),
    }
}
