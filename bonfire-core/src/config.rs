// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use std::path::Path;

use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Prefix prepended to `image:`/`image@:` sources.
    pub image_base: String,
    /// Emit `target="_blank" rel="noopener"` on navigable buttons and
    /// link-cards.
    pub links_in_new_tab: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            image_base: "images/".to_string(),
            links_in_new_tab: true,
        }
    }
}

pub fn load_options_from_yaml_file(path: &Path) -> crate::Result<Options> {
    let content = std::fs::read_to_string(path)?;
    let options = serde_yaml::from_str::<Options>(&content)?;
    Ok(options)
}
