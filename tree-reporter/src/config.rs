// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for tree-reporter.

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::Utf8Path;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Overall configuration for tree-reporter.
///
/// The default config is embedded in the binary. A config file, if present, is layered on top of
/// it.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReporterConfig {
    /// Settings for the result tree.
    pub reporter: ReporterSettings,
}

impl ReporterConfig {
    /// The default location of the config within a directory: `.config/tree-reporter.toml`.
    pub const CONFIG_PATH: &'static str = ".config/tree-reporter.toml";

    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config from `config_file`, or if not specified, from `.config/tree-reporter.toml`
    /// under `dir`.
    ///
    /// An explicitly specified config file must exist. If it is not specified and `dir` has no
    /// config file, the default config is used.
    ///
    /// Unknown keys are logged as warnings and otherwise ignored.
    pub fn from_sources(
        dir: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = dir.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;
        if !unknown.is_empty() {
            warn_unknown_keys(&config_file, &unknown);
        }
        Ok(config)
    }

    /// Returns the default config.
    pub fn default_config() -> Self {
        Self {
            reporter: ReporterSettings::default(),
        }
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// Returns the config along with the paths of ignored keys.
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(Self, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: Self = serde_path_to_error::deserialize(ignored_de).map_err(|error| {
            // serde_path_to_error already tracks the key, so drop it from the config error.
            let path = error.path().clone();
            let error = match error.into_inner() {
                ConfigError::At { error, .. } => *error,
                other => other,
            };
            ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                path, error,
            )))
        })?;

        Ok((config, ignored))
    }
}

fn warn_unknown_keys(config_file: &Utf8Path, unknown: &BTreeSet<String>) {
    let mut unknown_str = String::new();
    if unknown.len() == 1
        && let Some(key) = unknown.first()
    {
        // Print this on the same line.
        unknown_str.push_str("key: ");
        unknown_str.push_str(key);
    } else {
        unknown_str.push_str("keys:\n");
        for key in unknown {
            unknown_str.push_str("\n  - ");
            unknown_str.push_str(key);
        }
    }
    warn!("in config file {config_file}, ignoring unknown configuration {unknown_str}");
}

/// Settings that control how the result tree is presented.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReporterSettings {
    /// The `nodeType` attribute for suite nodes.
    pub suite_node_type: String,

    /// The `nodeType` attribute for test nodes.
    pub test_node_type: String,

    /// Whether to send `locationHint` attributes.
    pub location_hints: bool,

    /// Whether to register every test listed in the `start` event before any test runs.
    pub register_upfront: bool,
}

impl Default for ReporterSettings {
    fn default() -> Self {
        Self {
            suite_node_type: "suite".to_owned(),
            test_node_type: "test".to_owned(),
            location_hints: true,
            register_upfront: true,
        }
    }
}
