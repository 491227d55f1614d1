//! The settings of a single fontqa run.

use std::{fs, path::Path};

use indexmap::IndexMap;
use qaengine::{Check, CheckOptions, Registry, RunConfig};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Args, Error};

/// What can be set in a yaml config file.
///
/// ```yaml
/// exclude_checks:
///   - outline_jaggy_segments
/// full_lists: true
/// jobs: 4
/// checks:
///   family/vertical_metrics:
///     some_option: 12
/// ```
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Check ids never to run
    pub exclude_checks: Vec<String>,
    pub full_lists: Option<bool>,
    pub jobs: Option<usize>,
    /// Options for individual checks, by check id
    pub checks: IndexMap<String, CheckOptions>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, Error> {
        let yml = fs::read_to_string(path).map_err(|source| Error::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&yml).map_err(Into::into)
    }

    /// Combine with the command line, which wins where both have a say.
    pub fn run_config<'a>(
        &self,
        args: &Args,
        registry: &'a Registry,
    ) -> Result<(RunConfig, Vec<&'a Check>), Error> {
        let checks = self.select(args, registry)?;
        let run_config = RunConfig {
            selected: Some(checks.iter().map(|c| c.id().clone()).collect()),
            options: self
                .checks
                .iter()
                .map(|(id, options)| (id.as_str().into(), options.clone()))
                .collect(),
            full_lists: args.full_lists || self.full_lists.unwrap_or_default(),
            jobs: args.jobs.or(self.jobs).unwrap_or(1),
        };
        Ok((run_config, checks))
    }

    /// The registered checks the filters let through, in registration order.
    pub fn select<'a>(
        &self,
        args: &Args,
        registry: &'a Registry,
    ) -> Result<Vec<&'a Check>, Error> {
        let include = compile(&args.checkid)?;
        let exclude = compile(&args.exclude_checkid)?;
        for id in self.exclude_checks.iter().chain(self.checks.keys()) {
            if registry.check(id).is_none() {
                log::warn!("Config mentions unknown check '{id}'");
            }
        }
        Ok(registry
            .checks()
            .filter(|c| include.is_empty() || include.iter().any(|re| re.is_match(c.id())))
            .filter(|c| !exclude.iter().any(|re| re.is_match(c.id())))
            .filter(|c| !self.exclude_checks.iter().any(|id| c.id() == id.as_str()))
            .collect())
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, Error> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(Into::into))
        .collect()
}
