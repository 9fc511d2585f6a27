//! Settings command implementation
//!
//! Display the effective settings as YAML.

use clap::Args;
use pandocomatic_config::Settings;
use serde::Serialize;
use std::path::Path;

use crate::command::Command;
use crate::common::RuntimeContext;
use crate::error::Result;

/// Show the effective settings
#[derive(Debug, Clone, Args)]
pub struct SettingsCommand {}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct EffectiveSettings<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<&'a Path>,
    data_dir: &'a Path,
    #[serde(flatten)]
    settings: &'a Settings,
}

impl Command for SettingsCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        print!("{}", render(context)?);
        Ok(())
    }
}

fn render(context: &RuntimeContext) -> Result<String> {
    let configuration = context.configuration();
    let effective = EffectiveSettings {
        config_file: context.config_path(),
        data_dir: configuration.data_dir(),
        settings: configuration.settings(),
    };

    Ok(serde_yaml::to_string(&effective)?)
}
