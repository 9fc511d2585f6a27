//! Templates command operations
//!
//! - list: resolved template names with their globs
//! - show: a resolved template rendered as YAML

use clap::Args;
use owo_colors::OwoColorize;

use crate::command::Command;
use crate::common::RuntimeContext;
use crate::error::{CommandError, Result};

/// List resolved templates
#[derive(Debug, Clone, Args)]
pub struct ListCommand {}

impl Command for ListCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        let configuration = context.configuration();

        if configuration.templates().is_empty() {
            println!("No templates configured.");
            return Ok(());
        }

        for (name, template) in configuration.templates().iter() {
            let globs = template.globs();
            if globs.is_empty() {
                println!("  {}", name.bright_white());
            } else {
                println!(
                    "  {}  {}",
                    name.bright_white(),
                    globs.join(", ").dimmed()
                );
            }
        }

        let count = configuration.templates().len();
        println!(
            "\n({} {})",
            count.to_string().bright_green().bold(),
            if count == 1 { "template" } else { "templates" }
        );

        Ok(())
    }
}

/// Show one resolved template
#[derive(Debug, Clone, Args)]
pub struct ShowCommand {
    /// Template name to display
    #[arg(required = true)]
    pub name: String,
}

impl Command for ShowCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        println!("{}", render(context, &self.name)?);
        Ok(())
    }
}

/// Render a resolved template as YAML
fn render(context: &RuntimeContext, name: &str) -> Result<String> {
    let template = context
        .configuration()
        .get_template(name)
        .ok_or_else(|| CommandError::TemplateNotFound(name.to_string()))?;

    Ok(serde_yaml::to_string(template)?)
}
