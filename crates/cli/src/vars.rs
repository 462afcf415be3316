//! `vars`, `history` and `env` commands.

use crate::args::VarsCommand;
use color_eyre::eyre::Result;
use colored::Colorize;
use rp_core::config::loader::{
    forget_params, load_settings, resolve_executable, save_settings,
};
use rp_core::config::variables::VariableStore;
use rp_core::environment::probe;
use rp_protocol::variable_models::{Variable, VariableKind};
use std::path::Path;
use std::process::ExitCode;

pub fn vars(root: &Path, action: VarsCommand) -> Result<ExitCode> {
    let store = VariableStore::new(root);

    match action {
        VarsCommand::List { json } => {
            let variables = store.load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&variables)?);
            } else {
                print_variables(&variables);
            }
        }
        VarsCommand::Add {
            name,
            value,
            kind,
            description,
            options,
        } => {
            let variable = Variable::new(name, kind, value)
                .with_description(description)
                .with_options(options);
            store.add(variable)?;
            println!("{}", format!("Saved {}", store.path().display()).dimmed());
        }
        VarsCommand::Remove { name } => {
            store.remove(&name)?;
            println!("Removed {}", name.bold());
        }
        VarsCommand::Set { name, value } => {
            store.set_value(&name, &value)?;
            println!("{} = {value}", name.bold());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_variables(variables: &[Variable]) {
    if variables.is_empty() {
        println!("{}", "No variables defined.".dimmed());
        return;
    }

    let width = variables.iter().map(|v| v.name.len()).max().unwrap_or(0);
    for variable in variables {
        let value = match variable.kind {
            VariableKind::Password => "********".to_string(),
            _ => variable.value.clone(),
        };
        let name = format!("{:width$}", variable.name);
        let kind = format!("{:8}", variable.kind.to_string());
        let mut line = format!("{}  {}  {value}", name.bold(), kind.cyan());
        if !variable.description.is_empty() {
            line.push_str(&format!("  {}", variable.description.dimmed()));
        }
        println!("{line}");
    }
}

pub fn history(root: &Path, forget: Option<String>) -> Result<ExitCode> {
    let mut settings = load_settings(root)?;

    if let Some(args) = forget {
        if forget_params(&mut settings, &args) {
            save_settings(root, &settings)?;
            println!("Forgot {}", args.bold());
        } else {
            println!("{}", format!("'{args}' is not in the history").yellow());
        }
        return Ok(ExitCode::SUCCESS);
    }

    if settings.param_history.is_empty() {
        println!("{}", "No additional arguments used yet.".dimmed());
    }
    for (i, args) in settings.param_history.iter().enumerate() {
        println!("{:>3}  {args}", i + 1);
    }
    Ok(ExitCode::SUCCESS)
}

fn label(name: &str) -> colored::ColoredString {
    format!("{name:10}").bold()
}

pub async fn env(root: &Path, json: bool) -> Result<ExitCode> {
    let settings = load_settings(root)?;
    let info = probe(&resolve_executable(root, &settings.executable)).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{} {}", label("executable"), info.executable);
        match &info.path {
            Some(path) => println!("{} {}", label("path"), path.display()),
            None => println!("{} {}", label("path"), "not found on PATH".red()),
        }
        println!(
            "{} {}",
            label("version"),
            info.version.as_deref().unwrap_or("unknown")
        );
        println!("{} {}s", label("grace"), settings.grace_period_secs);
    }

    Ok(if info.is_available() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(crate::run::EXIT_TOOL_ERROR)
    })
}
