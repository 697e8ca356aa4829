// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use std::fs;
use std::process::ExitCode;

use bonfire::cli;
use bonfire::config;
use clap::{CommandFactory, Parser};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("bonfire: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> bonfire_core::Result<()> {
    let args = cli::CliArgs::parse();
    let options = config::load_options(args.config.as_deref())?;

    let Some(document) = resolve_document(&args)? else {
        cli::CliArgs::command().print_help()?;
        return Ok(());
    };

    let rendered = bonfire_core::render_str_with_options(&document, &options);
    match &args.output {
        Some(path) => fs::write(path, rendered.html.as_bytes())?,
        None => print!("{}", rendered.html),
    }
    Ok(())
}

fn resolve_document(args: &cli::CliArgs) -> bonfire_core::Result<Option<String>> {
    if !args.inputs.is_empty() {
        let mut parts = Vec::with_capacity(args.inputs.len());
        for path in &args.inputs {
            parts.push(fs::read_to_string(path)?);
        }
        return Ok(Some(parts.join("\n")));
    }

    if let Some(dir) = &args.draft_dir {
        let store = bonfire_core::FileStore::in_dir(dir);
        let session = bonfire_core::Session::open(store, None, None);
        return Ok(Some(session.document().to_string()));
    }

    if args.output.is_some() {
        return Err("no input files".into());
    }
    Ok(None)
}
