use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use autorisatie_formset::{FormSetHost, FormSetProps};
use clap::Parser;

/// Render the autorisatie formset to HTML after a number of add-row clicks.
#[derive(Parser, Debug, Clone)]
#[command(name = "formset-demo", version)]
struct Cli {
    /// Formset config JSON file, or `-` for stdin
    #[arg(long, value_name = "FILE")]
    config: PathBuf,

    /// JSON array with one object per existing row
    #[arg(long, value_name = "FILE")]
    form_data: Option<PathBuf>,

    /// Number of simulated add-row activations
    #[arg(long, default_value_t = 0)]
    append: usize,
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read config from stdin")?;
        return Ok(buffer);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn run(cli: Cli) -> Result<String> {
    let config = read_input(&cli.config)?;
    let form_data = match &cli.form_data {
        Some(path) => read_input(path)?,
        None => String::from("[]"),
    };
    let props = FormSetProps::from_json(&config, &form_data).context("invalid formset props")?;

    let mut host = FormSetHost::mount(props).context("failed to mount formset")?;
    for _ in 0..cli.append {
        host.append_row().context("add-row activation failed")?;
    }
    log::info!(
        "rendered {} rows, TOTAL_FORMS={}",
        host.row_count()?,
        host.total_forms_field()?.unwrap_or_default()
    );
    Ok(host.markup()?)
}

fn main() {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(markup) => println!("{markup}"),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
