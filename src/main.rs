use std::env;
use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dtalgebra::codec::{Codec, CsvForm};
use dtalgebra::settings::{Settings, DEFAULT_SETTINGS_FILE};
use dtalgebra::{DtalgebraError, ElementSet, KeyCache, Result};

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
}

fn convert(settings: &Settings) -> Result<()> {
    let input = settings
        .input
        .as_deref()
        .ok_or_else(|| DtalgebraError::Config(String::from("no input file configured")))?;
    let output = settings
        .output
        .as_deref()
        .ok_or_else(|| DtalgebraError::Config(String::from("no output file configured")))?;
    let mut cache = KeyCache::new();
    let mut codec = Codec::new(&mut cache).with_charset(settings.charset()?);
    let set: ElementSet = if is_xml(input) {
        codec.read_xml(input)?
    } else {
        codec.read_csv(input)?
    };
    if is_xml(output) {
        codec.write_xml(output, &set)?;
    } else {
        match settings.csv_form()? {
            CsvForm::Standard => codec.write_standard_csv(output, &set)?,
            CsvForm::Table => codec.write_table_csv(output, &set)?,
        }
    }
    info!("Converted {} to {}", input.display(), output.display());
    Ok(())
}

fn main() -> ExitCode {
    let path = env::args().nth(1).unwrap_or_else(|| String::from(DEFAULT_SETTINGS_FILE));
    let settings = match Settings::load(&path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&settings.log_level);
    match convert(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
