use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use school_records_pdf::{AssetSearch, Error, Officials, RequestRecord, render_request, validate_request};

/// Print a student's document request onto the school's request form.
#[derive(Parser, Debug)]
#[command(name = "school-records-pdf")]
#[command(version, about, long_about = None)]
struct Args {
    /// Request record as JSON (the record store's export format)
    request: PathBuf,

    /// Output file [default: request-<id>.pdf in the current directory]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory searched for fonts/ and images/ before the default locations
    #[arg(long)]
    asset_dir: Option<PathBuf>,

    /// Name printed under the registrar's signature line
    #[arg(long)]
    registrar: Option<String>,

    /// Name printed under the director's signature line
    #[arg(long)]
    director: Option<String>,

    /// Refuse to render a request that fails validation
    #[arg(long)]
    strict: bool,
}

fn officials(args: &Args) -> Officials {
    let placeholder = Officials::placeholder();
    Officials::new(
        args.registrar.clone().unwrap_or(placeholder.registrar_name),
        args.director.clone().unwrap_or(placeholder.director_name),
    )
}

fn run(args: Args) -> Result<(), Error> {
    let json = std::fs::read_to_string(&args.request)?;
    let record: RequestRecord = serde_json::from_str(&json)?;

    if let Err(errors) = validate_request(&record) {
        if args.strict {
            return Err(errors.into());
        }
        for error in errors.iter() {
            log::warn!("request {}: {error}", record.id);
        }
    }

    let mut search = AssetSearch::default_for_process();
    if let Some(dir) = &args.asset_dir {
        search = search.with_dir_first(dir);
    }

    let doc = render_request(&record, &officials(&args), &search)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&doc.filename));
    std::fs::write(&output, &doc.pdf)?;
    log::info!("wrote {} ({})", output.display(), doc.media_type());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
