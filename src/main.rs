use std::{error::Error as StdError, process};

use clap::Parser;
use mdp::{cli::CliArgs, convert, emit, error::AppError, preview, telemetry};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let args = CliArgs::parse();
    telemetry::init()?;

    let doc = convert::convert(&args.file, args.template.as_deref())?;

    if args.skip_preview {
        emit::emit(&doc)?;
        return Ok(());
    }

    let done = preview::serve(doc).await?;
    preview::await_completion(done).await
}

fn report_application_error(error: &AppError) {
    eprintln!("mdp: {error}");
    let mut source = error.source();
    while let Some(inner) = source {
        eprintln!("  caused by: {inner}");
        source = inner.source();
    }
}
