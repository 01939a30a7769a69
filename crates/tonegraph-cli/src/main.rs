//! Tonegraph CLI — builds, verifies, inspects, and runs placeholder
//! style-transfer model artifacts.

mod cli;
mod config;
mod image_loader;
mod report;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tonegraph_artifact::{BuildOptions, LoadedModel, build_artifact, validate};
use tonegraph_core::StyleVariant;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::AppConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::default().with_overrides(cli.model_dir.as_deref(), cli.log.as_deref());
    init_logging(&config.log_filter);

    match cli.command {
        Command::Build {
            variant,
            output,
            optimize,
            size,
        } => {
            let path = output.unwrap_or_else(|| config.artifact_path(variant));
            build(variant, &path, optimize, size)
        }
        Command::Verify { path, json } => {
            verify(&path.unwrap_or_else(|| config.default_artifact()), json);
            // Advisory: every outcome exits 0.
            Ok(())
        }
        Command::Inspect { path } => inspect(&path.unwrap_or_else(|| config.default_artifact())),
        Command::Apply {
            model,
            input,
            output,
        } => apply(&model, &input, &output),
    }
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build(variant: StyleVariant, path: &Path, optimize: bool, size: Option<usize>) -> Result<()> {
    let options = BuildOptions {
        optimize,
        input_size: size.map(|s| (s, s)),
    };
    let summary = build_artifact(variant, path, &options)
        .with_context(|| format!("building {variant} artifact at {}", path.display()))?;
    report::print_build_summary(&summary);
    Ok(())
}

fn verify(path: &Path, json: bool) {
    let outcome = validate(path);
    if let Err(e) = &outcome {
        tracing::error!("{e}");
    }
    if let Err(e) = report::write_verify(&mut std::io::stdout().lock(), &outcome, json) {
        tracing::error!("could not write report: {e}");
    }
}

fn inspect(path: &Path) -> Result<()> {
    let model =
        LoadedModel::open(path).with_context(|| format!("loading {}", path.display()))?;
    report::print_model_details(&model);

    let report = validate(path)?
        .require_found()?
        .reconcile_with(model.inputs(), model.outputs());
    println!();
    if report.warnings.is_empty() {
        println!("[OK] Declared tensors match the expected contract");
    } else {
        report::print_warnings(&report.warnings);
    }
    Ok(())
}

fn apply(model_path: &Path, input: &Path, output: &Path) -> Result<()> {
    let model = LoadedModel::open(model_path)
        .with_context(|| format!("loading {}", model_path.display()))?;
    let declared = model
        .inputs()
        .first()
        .context("model declares no inputs")?;
    let (height, width) = declared
        .height()
        .zip(declared.width())
        .with_context(|| format!("input {declared} is not an image tensor"))?;

    let image = image_loader::load_image(input, height, width)
        .with_context(|| format!("loading {}", input.display()))?;
    let styled = model.run(&image)?;
    image_loader::save_image(&styled, output)
        .with_context(|| format!("writing {}", output.display()))?;

    tracing::info!(
        model = %model_path.display(),
        output = %output.display(),
        "styled image written"
    );
    println!("[OK] Styled image written: {}", output.display());
    Ok(())
}
