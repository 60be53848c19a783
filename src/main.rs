use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::ThreadPoolBuilder;
use tracing::{error, info, warn, Level};

use object_extract_rs::{scan_directory, Config, FilterSpec, ObjectExtractor, YoloModel};

fn main() -> Result<ExitCode> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_max_level(if config.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_target(false)
        .init();

    // Filter and directory problems are reported once and stop the run
    // before the model is loaded.
    let prepared = FilterSpec::from_args(config.confidence, config.classes.as_deref())
        .and_then(|filter| Ok((filter, config.extraction_config()?)))
        .and_then(|(filter, paths)| {
            let image_names = scan_directory(&paths.input_dir)?;
            Ok((filter, paths, image_names))
        });
    let (filter, paths, image_names) = match prepared {
        Ok(prepared) => prepared,
        Err(e) if e.is_run_level() => {
            error!("{e}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build_global()?;

    let model_path = config.model_path()?;
    let model = YoloModel::new(&model_path, config.device_id)
        .with_context(|| format!("Failed to load model: {}", model_path.display()))?;

    info!(
        images = image_names.len(),
        input = %paths.input_dir.display(),
        output = %paths.output_dir.display(),
        "extracting objects"
    );
    let report = ObjectExtractor::new(model, paths, filter).process_images(&image_names);

    if !report.is_complete() {
        warn!(
            "{} of {} images could not be processed, {} objects could not be written",
            report.failures.len(),
            image_names.len(),
            report.artifact_failures.len()
        );
    }
    Ok(ExitCode::SUCCESS)
}
