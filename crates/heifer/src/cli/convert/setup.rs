//! Config assembly: file, then environment and flags on top.

use heifer_core::Config;
use std::path::Path;

use super::ConvertArgs;

/// Build and validate the batch configuration.
///
/// Every validation problem is logged before bailing, and nothing on disk is
/// touched when the configuration is invalid.
pub fn build_config(args: &ConvertArgs, config_path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = crate::cli::load_config(config_path)?;
    apply_overrides(&mut config, args);

    if let Err(e) = config.validate() {
        let problems = e.problems();
        for problem in &problems {
            tracing::error!("{problem}");
        }
        anyhow::bail!(
            "Invalid configuration ({} problem(s)). \
             Set INPUT_DIRECTORY, OUTPUT_DIRECTORY and MAX_IMG_SIZE or pass them as arguments.",
            problems.len()
        );
    }

    Ok(config)
}

/// Apply values that came from the environment or the command line.
pub fn apply_overrides(config: &mut Config, args: &ConvertArgs) {
    if let Some(input) = &args.input {
        config.conversion.input_dir = input.clone();
    }
    if let Some(output) = &args.output {
        config.conversion.output_dir = output.clone();
    }
    if let Some(max_size) = args.max_size {
        config.conversion.max_image_dimension = max_size;
    }
    if let Some(policy) = args.on_collision {
        config.conversion.on_collision = policy.into();
    }
    if let Some(workers) = args.workers {
        config.processing.parallel_workers = workers;
    }
    if let Some(quality) = args.quality {
        config.encoding.quality = quality;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.limits.task_timeout_ms = timeout_ms;
    }
}
