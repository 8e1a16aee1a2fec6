use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use garment_pattern::{
    Padding, ParamValue, Pattern, PatternError, PatternTensors, RandomizeOutcome, RotationFormat,
    TensorOptions,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::DatasetConfig;
use crate::error::CliError;

/// Summary written next to the samples of a dataset run.
pub const DATASET_PROPERTIES: &str = "dataset_properties.json";

pub fn info(spec: &Path) -> Result<(), CliError> {
    let pattern = Pattern::from_file(spec)?;

    println!("name: {}", pattern.name);
    println!("panels:");
    for name in pattern.panel_order() {
        let panel = pattern.panel(&name)?;
        println!("  {name}: {} edges", panel.edges.len());
    }
    println!("stitches: {}", pattern.spec().pattern.stitches.len());
    println!("parameters:");
    for name in &pattern.spec().parameter_order {
        let parameter = pattern.parameter(name)?;
        let value = match &parameter.value {
            Some(ParamValue::Scalar(v)) => v.to_string(),
            Some(ParamValue::List(values)) => format!("{values:?}"),
            None => "unset".to_string(),
        };
        println!("  {name} ({:?}): {value}", parameter.kind);
    }
    println!("self-intersecting: {}", pattern.is_self_intersecting());
    Ok(())
}

pub fn encode(
    spec: &Path,
    pad: Option<usize>,
    two_column: bool,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let pattern = Pattern::from_file(spec)?;
    let tensors = pattern.pattern_as_tensors(TensorOptions {
        pad_to_len: pad,
        with_placement: true,
        rotation_format: if two_column {
            RotationFormat::TwoColumn
        } else {
            RotationFormat::Euler
        },
        with_stitches: true,
        with_stitch_tags: true,
    })?;

    match output {
        Some(path) => {
            write_json(path, &tensors)?;
            info!(
                pattern = %pattern.name,
                output = %path.display(),
                panels = tensors.panel_count(),
                pad_len = tensors.pad_len(),
                "tensors written"
            );
        }
        None => {
            let text = serde_json::to_string_pretty(&tensors)
                .map_err(|e| CliError::processing(e.to_string()))?;
            println!("{text}");
        }
    }
    Ok(())
}

pub struct DecodeArgs {
    pub tensors: PathBuf,
    pub output: PathBuf,
    pub name: Option<String>,
    pub template: Option<PathBuf>,
    pub padding: Padding,
}

pub fn decode(args: DecodeArgs) -> Result<(), CliError> {
    let file = File::open(&args.tensors).map_err(|e| {
        CliError::input(format!("failed to read {}: {e}", args.tensors.display()))
    })?;
    let tensors: PatternTensors = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        CliError::input(format!("malformed tensor file {}: {e}", args.tensors.display()))
    })?;

    let mut pattern = match &args.template {
        Some(template) => Pattern::from_file(template)?,
        None => Pattern::new(garment_pattern::name_from_path(&args.tensors)),
    };
    if let Some(name) = args.name {
        pattern.name = name;
    }
    pattern.pattern_from_tensors(&tensors, args.padding)?;
    if pattern.is_self_intersecting() {
        warn!(pattern = %pattern.name, "decoded pattern is self-intersecting");
    }

    let dir = pattern.serialize(&args.output, true, "")?;
    println!("{}", dir.display());
    Ok(())
}

pub fn randomize(
    spec: &Path,
    output: &Path,
    seed: Option<u64>,
    name: Option<String>,
) -> Result<(), CliError> {
    let mut pattern = Pattern::from_file(spec)?;
    let seed = seed.unwrap_or_else(rand::random);
    pattern.name = name.unwrap_or_else(|| format!("{}_{seed}", pattern.name));

    let outcome = pattern.randomize(&mut StdRng::seed_from_u64(seed))?;
    debug!(pattern = %pattern.name, seed, attempts = outcome.attempts, "sampled");

    let dir = pattern.serialize(output, true, "")?;
    println!("{}", dir.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct DatasetProperties<'a> {
    #[serde(flatten)]
    config: &'a DatasetConfig,
    seed_used: u64,
    self_intersecting: Vec<String>,
}

pub async fn dataset(config_path: &Path) -> Result<(), CliError> {
    let config = DatasetConfig::load(config_path).map_err(|e| CliError::input(format!("{e:#}")))?;
    let template = Pattern::from_file(&config.template)?;
    let seed = config.seed.unwrap_or_else(rand::random);
    let prefix = config.name.clone().unwrap_or_else(|| template.name.clone());

    let permits = Arc::new(Semaphore::new(config.workers));
    let mut tasks = JoinSet::new();
    for index in 0..config.size {
        let permit = permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CliError::processing(e.to_string()))?;
        let mut pattern = template.clone();
        pattern.name = format!("{prefix}_{index:05}");
        let output = config.output.clone();
        let to_subfolder = config.to_subfolder;

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
            let outcome = pattern.randomize(&mut rng)?;
            pattern.serialize(&output, to_subfolder, "")?;
            Ok::<(String, RandomizeOutcome), PatternError>((pattern.name, outcome))
        });
    }

    let mut self_intersecting = Vec::new();
    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(|e| CliError::processing(e.to_string())) {
            Ok(Ok((name, outcome))) => {
                if outcome.self_intersecting {
                    self_intersecting.push(name);
                }
            }
            Ok(Err(err)) => failures.push(CliError::from(err)),
            Err(err) => failures.push(err),
        }
    }
    if !failures.is_empty() {
        for err in &failures {
            warn!("sample failed: {err}");
        }
        let failed = failures.len();
        let first = failures.swap_remove(0);
        return Err(CliError {
            message: format!("{failed} of {} samples failed: {}", config.size, first.message),
            ..first
        });
    }
    self_intersecting.sort();

    let properties = DatasetProperties {
        config: &config,
        seed_used: seed,
        self_intersecting,
    };
    write_json(&config.output.join(DATASET_PROPERTIES), &properties)?;
    info!(
        samples = config.size,
        seed,
        self_intersecting = properties.self_intersecting.len(),
        output = %config.output.display(),
        "dataset written"
    );
    Ok(())
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<(), CliError> {
    let io_error = |e: std::io::Error| CliError::processing(format!("{}: {e}", path.display()));
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(io_error)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| CliError::processing(e.to_string()))?;
    writer.flush().map_err(io_error)
}
