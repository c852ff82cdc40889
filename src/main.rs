use annotator_core::classes::ClassMapping;
use annotator_core::config::{AppConfig, load_config};
use annotator_core::export::archive::DirectoryArchive;
use annotator_core::export::{ExportOptions, ExportRequest, ExportSummary, run_export};
use annotator_core::state::{DatasetStore, create_dataset_from_folder};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const USAGE: &str = "usage: annotator-export <manifest.json | image folder> [yolo|yolo-seg|coco] <out-dir>";

struct Args {
    dataset: PathBuf,
    format: Option<String>,
    out_dir: PathBuf,
}

fn parse_args() -> Option<Args> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [dataset, out_dir] => Some(Args {
            dataset: dataset.into(),
            format: None,
            out_dir: out_dir.into(),
        }),
        [dataset, format, out_dir] => Some(Args {
            dataset: dataset.into(),
            format: Some(format.clone()),
            out_dir: out_dir.into(),
        }),
        _ => None,
    }
}

/// Resolve the manifest for a dataset argument, creating one for a bare folder.
fn manifest_for(dataset: &Path) -> Result<PathBuf, String> {
    if dataset.is_file() {
        return Ok(dataset.to_path_buf());
    }
    let manifest = dataset.join("manifest.json");
    if manifest.is_file() {
        return Ok(manifest);
    }
    create_dataset_from_folder(dataset).map_err(|e| format!("Failed to create dataset: {e}"))
}

fn export_options(config: &AppConfig, format: Option<String>) -> Result<ExportOptions, String> {
    let mut options = ExportOptions::from_config(&config.export);
    if let Some(format) = format {
        options = options.with_format(format);
    }
    if let Some(kind) = options.filter.take() {
        log::warn!("No visual filter is available from the command line; ignoring '{kind}'");
    }
    if let Some(path) = &config.classes.config_file {
        let mapping = ClassMapping::load(path).map_err(|e| format!("Failed to load class mapping: {e}"))?;
        log::info!("Using {} classes from {}", mapping.classes.len(), path);
        options = options.with_class_mapping(mapping);
    }
    // Bad options must fail before a manifest is written into the dataset folder.
    ExportRequest::try_from(options.clone()).map_err(|e| e.to_string())?;
    Ok(options)
}

fn print_summary(summary: &ExportSummary) {
    println!("Format:      {}", summary.format);
    println!(
        "Images:      {} ({} train, {} val)",
        summary.images_exported, summary.train_images, summary.val_images
    );
    println!("Classes:     {}", summary.classes);
    println!("Annotations: {}", summary.annotations_exported);
    println!("Skipped:     {}", summary.skipped_count());
    for skipped in &summary.skipped {
        println!(
            "  image {} annotation {}: {}",
            skipped.image_id, skipped.annotation_id, skipped.reason
        );
    }
}

async fn run(args: Args) -> Result<ExportSummary, String> {
    let config = load_config();
    let options = export_options(&config, args.format)?;

    let manifest = manifest_for(&args.dataset)?;
    let store = DatasetStore::open(&manifest)
        .await
        .map_err(|e| format!("Failed to load dataset: {e}"))?;

    let mut sink = DirectoryArchive::new(&args.out_dir);
    let project_id = store.project_id.clone();
    run_export(&store, &project_id, options, None, &mut sink)
        .await
        .map_err(|e| e.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(args) = parse_args() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match run(args).await {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Export failed: {e}");
            ExitCode::FAILURE
        }
    }
}
