use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use coco2voc::inspect::DEFAULT_CLASSES;
use coco2voc::{
    filter_classes, inspect_dataset, post_process_all, process_coco_dataset, process_json_dir,
    AnnotationStore, Args, Command, Result,
};

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Convert {
            annotations,
            options,
        } => {
            info!("Starting COCO to VOC conversion process...");
            let stats = process_coco_dataset(&annotations, &options)?;
            stats.print_summary();
        }
        Command::ConvertJson { json_dir, options } => {
            info!("Starting per-image JSON to VOC conversion process...");
            let stats = process_json_dir(&json_dir, &options)?;
            stats.print_summary();
        }
        Command::PostProcess { dir } => {
            let removed = post_process_all(&AnnotationStore::new(dir))?;
            info!("Removed {} unidentified objects.", removed);
        }
        Command::Filter {
            labels,
            images,
            classes,
        } => {
            let report = filter_classes(&AnnotationStore::new(labels), &images, &classes)?;
            info!(
                "Kept {} files, removed {} files ({} images) and {} objects.",
                report.kept_documents,
                report.removed_documents,
                report.removed_images,
                report.removed_objects
            );
        }
        Command::Inspect { dataset, classes } => {
            let classes = if classes.is_empty() {
                DEFAULT_CLASSES.iter().map(|c| c.to_string()).collect()
            } else {
                classes
            };
            let stats = inspect_dataset(
                &dataset.join("pics_labeled"),
                &dataset.join("labels"),
                &classes,
            )?;
            stats.print_summary(classes.len());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
