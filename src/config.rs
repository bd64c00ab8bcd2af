use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for preparing a PASCAL VOC dataset from COCO records.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Convert a COCO instances file into one VOC XML file per image
    Convert {
        /// COCO instances JSON file (e.g. annotations/instances_train2017.json)
        #[arg(short = 'a', long = "annotations")]
        annotations: PathBuf,

        #[command(flatten)]
        options: ConvertOptions,
    },
    /// Convert a directory of per-image JSON annotation files
    ConvertJson {
        /// Directory containing one JSON file per image
        #[arg(short = 'd', long = "json_dir")]
        json_dir: PathBuf,

        #[command(flatten)]
        options: ConvertOptions,
    },
    /// Remove unidentified objects from every VOC file in a directory
    PostProcess {
        /// Directory containing VOC XML files
        #[arg(short = 'd', long = "dir")]
        dir: PathBuf,
    },
    /// Keep only the listed classes, deleting label files left empty
    Filter {
        /// Directory containing VOC XML files
        #[arg(long = "labels")]
        labels: PathBuf,

        /// Directory containing the matching .jpg images
        #[arg(long = "images")]
        images: PathBuf,

        /// Classes to keep
        #[arg(use_value_delimiter = true, required = true, value_parser = validate_class)]
        classes: Vec<String>,
    },
    /// Print image, label and per-class instance counts of a dataset
    Inspect {
        /// Dataset root holding `pics_labeled/` and `labels/`
        #[arg(long = "dataset")]
        dataset: PathBuf,

        /// Classes to report; defaults to the street-scene class list
        #[arg(use_value_delimiter = true, value_parser = validate_class)]
        classes: Vec<String>,
    },
}

/// Options shared by the conversion commands.
#[derive(clap::Args, Debug, Clone, PartialEq, Default)]
pub struct ConvertOptions {
    /// Directory the VOC XML files are written to
    #[arg(short = 'o', long = "output", default_value = "coco_data")]
    pub output: PathBuf,

    /// Delete the output directory before writing
    #[arg(long = "clean")]
    pub clean: bool,

    /// Stop at the first document that fails instead of skipping it
    #[arg(long = "fail_fast")]
    pub fail_fast: bool,

    /// Leave unidentified objects in the written files
    #[arg(long = "skip_post_process")]
    pub skip_post_process: bool,
}

// Class names end up as XML text and file-level filters, so blank ones are rejected
pub fn validate_class(s: &str) -> Result<String, String> {
    let class = s.trim();
    if class.is_empty() {
        Err("class name must not be empty".to_string())
    } else {
        Ok(class.to_string())
    }
}
