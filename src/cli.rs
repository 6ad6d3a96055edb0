use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::text::PaseqPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "tanakhdb",
    version,
    about = "Tanakh SQLite database build and migration tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Ingest(IngestArgs),
    Order(OrderArgs),
    Rename(RenameArgs),
    UpgradeSearch(UpgradeSearchArgs),
    Diagnose(DiagnoseArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = "Hebrew_Tanakh_Delitchz.json")]
    pub source_path: PathBuf,

    #[arg(long, default_value = "tanakh.db")]
    pub db_path: PathBuf,

    #[arg(long, value_enum, default_value_t = PaseqPolicy::Keep)]
    pub paseq: PaseqPolicy,

    #[arg(long, default_value = "manifests")]
    pub manifest_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct OrderArgs {
    #[arg(long, default_value = "tanakh.db")]
    pub db_path: PathBuf,

    #[arg(long, default_value = "verses")]
    pub table: String,

    #[arg(long, default_value = "book_id")]
    pub label_column: String,

    #[arg(long)]
    pub mapping_path: Option<PathBuf>,

    #[arg(long, default_value = "manifests")]
    pub manifest_dir: PathBuf,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RenameArgs {
    #[arg(long, default_value = "tanakh.db")]
    pub db_path: PathBuf,

    #[arg(long)]
    pub renames_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct UpgradeSearchArgs {
    #[arg(long, default_value = "tanakh.db")]
    pub db_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct DiagnoseArgs {
    #[arg(long, default_value = "tanakh.db")]
    pub db_path: PathBuf,

    #[arg(long, default_value_t = 1)]
    pub book: i64,

    #[arg(long, default_value_t = 1)]
    pub chapter: i64,

    #[arg(long = "verse", default_values_t = [5_i64, 10])]
    pub verses: Vec<i64>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "tanakh.db")]
    pub db_path: PathBuf,
}
