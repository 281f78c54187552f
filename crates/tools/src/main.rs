use std::fs;
use std::path::PathBuf;

use boundaries::StoreCache;
use clap::{Parser, Subcommand};
use selection::SelectionPolicy;
use serde_json::json;
use tools::{Atlas, MapConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile department/commune selections into map layers")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print department and commune choices plus the initial selection
    Options {
        /// Country map config (JSON)
        #[arg(long)]
        config: PathBuf,

        /// Departments whose communes should be listed (defaults to the initial selection)
        #[arg(long, value_delimiter = ',')]
        departments: Option<Vec<String>>,
    },

    /// Compile a selection into a map document
    Compile {
        /// Country map config (JSON)
        #[arg(long)]
        config: PathBuf,

        #[arg(long, value_delimiter = ',')]
        departments: Option<Vec<String>>,

        #[arg(long, value_delimiter = ',')]
        communes: Option<Vec<String>>,

        /// Fail on names that match no department or commune
        #[arg(long)]
        strict: bool,

        /// Write the document here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();

    match args.command {
        Command::Options {
            config,
            departments,
        } => {
            let config = MapConfig::from_path(&config).map_err(|e| e.to_string())?;
            let atlas = Atlas::open(config, &StoreCache::new()).map_err(|e| e.to_string())?;
            cmd_options(&atlas, departments)
        }
        Command::Compile {
            config,
            departments,
            communes,
            strict,
            output,
        } => {
            let mut config = MapConfig::from_path(&config).map_err(|e| e.to_string())?;
            if strict {
                config.selection_policy = SelectionPolicy::Strict;
            }
            let atlas = Atlas::open(config, &StoreCache::new()).map_err(|e| e.to_string())?;
            cmd_compile(&atlas, departments, communes, output)
        }
    }
}

fn cmd_options(atlas: &Atlas, departments: Option<Vec<String>>) -> Result<(), String> {
    let initial = atlas.initial_selection();
    let listed = departments.unwrap_or_else(|| initial.departments.clone());
    let doc = json!({
        "title": atlas.config().title,
        "departments": atlas.department_options(),
        "communes": atlas.commune_options(&listed),
        "initial": initial,
    });
    let text = serde_json::to_string_pretty(&doc).map_err(|e| format!("encode options: {e}"))?;
    println!("{text}");
    Ok(())
}

fn cmd_compile(
    atlas: &Atlas,
    departments: Option<Vec<String>>,
    communes: Option<Vec<String>>,
    output: Option<PathBuf>,
) -> Result<(), String> {
    let selection = atlas.selection_for(departments, communes);
    let map = atlas.compile(&selection).map_err(|e| e.to_string())?;

    let mut doc = map.to_geojson_value(&atlas.view());
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("title".to_string(), json!(atlas.config().title));
        obj.insert("selection".to_string(), json!(selection));
    }
    let text = serde_json::to_string_pretty(&doc).map_err(|e| format!("encode map: {e}"))?;

    match output {
        Some(path) => {
            fs::write(&path, text).map_err(|e| format!("write {path:?}: {e}"))?;
            info!(
                path = %path.display(),
                layers = map.layers.len(),
                labels = map.labels.len(),
                "wrote map document"
            );
        }
        None => println!("{text}"),
    }
    Ok(())
}
