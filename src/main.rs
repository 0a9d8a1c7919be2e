//! Command-line interface for xsdump

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use xsdump::catalog::UriCatalog;
#[cfg(feature = "cli")]
use xsdump::dump::dump_schema;
#[cfg(feature = "cli")]
use xsdump::loader::SchemaLoader;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xsdump")]
#[command(author, version, about = "Dump XSD schema structure as canonical JSON", long_about = None)]
struct Cli {
    /// Path to the XSD schema file
    #[arg(value_name = "SCHEMA")]
    schema: PathBuf,

    /// Path to a flat-file URI catalog
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Output JSON file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty print with 2-space indentation
    #[arg(short, long)]
    pretty: bool,
}

#[cfg(feature = "cli")]
fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> xsdump::Result<()> {
    let loader = match cli.catalog {
        Some(catalog_path) => SchemaLoader::with_catalog(UriCatalog::from_file(catalog_path)?),
        None => SchemaLoader::new(),
    };

    let schema = loader.load(&cli.schema)?;
    let dump = dump_schema(&schema);

    // Render first so a failure never leaves partial output behind
    let json = dump.to_canonical_json(cli.pretty)?;

    match cli.output {
        Some(output_path) => fs::write(output_path, &json)?,
        None => println!("{}", json),
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
