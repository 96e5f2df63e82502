/*!
 * Command line JSON-LD processor.
 *
 * Reads a document from a file (or STDIN) and prints the result of the chosen
 * operation. Set `RUST_LOG=debug` to see the processing trace.
 */

use affinidi_json_ld::{
    JsonLdError, JsonLdInput, JsonLdOptions, Result, compact, expand, flatten, frame, from_rdf, nquads, normalize,
    to_rdf,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::{
    fs,
    io::{self, Read},
};
use tracing_subscriber::filter;

/// JSON-LD processing tool
#[derive(Parser)]
#[command(name = "jsonld")]
#[command(bin_name = "jsonld")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Input document (reads STDIN when omitted)
    #[arg(short, long, value_name = "FILE")]
    input: Option<String>,

    /// Base IRI used to resolve relative IRIs
    #[arg(short, long)]
    base: Option<String>,

    /// Sort map keys for deterministic output
    #[arg(short, long, default_value_t = false)]
    ordered: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Expand the document
    Expand,

    /// Compact the document against a context file
    Compact {
        #[arg(short, long, value_name = "FILE")]
        context: String,
    },

    /// Flatten the document, optionally compacting against a context file
    Flatten {
        #[arg(short, long, value_name = "FILE")]
        context: Option<String>,
    },

    /// Frame the document with a frame file
    Frame {
        #[arg(short, long, value_name = "FILE")]
        frame: String,
    },

    /// Convert the document to N-Quads
    ToRdf,

    /// Convert N-Quads input to expanded JSON-LD
    FromRdf,

    /// Print the URDNA2015 canonical N-Quads of the document
    Normalize,
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| JsonLdError::loading_document(format!("Couldn't read {path}: {e}"))),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| JsonLdError::loading_document(format!("Couldn't read from STDIN: {e}")))?;
            Ok(buf)
        }
    }
}

fn read_json(path: Option<&str>) -> Result<Value> {
    let text = read_input(path)?;
    serde_json::from_str(&text).map_err(|e| JsonLdError::loading_document(format!("Input is not valid JSON: {e}")))
}

fn print_json(value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| JsonLdError::loading_document(e.to_string()))?;
    println!("{text}");
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // construct a subscriber that prints formatted traces to stdout
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter::EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let mut options = JsonLdOptions::default().with_ordered(args.ordered);
    if let Some(base) = &args.base {
        options = options.with_base(base.clone());
    }
    let input = args.input.as_deref();

    match args.command {
        Commands::Expand => print_json(&expand(read_json(input)?, &options)?),
        Commands::Compact { context } => {
            let context = read_json(Some(&context))?;
            print_json(&compact(read_json(input)?, &context, &options)?)
        }
        Commands::Flatten { context } => {
            let context = context.as_deref().map(|path| read_json(Some(path))).transpose()?;
            print_json(&flatten(read_json(input)?, context.as_ref(), &options)?)
        }
        Commands::Frame { frame: path } => {
            let frame_doc = read_json(Some(&path))?;
            print_json(&frame(read_json(input)?, frame_doc, &options)?)
        }
        Commands::ToRdf => {
            print!("{}", nquads::serialize_dataset(&to_rdf(read_json(input)?, &options)?));
            Ok(())
        }
        Commands::FromRdf => {
            let dataset = nquads::parse(&read_input(input)?)?;
            print_json(&from_rdf(JsonLdInput::from(dataset), &options)?)
        }
        Commands::Normalize => {
            print!("{}", nquads::serialize_dataset(&normalize(read_json(input)?, &options)?));
            Ok(())
        }
    }
}
