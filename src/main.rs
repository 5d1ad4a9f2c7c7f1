use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rsql_filter::{
    AbsentPolicy, CompileOptions, ParseOptions, PropertyRegistry, Query, Value, ValueKind,
};
use serde_json::Value as Json;

/// Filter JSON lines with an RSQL expression.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Property declaration `name:kind` (kinds: string, integer, float, boolean, instant, enum,
    /// custom). Dotted names address nested objects; `name.*:kind` declares a map whose
    /// entries are addressed as `name.<key>`.
    #[arg(long = "field", value_parser = parse_field, required = true)]
    fields: Vec<(String, ValueKind)>,
    /// RSQL filter expression
    #[arg(long)]
    filter: String,
    /// JSON-lines input; stdin when omitted
    input: Option<PathBuf>,
    /// Deepest parenthesis nesting accepted in the filter
    #[arg(long, default_value_t = ParseOptions::DEFAULT_MAX_DEPTH)]
    max_depth: usize,
    /// Most comparisons accepted in the filter
    #[arg(long, default_value_t = ParseOptions::DEFAULT_MAX_COMPARISONS)]
    max_comparisons: usize,
    /// Absent fields never match, not even `!=` / `=out=`
    #[arg(long)]
    exclude_absent: bool,
    /// Print the canonical form of the filter and exit
    #[arg(long)]
    canonical: bool,
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_field(arg: &str) -> Result<(String, ValueKind), String> {
    let (name, kind) = arg
        .split_once(':')
        .ok_or_else(|| format!("expected `name:kind`, got `{arg}`"))?;
    Ok((name.to_string(), kind.parse()?))
}

/// Read a JSON value as a property of `kind`; mismatched JSON types count as absent.
fn json_to_value(json: &Json, kind: ValueKind) -> Option<Value> {
    match kind {
        ValueKind::String => json.as_str().map(|s| Value::String(s.to_string())),
        ValueKind::Enum => json.as_str().map(|s| Value::Enum(s.to_string())),
        ValueKind::Integer => json.as_i64().map(Value::Integer),
        ValueKind::Float => json.as_f64().map(Value::Float),
        ValueKind::Boolean => json.as_bool().map(Value::Boolean),
        ValueKind::Instant => json.as_str().and_then(|s| ValueKind::Instant.coerce(s).ok()),
        // No codec on the command line: custom values compare by their JSON string.
        ValueKind::Custom => json.as_str().map(|s| Value::Custom(s.to_string())),
    }
}

fn json_registry(fields: &[(String, ValueKind)]) -> PropertyRegistry<Json> {
    fields
        .iter()
        .fold(PropertyRegistry::builder(), |builder, (name, kind)| {
            let kind = *kind;
            // `tags.*` reads `/tags/<key>` for whatever key the filter names.
            if let Some(prefix) = name.strip_suffix(".*") {
                let pointer = format!("/{}", prefix.replace('.', "/"));
                return builder.map(prefix, kind, move |doc: &Json, key: &str| {
                    doc.pointer(&pointer)
                        .and_then(|map| map.get(key))
                        .and_then(|j| json_to_value(j, kind))
                });
            }
            let pointer = format!("/{}", name.replace('.', "/"));
            builder.dynamic(name.clone(), kind, move |doc: &Json| {
                doc.pointer(&pointer).and_then(|j| json_to_value(j, kind))
            })
        })
        .build()
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Build the registry from the field declarations.
    let registry = json_registry(&args.fields);

    // Parse the filter once, up front.
    let options = ParseOptions {
        max_depth: args.max_depth,
        max_comparisons: args.max_comparisons,
    };
    let query = Query::parse_with(&args.filter, &registry, &options)?;
    if args.canonical {
        println!("{query}");
        return Ok(());
    }

    let absent = if args.exclude_absent {
        AbsentPolicy::Exclude
    } else {
        AbsentPolicy::Distinct
    };
    let predicate = query.compile_with(&registry, &CompileOptions::with_absent(absent))?;

    // Stream the input line by line.
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let (mut seen, mut matched) = (0usize, 0usize);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        seen += 1;
        match serde_json::from_str::<Json>(&line) {
            Ok(doc) if predicate(&doc) => {
                matched += 1;
                println!("{line}");
            }
            Ok(_) => {}
            // Bad lines are reported and skipped, not fatal.
            Err(e) => tracing::warn!(line = lineno + 1, error = %e, "skipping invalid JSON"),
        }
    }
    tracing::info!(seen, matched, "done");
    Ok(())
}

fn main() -> ExitCode {
    // Parse CLI arguments.
    let args = Args::parse();

    // Initialize logging on stderr so stdout stays pure JSON lines.
    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
