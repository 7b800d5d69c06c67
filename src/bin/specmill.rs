//! specmill CLI - compile requirement specifications and resolve variable routing
//!
//! Glue around the library pipeline: document in, canonical spec JSON out,
//! plus routing-database queries.

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process;

use specmill::{
    case_renames, load_variable_db, output_type, resolve_type, FormatDescriptor,
    PreprocessCommand, Spec,
};

#[derive(Parser)]
#[command(name = "specmill")]
#[command(version, about = "Compile requirement specifications into canonical monitor specs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a canonical spec from a requirements document
    Extract {
        /// Path to the requirements document
        document: PathBuf,

        /// Format preset name or descriptor file path
        #[arg(short, long, default_value = "record-reqs")]
        format: String,

        /// Expression sub-language (ptltl, smv, literal)
        #[arg(long, default_value = "ptltl")]
        handler: String,

        /// External command translating each requirement expression before parsing
        #[arg(long)]
        preprocess: Option<String>,

        /// Rewrite identifiers to a case convention (snake, camel, pascal, kebab)
        #[arg(long)]
        identifier_case: Option<String>,

        /// Output file for the spec JSON (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve the target-scope type of an input variable
    Resolve {
        /// Input variable name
        input: String,

        /// Scope the variable is routed through
        via_scope: String,

        /// Target scope to resolve into
        to_scope: String,

        /// Routing-description files, merged in order before the built-in default
        #[arg(short, long)]
        db: Vec<PathBuf>,
    },

    /// Look up the declared type of an output variable
    Output {
        /// Output variable name
        name: String,

        /// Routing-description files, merged in order before the built-in default
        #[arg(short, long)]
        db: Vec<PathBuf>,
    },

    /// List the shipped format presets
    Formats,
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Extract {
            document,
            format,
            handler,
            preprocess,
            identifier_case,
            output,
        } => run_extract(document, format, handler, preprocess, identifier_case, output),
        Commands::Resolve {
            input,
            via_scope,
            to_scope,
            db,
        } => run_resolve(input, via_scope, to_scope, db),
        Commands::Output { name, db } => run_output(name, db),
        Commands::Formats => run_formats(),
    };

    if let Err(message) = result {
        eprintln!("error: {}", message);
        process::exit(1);
    }
}

fn run_extract(
    document: PathBuf,
    format: String,
    handler: String,
    preprocess: Option<String>,
    identifier_case: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), String> {
    let preprocess = match preprocess.as_deref() {
        Some(command_line) => Some(PreprocessCommand::parse(command_line)?),
        None => None,
    };

    let mut spec = specmill::compile_spec_file(&document, &format, &handler, preprocess.as_ref())?;

    if let Some(case_name) = identifier_case {
        let case = specmill::expr::parse_case(&case_name)
            .ok_or_else(|| format!("unknown identifier case '{}'", case_name))?;
        spec = rename_identifiers(spec, case);
    }

    let rendered: Spec<String> = spec.map_exprs(|e| e.render());
    let json = serde_json::to_string_pretty(&rendered)
        .map_err(|e| format!("failed to serialize spec: {}", e))?;

    match output {
        Some(path) => std::fs::write(&path, json)
            .map_err(|e| format!("failed to write {}: {}", path.display(), e))?,
        None => println!("{}", json),
    }
    Ok(())
}

/// Rewrite variable declarations and requirement expressions to one case
/// convention.
fn rename_identifiers(spec: Spec<specmill::Expr>, case: convert_case::Case) -> Spec<specmill::Expr> {
    let mut names: Vec<String> = spec
        .declared_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    for requirement in &spec.requirements {
        for name in requirement.expr.identifiers() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    let renames: HashMap<String, String> = case_renames(&names, case);

    let mut spec = spec;
    for variable in &mut spec.internal_variables {
        if let Some(renamed) = renames.get(&variable.name) {
            variable.name = renamed.clone();
        }
    }
    for variable in &mut spec.external_variables {
        if let Some(renamed) = renames.get(&variable.name) {
            variable.name = renamed.clone();
        }
    }
    for requirement in &mut spec.requirements {
        requirement.expr = requirement.expr.substitute(&renames);
    }
    spec
}

fn run_resolve(
    input: String,
    via_scope: String,
    to_scope: String,
    db: Vec<PathBuf>,
) -> Result<(), String> {
    let database = load_variable_db(&db)?;
    match resolve_type(&database, &input, &via_scope, &to_scope) {
        Some(mapping) => {
            println!("{}", mapping.to_type);
            Ok(())
        }
        None => Err(format!(
            "variable '{}' is not routable from scope '{}' to scope '{}'",
            input, via_scope, to_scope
        )),
    }
}

fn run_output(name: String, db: Vec<PathBuf>) -> Result<(), String> {
    let database = load_variable_db(&db)?;
    match output_type(&database, &name) {
        Some(type_name) => {
            println!("{}", type_name);
            Ok(())
        }
        None => Err(format!("no declared type for output '{}'", name)),
    }
}

fn run_formats() -> Result<(), String> {
    for (name, _) in specmill::format::PRESETS {
        let descriptor = FormatDescriptor::preset(name)
            .ok_or_else(|| format!("missing preset {}", name))??;
        println!("{:<16} {:?}", name, descriptor.format);
    }
    Ok(())
}
