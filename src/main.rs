use avrograph::edit::{self, EditOp};
use avrograph::ir::LayoutGraph;
use avrograph::layout::{GridLayout, LayoutEngine};
use avrograph::measure::NodeMetrics;
use avrograph::{SchemaFormat, parse_as};
use serde::Serialize;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::process;

enum Output {
    Graph,
    Layout,
    Positions,
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <input.avsc|input.avdl> [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --output <file>                 Output file (default: stdout)");
    eprintln!("  -f, --format <json|idl>             Input format (default: detect)");
    eprintln!("      --layout                        Print layout engine input");
    eprintln!("      --positions                     Print fallback grid positions");
    eprintln!("      --collapse <id>                 Collapse an entity (repeatable)");
    eprintln!("      --add-field <schema> <name> <type>");
    eprintln!("      --remove-field <schema> <name>");
    eprintln!("      --rename-field <schema> <old> <new>");
    eprintln!("  -v, --verbose                       Debug logging on stderr");
    process::exit(1);
}

/// Take `n` values following the flag at `i`, advancing `i` past them.
fn values(args: &[String], i: &mut usize, n: usize) -> Vec<String> {
    if *i + n >= args.len() {
        eprintln!("Missing value for {}", args[*i]);
        process::exit(1);
    }
    let taken = args[*i + 1..=*i + n].to_vec();
    *i += n;
    taken
}

fn pretty<T: Serialize>(value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(s) => s + "\n",
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        usage(&args[0]);
    }

    let input_path = &args[1];
    let mut output_path: Option<String> = None;
    let mut format: Option<SchemaFormat> = None;
    let mut output = Output::Graph;
    let mut collapsed: HashSet<String> = HashSet::new();
    let mut edits: Vec<EditOp> = Vec::new();
    let mut verbose = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                output_path = values(&args, &mut i, 1).pop();
            }
            "-f" | "--format" => {
                let name = &values(&args, &mut i, 1)[0];
                format = Some(SchemaFormat::from_str(name).unwrap_or_else(|| {
                    eprintln!("Invalid format: {}", name);
                    process::exit(1);
                }));
            }
            "--layout" => output = Output::Layout,
            "--positions" => output = Output::Positions,
            "--collapse" => {
                collapsed.extend(values(&args, &mut i, 1));
            }
            "--add-field" => {
                let v = values(&args, &mut i, 3);
                edits.push(EditOp::AddField {
                    schema: v[0].clone(),
                    name: v[1].clone(),
                    type_name: v[2].clone(),
                });
            }
            "--remove-field" => {
                let v = values(&args, &mut i, 2);
                edits.push(EditOp::RemoveField {
                    schema: v[0].clone(),
                    name: v[1].clone(),
                });
            }
            "--rename-field" => {
                let v = values(&args, &mut i, 3);
                edits.push(EditOp::RenameField {
                    schema: v[0].clone(),
                    old: v[1].clone(),
                    new: v[2].clone(),
                });
            }
            "-v" | "--verbose" => verbose = true,
            "-h" | "--help" => usage(&args[0]),
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_target(false)
        .init();

    let input = match fs::read_to_string(input_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", input_path, e);
            process::exit(1);
        }
    };

    let format = SchemaFormat::resolve(format, &input);

    let rendered = if edits.is_empty() {
        let result = parse_as(&input, format);
        for d in &result.graph.diagnostics {
            match d.range {
                Some(r) => eprintln!("{}:{}:{}: {:?}: {}", input_path, r.start_line, r.start_column, d.severity, d.message),
                None => eprintln!("{}: {:?}: {}", input_path, d.severity, d.message),
            }
        }
        match output {
            Output::Graph => pretty(&result),
            Output::Layout => pretty(&LayoutGraph::from_graph(&result.graph, &collapsed, &NodeMetrics::default())),
            Output::Positions => {
                let ir = LayoutGraph::from_graph(&result.graph, &collapsed, &NodeMetrics::default());
                pretty(&GridLayout::default().layout(&ir))
            }
        }
    } else {
        edits
            .iter()
            .fold(input, |text, op| edit::apply_edit(&text, format, op))
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, &rendered) {
                eprintln!("Failed to write {}: {}", path, e);
                process::exit(1);
            }
        }
        None => print!("{}", rendered),
    }
}
