//! YAMLStar command-line tool for loading YAML and writing JSON, CBOR or TOML.
//!
//! Usage: yamlstar [OPTIONS] [FILE]
//!
//! Options:
//!   -a, --all              Load every document into an array
//!   -t, --to <FORMAT>      Output format (json, compact, cbor, diag, toml)
//!   -o, --output <FILE>    Write output to the specified file
//!   --check                Check if input is valid (exit 0 if valid, 1 if invalid)
//!   --envelope             Print the {"data"}/{"error"} envelope
//!   -h, --help             Print help
//!   -V, --version          Print version

use std::fs;
use std::io::{self, Read, Write};
use std::process;

use libyamlstar::{Config, LoadError, Response, YamlStar, DEBUG_ENV};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod transcode;

use transcode::Format;

struct Options {
    all: bool,
    to: Format,
    output: Option<String>,
    check: bool,
    envelope: bool,
    input: Option<String>,
}

fn main() {
    let config = Config::from_env();
    if config.debug {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_args(&args);
    debug!(
        input = options.input.as_deref().unwrap_or("-"),
        to = ?options.to,
        all = options.all,
        "starting"
    );

    let source = read_input(options.input.as_deref());
    let ys = YamlStar::with_config(config);
    process::exit(run(&ys, &options, &source));
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn parse_args(args: &[String]) -> Options {
    let mut options = Options {
        all: false,
        to: Format::Json,
        output: None,
        check: false,
        envelope: false,
        input: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                process::exit(0);
            }
            "-V" | "--version" => {
                println!("yamlstar {}", libyamlstar::VERSION);
                process::exit(0);
            }
            "-a" | "--all" => options.all = true,
            "-t" | "--to" => {
                i += 1;
                let Some(name) = args.get(i) else {
                    fail("-t requires a format argument");
                };
                options.to = match Format::from_name(name) {
                    Some(format) => format,
                    None => fail(&format!("Unknown format: {}", name)),
                };
            }
            "-o" | "--output" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    fail("--output requires an argument");
                };
                options.output = Some(path.clone());
            }
            "--check" => options.check = true,
            "--envelope" => options.envelope = true,
            // Explicit stdin
            "-" => {}
            arg if arg.starts_with('-') => fail(&format!("Unknown option: {}", arg)),
            path => {
                if options.input.is_some() {
                    fail("Multiple input paths not supported");
                }
                options.input = Some(path.to_string());
            }
        }
        i += 1;
    }

    if options.check && options.envelope {
        fail("--check and --envelope are mutually exclusive");
    }
    if options.envelope && options.to != Format::Json {
        fail("--envelope always writes JSON");
    }
    options
}

fn read_input(path: Option<&str>) -> String {
    match path {
        Some(path) => fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Error reading {}: {}", path, e);
            process::exit(1);
        }),
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                eprintln!("Error reading stdin: {}", e);
                process::exit(1);
            }
            buffer
        }
    }
}

fn run(ys: &YamlStar, options: &Options, source: &str) -> i32 {
    let name = options.input.as_deref().unwrap_or("<stdin>");

    if options.envelope {
        let text = if options.all {
            ys.load_all_json(source)
        } else {
            ys.load_json(source)
        };
        write_output(format!("{}\n", text).as_bytes(), options.output.as_deref());
        return match Response::from_json(&text) {
            Ok(Response::Data(_)) => 0,
            _ => 1,
        };
    }

    let loaded = if options.all {
        ys.load_all::<Value>(source).map(Value::Array)
    } else {
        ys.load::<Value>(source)
    };
    let value = match loaded {
        Ok(value) => value,
        Err(e) => {
            report(name, &e);
            return 1;
        }
    };

    if options.check {
        println!("{}: ok", name);
        return 0;
    }

    match render(&value, options.to) {
        Ok(bytes) => {
            write_output(&bytes, options.output.as_deref());
            0
        }
        Err(e) => {
            eprintln!("Error: Cannot convert to {:?}: {}", options.to, e);
            1
        }
    }
}

/// Print a `file:line:column: message` diagnostic.
fn report(name: &str, err: &LoadError) {
    match err.position() {
        Some(p) => eprintln!("{}:{}:{}: {}", name, p.line, p.column, err.message()),
        None => eprintln!("{}: {}", name, err.message()),
    }
}

fn render(value: &Value, format: Format) -> Result<Vec<u8>, String> {
    let text = match format {
        Format::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string())?,
        Format::Compact => serde_json::to_string(value).map_err(|e| e.to_string())?,
        Format::Cbor => return Ok(transcode::cbor::encode(value)),
        Format::Diag => transcode::cbor::diagnostic(&transcode::cbor::encode(value))?,
        Format::Toml => transcode::toml::encode(value)?,
    };
    let mut bytes = text.into_bytes();
    if !format.is_binary() && bytes.last() != Some(&b'\n') {
        bytes.push(b'\n');
    }
    Ok(bytes)
}

fn write_output(output: &[u8], path: Option<&str>) {
    if let Some(path) = path {
        if let Err(e) = fs::write(path, output) {
            eprintln!("Error writing {}: {}", path, e);
            process::exit(1);
        }
        return;
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = handle.write_all(output).and_then(|_| handle.flush()) {
        eprintln!("Error writing to stdout: {}", e);
        process::exit(1);
    }
}

fn print_help() {
    println!(
        "yamlstar - load YAML and write JSON, CBOR or TOML

USAGE:
    yamlstar [OPTIONS] [FILE]

ARGS:
    [FILE]    Input file (reads from stdin if not provided or '-')

OPTIONS:
    -a, --all              Load every document of the stream into an array.
                           Without it the stream must hold exactly one document.

    -t, --to <FORMAT>      Output format [default: json]
                           Supported: json, compact, cbor, diag, toml

    -o, --output <FILE>    Write output to the specified file

    --check                Check if input is valid (exit 0 if valid, 1 if invalid)

    --envelope             Print the {{\"data\": ...}} or {{\"error\": ...}} envelope
                           instead of failing with a diagnostic

    -h, --help             Print help

    -V, --version          Print version

ENVIRONMENT:
    {}         Set to enable debug logging on stderr

EXAMPLES:
    # Convert a YAML file to JSON
    yamlstar config.yaml

    # Convert a multi-document stream to a JSON array
    yamlstar -a -t compact stream.yaml

    # Validate a file
    yamlstar --check config.yaml

    # Convert YAML to TOML
    yamlstar -t toml config.yaml -o config.toml

    # View the CBOR encoding in diagnostic notation (RFC 8949 §8)
    yamlstar -t diag config.yaml",
        DEBUG_ENV
    );
}
