//! Load a YAML file (or a built-in sample) and print it as JSON.
//!
//! Run with: cargo run --example load_yaml -- [input.yaml]

use std::error::Error;
use std::fs;

use libyamlstar::{load_one, YamlStar};
use serde::Deserialize;

const SAMPLE: &str = "\
host: localhost
port: 8080
debug: true
tags: [web, api]
";

#[derive(Debug, Deserialize)]
struct Server {
    host: String,
    port: u16,
    debug: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let source = match std::env::args().nth(1) {
        Some(path) => fs::read_to_string(path)?,
        None => SAMPLE.to_string(),
    };

    let doc = load_one(&source)?;
    println!("{}", serde_json::to_string_pretty(&doc.to_json()?)?);

    if std::env::args().nth(1).is_none() {
        let server: Server = YamlStar::new().load(&source)?;
        println!("\n{:?}", server);
        println!("listening on {}:{} (debug: {})", server.host, server.port, server.debug);
    }
    Ok(())
}
