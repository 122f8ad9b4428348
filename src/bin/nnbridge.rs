//! Check and lower a textual graph file.
//!
//! Prints the groups of nodes the target device supports and, unless
//! `--check-only` is given, lowers the graph and prints the backend calls.

use bumpalo::Bump;
use clap::Parser;
use nnbridge::backend::RecordingGraphBuilder;
use nnbridge::builders::create_op_builder_registry;
use nnbridge::core::{CompilationSession, DeviceType, GraphCompiler};
use nnbridge::graph::Graph;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nnbridge", about = "Lower a graph onto a WebNN-style backend")]
struct Args {
    /// Graph file to read; stdin when omitted.
    input: Option<PathBuf>,

    /// Target device.
    #[arg(short, long, env = "NNBRIDGE_DEVICE", default_value = "cpu")]
    device: DeviceType,

    /// Only report supported nodes, do not lower.
    #[arg(long)]
    check_only: bool,

    /// Print session statistics after lowering.
    #[arg(long)]
    stats: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let text = match &args.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let graph = Graph::parse(&text)?;

    let registry = create_op_builder_registry();
    let compiler = GraphCompiler::new(&registry, args.device);

    let groups = compiler.supported_nodes(&graph);
    let supported: usize = groups.iter().map(Vec::len).sum();
    println!(
        "{}/{} nodes supported on {}",
        supported,
        graph.nodes.len(),
        compiler.device_type()
    );
    for group in &groups {
        let names: Vec<&str> = group.iter().map(|&i| graph.nodes[i].display_name()).collect();
        println!("  group [{}]", names.join(", "));
    }

    if args.check_only {
        return Ok(());
    }

    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let mut backend = RecordingGraphBuilder::new();
    let result = compiler.compile(&graph, &session, &mut backend);

    for op in backend.ops() {
        println!("{op}");
    }
    if args.stats {
        print!("{}", session.stats());
    }

    match result {
        Ok(compiled) => {
            for (name, handle) in &compiled.outputs {
                println!("output {name} = {handle}");
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
