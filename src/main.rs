use std::path::PathBuf;

use clap::Parser;
use tf_graph_import::{ImportError, ImportOptions, Importer, load_graph_from_path, net_to_dot};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Import TensorFlow-style graphs into a layer net",
    long_about = None
)]
struct Cli {
    /// Path to a JSON file describing a pre-decoded GraphDef.
    graph: PathBuf,
    /// Optional override for the constant tensor byte length limit.
    #[arg(long)]
    tensor_limit: Option<usize>,
    /// Skip the node ordering check before translating.
    #[arg(long)]
    no_verify_order: bool,
    /// Optional path to write a Graphviz DOT export of the imported net.
    #[arg(long)]
    export_dot: Option<PathBuf>,
}

fn run() -> Result<(), ImportError> {
    let cli = Cli::parse();
    let graph = load_graph_from_path(&cli.graph)?;
    let mut options = ImportOptions::default();
    if let Some(limit) = cli.tensor_limit {
        options.tensor_byte_length_limit = limit;
    }
    options.verify_order = !cli.no_verify_order;

    let (net, artifacts) = Importer::new(&graph, options).import_with_artifacts()?;

    println!(
        "Imported graph from `{}`: {} nodes -> {} layers, {} edges.",
        cli.graph.display(),
        graph.node.len(),
        net.layers().len(),
        net.edges().len()
    );
    println!("Inputs:");
    for name in net.inputs() {
        println!("  - {}", name);
    }
    println!("Layers:");
    for layer in net.layers() {
        let blobs: Vec<_> = layer.params.blobs.iter().map(|b| &b.shape).collect();
        println!("  - #{} {} ({}) blobs {:?}", layer.id, layer.name, layer.kind, blobs);
        for edge in net.inputs_of(layer.id) {
            println!("      in{} <- #{}:{}", edge.dst_port, edge.src, edge.src_port);
        }
    }

    if let Some(artifacts) = artifacts {
        println!("Dependency fan-out:");
        let mut producers: Vec<_> = artifacts.node_to_consumers.iter().collect();
        producers.sort();
        for (producer, consumers) in producers {
            println!("  - {} -> {}", producer, consumers.join(", "));
        }
    }

    if let Some(dot_path) = cli.export_dot {
        let dot = net_to_dot(&net);
        std::fs::write(&dot_path, dot)
            .map_err(|err| ImportError::export(dot_path.clone(), err))?;
        println!("Exported Graphviz DOT to `{}`.", dot_path.display());
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
