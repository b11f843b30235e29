//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use ihgraph_core::{
    GraphMetrics, GraphRecord, IHGraph, IHGraphError, MAX_FACTORY_INPUT_SIZE, graph_from_json,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// =============================================================================
// FILE HELPERS
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), IHGraphError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| IHGraphError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(IHGraphError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path to a canonical regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, IHGraphError> {
    let canonical = path.canonicalize().map_err(|e| {
        IHGraphError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(IHGraphError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path whose parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, IHGraphError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        IHGraphError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(IHGraphError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| IHGraphError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Read and build a graph from a factory JSON file.
pub fn load_graph(path: &Path) -> Result<IHGraph, IHGraphError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_FACTORY_INPUT_SIZE as u64)?;

    let text = std::fs::read_to_string(&validated)
        .map_err(|e| IHGraphError::IoError(format!("Read file: {}", e)))?;
    let graph = graph_from_json(&text)?;
    info!(
        file = %validated.display(),
        nodes = graph.top().nodes().len(),
        edge_types = graph.top().edge_types().len(),
        "loaded graph"
    );
    Ok(graph)
}

/// Write `text` to `output`, or print it when no output is given.
fn emit(text: &str, output: Option<&Path>) -> Result<(), IHGraphError> {
    match output {
        Some(path) => {
            let validated = validate_output_path(path)?;
            std::fs::write(&validated, text)
                .map_err(|e| IHGraphError::IoError(format!("Write file: {}", e)))?;
            info!(file = %validated.display(), bytes = text.len(), "wrote output");
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), IHGraphError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Identifiers and types of one clique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliqueSummary {
    pub nodes: Vec<String>,
    pub edge_types: Vec<String>,
    pub edge_count: usize,
}

impl CliqueSummary {
    #[must_use]
    pub fn from_clique(clique: &IHGraph) -> Self {
        let top = clique.top();
        Self {
            nodes: top.node_identifiers().into_iter().map(str::to_string).collect(),
            edge_types: top
                .edge_types()
                .iter()
                .filter_map(|&id| clique.edge_type(id))
                .map(|ty| ty.key().to_string())
                .collect(),
            edge_count: top.shallow_edges().len(),
        }
    }
}

// =============================================================================
// INSPECT COMMAND
// =============================================================================

/// Show metrics of a factory graph.
pub fn cmd_inspect(file: &Path, json_mode: bool, tree: bool) -> Result<(), IHGraphError> {
    let graph = load_graph(file)?;
    let metrics = GraphMetrics::from_graph(&graph);

    if json_mode {
        let output = serde_json::json!({
            "identifier": graph.identifier(),
            "nodes": graph.top().node_identifiers(),
            "edgeTypes": graph.top().edge_type_identifiers(),
            "rootNodes": names(&graph, &graph.top().root_nodes()),
            "sinkNodes": names(&graph, &graph.top().sink_nodes()),
            "metrics": metrics,
        });
        return print_json(&output);
    }

    println!("IHGraph Status");
    println!("==============");
    println!("File: {}", file.display());
    println!();
    println!("{}", metrics);
    println!();
    println!("Roots: {}", names(&graph, &graph.top().root_nodes()).join(", "));
    println!("Sinks: {}", names(&graph, &graph.top().sink_nodes()).join(", "));
    if tree {
        println!();
        print!("{}", graph.to_debug_string());
    }
    Ok(())
}

fn names(graph: &IHGraph, nodes: &[ihgraph_core::NodeId]) -> Vec<String> {
    nodes
        .iter()
        .filter_map(|&id| graph.node(id))
        .map(|node| node.identifier.clone())
        .collect()
}

// =============================================================================
// CLIQUES COMMAND
// =============================================================================

/// Cliques of a graph: every immediate clique, or the next clique by
/// priority. A graph without edges has no next clique.
pub fn collect_cliques(graph: &IHGraph, immediate: bool) -> Result<Vec<CliqueSummary>, IHGraphError> {
    let cliques = if immediate {
        graph.immediate_cliques()?
    } else {
        match graph.next_clique() {
            Ok(clique) => vec![clique],
            Err(IHGraphError::NoEdges) => Vec::new(),
            Err(e) => return Err(e),
        }
    };
    Ok(cliques.iter().map(CliqueSummary::from_clique).collect())
}

/// Show the next clique or every immediate clique.
pub fn cmd_cliques(file: &Path, json_mode: bool, immediate: bool) -> Result<(), IHGraphError> {
    let graph = load_graph(file)?;
    let summaries = collect_cliques(&graph, immediate)?;

    if json_mode {
        return print_json(&summaries);
    }

    if summaries.is_empty() {
        println!("No cliques.");
        return Ok(());
    }
    for (i, summary) in summaries.iter().enumerate() {
        println!(
            "Clique {}: [{}] via {} ({} edges)",
            i + 1,
            summary.nodes.join(", "),
            summary.edge_types.join(", "),
            summary.edge_count
        );
    }
    Ok(())
}

// =============================================================================
// INDUCE COMMAND
// =============================================================================

/// Build the induced hierarchy and print its tree.
pub fn cmd_induce(
    file: &Path,
    json_mode: bool,
    max_iterations: usize,
    output: Option<&Path>,
) -> Result<(), IHGraphError> {
    let graph = load_graph(file)?;
    let induced = graph.induce_with_limit(max_iterations)?;
    let metrics = GraphMetrics::from_graph(&induced);
    debug!(depth = metrics.max_depth, "induction finished");

    if json_mode {
        let output = serde_json::json!({
            "nodes": induced.top().node_identifiers(),
            "edgeTypes": induced.top().edge_type_identifiers(),
            "metrics": metrics,
        });
        return print_json(&output);
    }

    emit(&induced.to_debug_string(), output)
}

// =============================================================================
// FLATTEN CHECK COMMAND
// =============================================================================

/// Induce, flatten and compare with the input.
///
/// Fails with `InvalidOperation` when the structures differ.
pub fn cmd_flatten_check(
    file: &Path,
    json_mode: bool,
    max_iterations: usize,
) -> Result<(), IHGraphError> {
    let graph = load_graph(file)?;
    let flat = graph.induce_with_limit(max_iterations)?.flatten()?;
    let differences = flat.structural_differences(&graph);

    if json_mode {
        let output = serde_json::json!({
            "equal": differences.is_empty(),
            "differences": differences,
        });
        print_json(&output)?;
    } else if differences.is_empty() {
        println!("Flattened hierarchy matches the input.");
    } else {
        println!("Flattened hierarchy differs from the input:");
        for difference in &differences {
            println!("  {}", difference);
        }
    }

    if differences.is_empty() {
        Ok(())
    } else {
        Err(IHGraphError::InvalidOperation(format!(
            "{} structural differences after flattening",
            differences.len()
        )))
    }
}

// =============================================================================
// ROUNDTRIP COMMAND
// =============================================================================

/// Render the factory JSON of `graph`.
pub fn export_json(
    graph: &IHGraph,
    include_annotations: bool,
    pretty: bool,
) -> Result<String, IHGraphError> {
    let record = GraphRecord::from_graph(graph, include_annotations);
    let mut text = if pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    text.push('\n');
    Ok(text)
}

/// Load a factory graph and export it again.
pub fn cmd_roundtrip(
    file: &Path,
    include_annotations: bool,
    pretty: bool,
    output: Option<&Path>,
) -> Result<(), IHGraphError> {
    let graph = load_graph(file)?;
    emit(&export_json(&graph, include_annotations, pretty)?, output)
}
