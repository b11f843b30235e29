//! # Debug Rendering
//!
//! Indented tree dump of a hierarchy, one element per line, with debug
//! uids so that clones can be told apart from their originals.

use crate::graph::{IHGraph, Level};

const INDENT: &str = "  ";

impl IHGraph {
    /// Render the whole hierarchy as an indented tree.
    ///
    /// ```text
    /// graph SequenceExecute #100
    ///   leaf Result #105 (undefined)
    ///   graph Sequence(Define) #10a
    ///     leaf Define #10b (undefined)
    ///     type Sequence[8] #10d
    ///     edge Define -Sequence-> Add #10e
    ///   type Execute[2] #104
    ///   edge Sequence(Define) -Execute-> Result #110
    /// ```
    #[must_use]
    pub fn to_debug_string(&self) -> String {
        let top = self.top();
        let uid = top.node().map(|node| node.uid()).unwrap_or_default();
        let mut out = format!("graph {} {}\n", top.identifier(), uid);
        render_level(top, 1, &mut out);
        out
    }
}

fn render_level(level: Level<'_>, depth: usize, out: &mut String) {
    let graph = level.graph();
    let indent = INDENT.repeat(depth);

    for &id in level.nodes() {
        let Some(node) = graph.node(id) else {
            continue;
        };
        match (node.as_leaf(), graph.level(id)) {
            (Some(leaf), _) => out.push_str(&format!(
                "{}leaf {} {} ({})\n",
                indent,
                node.identifier,
                node.uid(),
                leaf.status.as_str()
            )),
            (None, Some(nested)) => {
                out.push_str(&format!("{}graph {} {}\n", indent, node.identifier, node.uid()));
                render_level(nested, depth.saturating_add(1), out);
            }
            (None, None) => {}
        }
    }

    for &id in level.edge_types() {
        if let Some(ty) = graph.edge_type(id) {
            out.push_str(&format!("{}type {} {}\n", indent, ty.key(), ty.uid()));
        }
    }

    for id in level.shallow_edges() {
        if let (Some(edge), Some(triple)) = (graph.edge(id), graph.edge_triple(id)) {
            out.push_str(&format!("{}edge {} {}\n", indent, triple, edge.uid()));
        }
    }
}
