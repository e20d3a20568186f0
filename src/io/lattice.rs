use std::io::Write;

use petgraph::dot::{Config, Dot};

use crate::errors::GlocalError;
use crate::lattice::Lattice;

/// Write the lattice in DOT format. Nodes are labelled `ready_active_done` and every pair of
/// states where one can follow the other is connected.
pub fn lattice_to_dot(lattice: &Lattice, writer: &mut impl Write) -> Result<(), GlocalError> {
    let transformed = lattice.to_transitive_graph().map(
        |_, ix| {
            let state = lattice.get(*ix);
            match (state.is_initial(), state.is_final()) {
                (true, true) => format!("{} (initial, final)", state.label()),
                (true, false) => format!("{} (initial)", state.label()),
                (false, true) => format!("{} (final)", state.label()),
                (false, false) => state.label(),
            }
        },
        |_, _| String::new(),
    );

    let dot = Dot::with_config(&transformed, &[Config::EdgeNoLabel]);
    writeln!(writer, "{}", dot)?;

    Ok(())
}
