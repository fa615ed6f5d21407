#![forbid(unsafe_code)]

//! Standard node types shared by tests.

use crate::memory_engine::{MemoryEngine, NodeType};

/// A rigid body: ranged mass, vector offset, visibility and a label.
#[must_use]
pub fn body_type() -> NodeType {
    NodeType::new("Body")
        .with_ranged_param("mass", 1.0, 0.0, 1000.0)
        .with_param("offset", [0.0, 0.0, 0.0])
        .with_param("visible", true)
        .with_param("label", "")
        .with_input("in")
        .with_output("out")
}

#[must_use]
pub fn force_type() -> NodeType {
    NodeType::new("Force")
        .with_ranged_param("strength", 0.0, -100.0, 100.0)
        .with_ranged_param("direction", [0.0, 0.0, 1.0], -1.0, 1.0)
        .with_input("in")
        .with_output("out")
}

#[must_use]
pub fn solver_type() -> NodeType {
    NodeType::new("Solver")
        .with_param("substeps", 1i64)
        .with_input("bodies")
        .with_input("forces")
        .with_output("out")
}

/// Engine with `Body`, `Force` and `Solver` registered and an empty graph.
#[must_use]
pub fn standard_engine() -> MemoryEngine {
    MemoryEngine::new()
        .with_type(body_type())
        .with_type(force_type())
        .with_type(solver_type())
}
