//! The three-level tree-walking evaluator (§2 C5-C8): values, conditions,
//! operations, and statements, each a thin module of free functions over
//! `&Interpreter` — every piece of mutable state they touch (relations,
//! symbol/record tables, counters, profile buffers) is interior-mutable, so
//! no evaluator needs `&mut Interpreter` and the same reference can be
//! shared across `Parallel` children.

pub mod condition;
pub mod operation;
pub mod statement;
pub mod value;
