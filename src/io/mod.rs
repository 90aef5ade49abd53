//! Instance and solution file I/O — the "external collaborators" spec.md §1
//! scopes out of the core search engine, kept as thin, fallible adapters
//! around `model::Problem`/`model::Solution`.

pub mod instance;
pub mod solution;

pub use instance::{load_instance, Instance};
pub use solution::{format_solution, read_solution_file, write_solution_file};
