// src/table/mod.rs
// =============================================================================
// The tabular side of the program: where the post URLs come from and where
// the results go. Everything here is plain file I/O around the resolver.
// =============================================================================

mod io;

pub use io::{default_output_path, read_table_file, write_results_file};
