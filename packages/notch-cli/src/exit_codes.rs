//! Process exit codes shared by all subcommands.

pub const SUCCESS: i32 = 0;
/// Bad configuration, missing input file, or invalid parameters.
pub const INPUT_ERROR: i32 = 2;
/// The run itself failed (I/O, filtering, serialization).
pub const EXECUTION_ERROR: i32 = 3;
/// A batch finished but some files failed.
pub const PARTIAL_FAILURE: i32 = 4;
