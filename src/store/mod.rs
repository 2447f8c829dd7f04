pub mod filter_io;
pub mod script_io;
