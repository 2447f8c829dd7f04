//! Parser for the procedural cPanel/Exim filter text format.

pub mod actions;
pub mod conditions;
pub mod parser;
