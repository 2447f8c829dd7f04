//! Migrate cPanel/Exim mailbox filters to SIEVE.
//!
//! Both cPanel filter formats are read into one rule model
//! ([`model::rule::FilterSet`]), compiled to one SIEVE script per filter
//! entry, then merged into a single script per mailbox:
//!
//! ```
//! let set = exim2sieve::parse_filter_text(
//!     "#Nixpal\nif $header_from: contains \"foo\"\nthen\nsave \"Nixpal\"\nfinish\nendif\n",
//! );
//! let scripts = exim2sieve::convert_filters(&set);
//! let combined = exim2sieve::combine_scripts("chris", &scripts);
//! assert!(combined.content.starts_with("require [\"fileinto\"];"));
//! assert!(combined.content.contains("fileinto \"Nixpal\";"));
//! ```

pub mod config;
pub mod error;
pub mod exim;
pub mod model;
pub mod sieve;
pub mod store;

pub use error::{Error, Result};
pub use exim::parser::parse_filter_text;
pub use model::rule::{Action, FilterEntry, FilterSet, Rule};
pub use model::script::SieveScript;
pub use sieve::check::{check, CheckReport};
pub use sieve::combiner::combine_scripts;
pub use sieve::generator::convert_filters;
