//! Operator commands for tgfeed.
//!
//! The operator chat manages the watched feed set with `/add <url>` (or a
//! bare URL), `/remove <url>` and `/list`.

pub mod parser;
pub mod processor;

pub use parser::{
    format_feed_list, parse_command, Command, ADD_COMMAND, LIST_COMMAND, REMOVE_COMMAND,
};
pub use processor::{CommandProcessor, DrainReport};
