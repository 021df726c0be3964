//! A command tree dispatcher.
//!
//! Applications declare a tree of [`Command`]s, each with flags, a
//! positional-argument contract and lifecycle callbacks. Executing the root
//! against an argument vector:
//!
//! 1. parses the root's effective flags (interspersed with positionals),
//! 2. resolves the deepest matching subcommand,
//! 3. validates the remaining positional args,
//! 4. runs `persistent_pre_run`, `pre_run`, `run`, `post_run` and
//!    `persistent_post_run` on it, stopping at the first error.
//!
//! ```no_run
//! use cmdtree::{Command, exact_args};
//!
//! let root = Command::new("app").about("An example");
//! root.persistent_flags().bool_p("verbose", 'v', false, "Verbose output");
//!
//! let greet = Command::new("greet <name>")
//!     .args(exact_args(1))
//!     .run(|cmd, args| {
//!         let verbose = cmd.flags().get_bool("verbose").unwrap_or(false);
//!         let _ = cmd.print_success(&format!("hello {} ({verbose})", args[0]));
//!     });
//! root.add_command(greet);
//!
//! if let Err(err) = root.execute() {
//!     eprintln!("{err}");
//! }
//! ```
//!
//! Presentation stays outside: bind streams with [`Command::set_out`] and
//! friends, render help with a [`HelpRenderer`] and decorate messages with a
//! [`Printer`].

mod args;
mod command;
mod error;
mod execute;
mod flags;
mod help;
mod lifecycle;
mod output;
mod resolve;

pub use args::{
    PositionalArgs, arbitrary_args, exact_args, match_all, maximum_n_args, minimum_n_args,
    no_args, only_valid_args, range_args,
};
pub use command::Command;
pub use error::{Error, FlagError, ParseError, Result, ValidationError};
pub use flags::{Flag, FlagSet, FlagValue, Kind, Typed, Value};
pub use help::{CommandEntry, FlagEntry, HelpDoc, HelpRenderer, PlainRenderer};
pub use lifecycle::{RunFn, Stage, TryRunFn};
pub use output::{PlainPrinter, Printer, Reader, Tone, Writer};
