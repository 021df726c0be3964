//! Stream bindings and the print hook.
//!
//! The core never decides how text looks. A presentation layer plugs in by
//! binding its own streams (`Command::set_out`, `set_err`, `set_in`) or by
//! installing a [`Printer`] that decorates tagged messages.

use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::rc::Rc;

/// Shared output stream handle.
pub type Writer = Rc<RefCell<dyn Write>>;

/// Shared input stream handle.
pub type Reader = Rc<RefCell<dyn Read>>;

pub(crate) fn stdout() -> Writer {
    Rc::new(RefCell::new(io::stdout()))
}

pub(crate) fn stderr() -> Writer {
    Rc::new(RefCell::new(io::stderr()))
}

pub(crate) fn stdin() -> Reader {
    Rc::new(RefCell::new(io::stdin()))
}

/// Intent of a printed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
    Warning,
    Info,
    Header,
}

/// Decorates messages printed through `Command::print`.
pub trait Printer {
    fn paint(&self, tone: Tone, text: &str) -> String;
}

/// Prints text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPrinter;

impl Printer for PlainPrinter {
    fn paint(&self, _tone: Tone, text: &str) -> String {
        text.to_string()
    }
}

/// Write `text` followed by a newline and flush.
pub(crate) fn write_line(out: &Writer, text: &str) -> io::Result<()> {
    let mut out = out.borrow_mut();
    writeln!(out, "{text}")?;
    out.flush()
}
