//! Help and usage output.
//!
//! The core builds a [`HelpDoc`] describing a command; a [`HelpRenderer`]
//! turns it into text. [`PlainRenderer`] is the built-in, undecorated one.

use std::io;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::flags::{Flag, Kind, Value};
use crate::output::{self, Tone};

/// Structured help for one command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HelpDoc {
    pub name: String,
    pub command_path: String,
    pub use_line: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inherited_flags: Vec<FlagEntry>,
}

/// A visible subcommand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
}

/// A visible flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FlagEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shorthand: Option<char>,
    /// Type hint; `None` for boolean flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub usage: String,
    /// Shown default; `None` when empty or a `false` boolean.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl FlagEntry {
    fn from_flag(flag: &Flag) -> Self {
        let value_type = match flag.kind() {
            Kind::Bool => None,
            kind => Some(kind.as_str().to_string()),
        };
        let default_value = match flag.default_value() {
            Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::StringList(items) if items.is_empty() => None,
            other => Some(other.to_string()),
        };
        Self {
            name: flag.name().to_string(),
            shorthand: flag.shorthand(),
            value_type,
            usage: flag.usage().to_string(),
            default_value,
        }
    }
}

/// Turns a help document into text.
pub trait HelpRenderer {
    fn render(&self, doc: &HelpDoc) -> String;
}

impl<F> HelpRenderer for F
where
    F: Fn(&HelpDoc) -> String,
{
    fn render(&self, doc: &HelpDoc) -> String {
        self(doc)
    }
}

/// Undecorated, column-aligned text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl HelpRenderer for PlainRenderer {
    fn render(&self, doc: &HelpDoc) -> String {
        let mut out = String::new();
        out.push_str("Usage:\n");
        out.push_str(&format!("  {}\n", doc.use_line.trim()));

        if !doc.description.trim().is_empty() {
            out.push('\n');
            out.push_str(doc.description.trim_end());
            out.push('\n');
        }

        if !doc.examples.is_empty() {
            out.push_str("\nExamples:\n");
            for ex in &doc.examples {
                out.push_str(&format!("  {ex}\n"));
            }
        }

        if !doc.commands.is_empty() {
            out.push_str("\nAvailable Commands:\n");
            let rows: Vec<(String, String)> = doc
                .commands
                .iter()
                .map(|c| (c.name.clone(), c.summary.clone()))
                .collect();
            push_rows(&mut out, &rows);
        }

        if !doc.flags.is_empty() {
            out.push_str("\nFlags:\n");
            push_rows(&mut out, &flag_rows(&doc.flags));
        }

        if !doc.inherited_flags.is_empty() {
            out.push_str("\nGlobal Flags:\n");
            push_rows(&mut out, &flag_rows(&doc.inherited_flags));
        }

        if !doc.commands.is_empty() {
            out.push_str(&format!(
                "\nUse \"{} [command] --help\" for more information about a command.\n",
                doc.command_path
            ));
        }

        out
    }
}

fn flag_rows(flags: &[FlagEntry]) -> Vec<(String, String)> {
    flags
        .iter()
        .map(|f| (format_flag_left(f), format_flag_help(f)))
        .collect()
}

fn format_flag_left(flag: &FlagEntry) -> String {
    let mut out = match flag.shorthand {
        Some(c) => format!("-{c}, --{}", flag.name),
        None => format!("    --{}", flag.name),
    };
    if let Some(value_type) = &flag.value_type {
        out.push_str(&format!(" <{value_type}>"));
    }
    out
}

fn format_flag_help(flag: &FlagEntry) -> String {
    let mut out = flag.usage.trim().to_string();
    if let Some(default_value) = &flag.default_value {
        if out.is_empty() {
            out.push_str(&format!("(default: {default_value})"));
        } else {
            out.push_str(&format!(" (default: {default_value})"));
        }
    }
    out
}

fn push_rows(out: &mut String, rows: &[(String, String)]) {
    let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("  {left}\n"));
        } else {
            out.push_str(&format!("  {left:width$}  {help}\n"));
        }
    }
}

impl Command {
    /// Build the help document for this command.
    pub fn usage_doc(&self) -> HelpDoc {
        let inherited = self.inherited_flags();
        let (inherited_flags, flags): (Vec<Rc<Flag>>, Vec<Rc<Flag>>) = self
            .flags()
            .iter()
            .into_iter()
            .filter(|f| !f.is_hidden())
            .partition(|f| inherited.iter().any(|i| Rc::ptr_eq(i, f)));

        let long = self.get_long_about();
        let description = if long.trim().is_empty() {
            self.get_about()
        } else {
            long
        };

        HelpDoc {
            name: self.name(),
            command_path: self.command_path(),
            use_line: self.use_line(),
            description,
            examples: self
                .get_example()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            commands: self
                .commands()
                .iter()
                .filter(|c| !c.is_hidden())
                .map(|c| CommandEntry {
                    name: c.name(),
                    aliases: c.get_aliases(),
                    summary: c.get_about(),
                })
                .collect(),
            flags: flags.iter().map(|f| FlagEntry::from_flag(f)).collect(),
            inherited_flags: inherited_flags
                .iter()
                .map(|f| FlagEntry::from_flag(f))
                .collect(),
        }
    }

    /// Help text as produced by the installed renderer.
    pub fn usage_string(&self) -> String {
        self.help_renderer().render(&self.usage_doc())
    }

    /// Write the usage text to the output stream.
    pub fn usage(&self) -> io::Result<()> {
        output::write_line(&self.out_or_stdout(), &self.usage_string())
    }

    /// Write the help text to the output stream.
    pub fn help(&self) -> io::Result<()> {
        self.usage()
    }

    /// Print `text` through the installed printer.
    ///
    /// [`Tone::Error`] goes to the error stream, everything else to the
    /// output stream.
    pub fn print(&self, tone: Tone, text: &str) -> io::Result<()> {
        let line = self.printer().paint(tone, text);
        let stream = match tone {
            Tone::Error => self.err_or_stderr(),
            _ => self.out_or_stdout(),
        };
        output::write_line(&stream, &line)
    }

    pub fn print_success(&self, text: &str) -> io::Result<()> {
        self.print(Tone::Success, text)
    }

    pub fn print_error(&self, text: &str) -> io::Result<()> {
        self.print(Tone::Error, text)
    }

    pub fn print_warning(&self, text: &str) -> io::Result<()> {
        self.print(Tone::Warning, text)
    }

    pub fn print_info(&self, text: &str) -> io::Result<()> {
        self.print(Tone::Info, text)
    }

    pub fn print_header(&self, text: &str) -> io::Result<()> {
        self.print(Tone::Header, text)
    }
}
