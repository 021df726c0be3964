//! The command tree.
//!
//! A [`Command`] is a cheap handle to a shared node. Children are owned top
//! down; the parent link is weak and only used for navigation (stream,
//! context and persistent flag/callback inheritance).

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::args::PositionalArgs;
use crate::error::ParseError;
use crate::flags::{Flag, FlagSet};
use crate::help::{HelpRenderer, PlainRenderer};
use crate::lifecycle::{Hook, Hooks, RunFn, Stage, TryRunFn};
use crate::output::{self, PlainPrinter, Printer, Reader, Writer};

#[derive(Default)]
struct Node {
    usage: String,
    aliases: Vec<String>,
    about: String,
    long_about: String,
    example: String,
    version: String,

    hidden: bool,
    silence_errors: bool,
    silence_usage: bool,
    disable_flag_parsing: bool,

    args: Option<PositionalArgs>,
    valid_args: Vec<String>,
    hooks: Hooks,

    children: Vec<Command>,
    parent: Weak<RefCell<Node>>,

    // Effective set; flags registered on it directly are local to this node.
    flags: FlagSet,
    local_flags: FlagSet,
    persistent_flags: FlagSet,

    out: Option<Writer>,
    err: Option<Writer>,
    input: Option<Reader>,
    context: Option<Rc<dyn Any>>,
    help_renderer: Option<Rc<dyn HelpRenderer>>,
    printer: Option<Rc<dyn Printer>>,
}

/// A node in the command tree.
#[derive(Clone)]
pub struct Command {
    node: Rc<RefCell<Node>>,
}

impl Command {
    /// Create a command from its one-line usage, e.g. `"greet <name>"`.
    ///
    /// The first word is the command name.
    pub fn new(usage: impl Into<String>) -> Self {
        let usage = usage.into();
        let name = first_word(&usage).to_string();
        Self {
            node: Rc::new(RefCell::new(Node {
                usage,
                flags: FlagSet::new(name.clone()),
                local_flags: FlagSet::new(name.clone()),
                persistent_flags: FlagSet::new(name),
                ..Default::default()
            })),
        }
    }

    pub fn alias(self, alias: impl Into<String>) -> Self {
        self.node.borrow_mut().aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.node
            .borrow_mut()
            .aliases
            .extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Short description shown in command listings.
    pub fn about(self, about: impl Into<String>) -> Self {
        self.node.borrow_mut().about = about.into();
        self
    }

    /// Long description shown in this command's help.
    pub fn long_about(self, long_about: impl Into<String>) -> Self {
        self.node.borrow_mut().long_about = long_about.into();
        self
    }

    pub fn example(self, example: impl Into<String>) -> Self {
        self.node.borrow_mut().example = example.into();
        self
    }

    /// Setting a version enables the `-V/--version` flag.
    pub fn version(self, version: impl Into<String>) -> Self {
        self.node.borrow_mut().version = version.into();
        self
    }

    /// Hidden commands are left out of listings but can still be invoked.
    pub fn hidden(self, hidden: bool) -> Self {
        self.node.borrow_mut().hidden = hidden;
        self
    }

    pub fn silence_errors(self, silence: bool) -> Self {
        self.node.borrow_mut().silence_errors = silence;
        self
    }

    pub fn silence_usage(self, silence: bool) -> Self {
        self.node.borrow_mut().silence_usage = silence;
        self
    }

    /// Pass flags through to the callbacks as positional args.
    pub fn disable_flag_parsing(self, disable: bool) -> Self {
        self.node.borrow_mut().disable_flag_parsing = disable;
        self
    }

    /// Positional-argument contract.
    pub fn args(self, validator: PositionalArgs) -> Self {
        self.node.borrow_mut().args = Some(validator);
        self
    }

    /// Accepted positional values, checked by `only_valid_args`.
    pub fn valid_args<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.node.borrow_mut().valid_args = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn persistent_pre_run<F>(self, f: F) -> Self
    where
        F: Fn(&Command, &[String]) + 'static,
    {
        self.with_plain(Stage::PersistentPreRun, Rc::new(f))
    }

    pub fn try_persistent_pre_run<F>(self, f: F) -> Self
    where
        F: Fn(&Command, &[String]) -> anyhow::Result<()> + 'static,
    {
        self.with_fallible(Stage::PersistentPreRun, Rc::new(f))
    }

    pub fn pre_run<F>(self, f: F) -> Self
    where
        F: Fn(&Command, &[String]) + 'static,
    {
        self.with_plain(Stage::PreRun, Rc::new(f))
    }

    pub fn try_pre_run<F>(self, f: F) -> Self
    where
        F: Fn(&Command, &[String]) -> anyhow::Result<()> + 'static,
    {
        self.with_fallible(Stage::PreRun, Rc::new(f))
    }

    pub fn run<F>(self, f: F) -> Self
    where
        F: Fn(&Command, &[String]) + 'static,
    {
        self.with_plain(Stage::Run, Rc::new(f))
    }

    pub fn try_run<F>(self, f: F) -> Self
    where
        F: Fn(&Command, &[String]) -> anyhow::Result<()> + 'static,
    {
        self.with_fallible(Stage::Run, Rc::new(f))
    }

    pub fn post_run<F>(self, f: F) -> Self
    where
        F: Fn(&Command, &[String]) + 'static,
    {
        self.with_plain(Stage::PostRun, Rc::new(f))
    }

    pub fn try_post_run<F>(self, f: F) -> Self
    where
        F: Fn(&Command, &[String]) -> anyhow::Result<()> + 'static,
    {
        self.with_fallible(Stage::PostRun, Rc::new(f))
    }

    pub fn persistent_post_run<F>(self, f: F) -> Self
    where
        F: Fn(&Command, &[String]) + 'static,
    {
        self.with_plain(Stage::PersistentPostRun, Rc::new(f))
    }

    pub fn try_persistent_post_run<F>(self, f: F) -> Self
    where
        F: Fn(&Command, &[String]) -> anyhow::Result<()> + 'static,
    {
        self.with_fallible(Stage::PersistentPostRun, Rc::new(f))
    }

    fn with_plain(self, stage: Stage, f: RunFn) -> Self {
        self.node.borrow_mut().hooks.get_mut(stage).plain = Some(f);
        self
    }

    fn with_fallible(self, stage: Stage, f: TryRunFn) -> Self {
        self.node.borrow_mut().hooks.get_mut(stage).fallible = Some(f);
        self
    }

    /// Primary name: the usage line up to the first whitespace.
    pub fn name(&self) -> String {
        first_word(&self.node.borrow().usage).to_string()
    }

    pub fn get_usage(&self) -> String {
        self.node.borrow().usage.clone()
    }

    pub fn get_aliases(&self) -> Vec<String> {
        self.node.borrow().aliases.clone()
    }

    pub fn has_alias(&self, candidate: &str) -> bool {
        self.node.borrow().aliases.iter().any(|a| a == candidate)
    }

    pub fn get_about(&self) -> String {
        self.node.borrow().about.clone()
    }

    pub fn get_long_about(&self) -> String {
        self.node.borrow().long_about.clone()
    }

    pub fn get_example(&self) -> String {
        self.node.borrow().example.clone()
    }

    pub fn get_version(&self) -> String {
        self.node.borrow().version.clone()
    }

    pub fn get_valid_args(&self) -> Vec<String> {
        self.node.borrow().valid_args.clone()
    }

    pub fn is_hidden(&self) -> bool {
        self.node.borrow().hidden
    }

    pub fn silences_errors(&self) -> bool {
        self.node.borrow().silence_errors
    }

    pub fn silences_usage(&self) -> bool {
        self.node.borrow().silence_usage
    }

    pub fn is_flag_parsing_disabled(&self) -> bool {
        self.node.borrow().disable_flag_parsing
    }

    pub fn validator(&self) -> Option<PositionalArgs> {
        self.node.borrow().args.clone()
    }

    /// Attach `cmd` as the last child.
    ///
    /// A command that already has a parent is detached from it first.
    ///
    /// # Panics
    ///
    /// Panics if `cmd` is this command or one of its ancestors.
    pub fn add_command(&self, cmd: Command) {
        if cmd == *self {
            panic!("command can't be a child of itself");
        }
        if self.ancestors().any(|ancestor| ancestor == cmd) {
            panic!("command can't be a child of its own descendant");
        }
        if let Some(previous) = cmd.parent() {
            previous.remove_command(&cmd);
        }
        cmd.node.borrow_mut().parent = Rc::downgrade(&self.node);
        self.node.borrow_mut().children.push(cmd);
    }

    pub fn add_commands<I>(&self, cmds: I)
    where
        I: IntoIterator<Item = Command>,
    {
        for cmd in cmds {
            self.add_command(cmd);
        }
    }

    /// Detach `cmd` (matched by identity) and clear its parent link.
    pub fn remove_command(&self, cmd: &Command) {
        self.remove_commands(std::slice::from_ref(cmd));
    }

    pub fn remove_commands(&self, cmds: &[Command]) {
        self.node.borrow_mut().children.retain(|child| {
            if cmds.contains(child) {
                child.node.borrow_mut().parent = Weak::new();
                false
            } else {
                true
            }
        });
    }

    /// Children in registration order.
    pub fn commands(&self) -> Vec<Command> {
        self.node.borrow().children.clone()
    }

    pub fn has_sub_commands(&self) -> bool {
        !self.node.borrow().children.is_empty()
    }

    pub fn parent(&self) -> Option<Command> {
        self.node
            .borrow()
            .parent
            .upgrade()
            .map(|node| Command { node })
    }

    pub fn has_parent(&self) -> bool {
        self.parent().is_some()
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = Command> {
        std::iter::successors(self.parent(), Command::parent)
    }

    pub fn root(&self) -> Command {
        self.ancestors().last().unwrap_or_else(|| self.clone())
    }

    /// Names from the root down to this command, space separated.
    pub fn command_path(&self) -> String {
        let mut names: Vec<String> = self.ancestors().map(|c| c.name()).collect();
        names.reverse();
        names.push(self.name());
        names.join(" ")
    }

    /// Full usage line: the parent's command path followed by this usage.
    pub fn use_line(&self) -> String {
        match self.parent() {
            Some(parent) => format!("{} {}", parent.command_path(), self.get_usage()),
            None => self.get_usage(),
        }
    }

    /// Effective flags: own local and persistent flags plus every ancestor's
    /// persistent flags, closest scope first.
    pub fn flags(&self) -> FlagSet {
        let (effective, mut sources) = {
            let node = self.node.borrow();
            (
                node.flags.clone(),
                vec![node.local_flags.clone(), node.persistent_flags.clone()],
            )
        };
        sources.extend(self.ancestors().map(|a| a.persistent_flags()));
        effective.rebuild_from(&sources);
        effective
    }

    /// Flags visible only on this command.
    pub fn local_flags(&self) -> FlagSet {
        self.node.borrow().local_flags.clone()
    }

    /// Flags visible on this command and all of its descendants.
    pub fn persistent_flags(&self) -> FlagSet {
        self.node.borrow().persistent_flags.clone()
    }

    /// Effective flags that come from an ancestor's persistent scope.
    pub fn inherited_flags(&self) -> Vec<Rc<Flag>> {
        let ancestors: Vec<FlagSet> = self.ancestors().map(|a| a.persistent_flags()).collect();
        self.flags()
            .iter()
            .into_iter()
            .filter(|flag| ancestors.iter().any(|scope| scope.contains(flag)))
            .collect()
    }

    /// Merge and parse the effective flags, returning the positional remainder.
    pub fn parse_flags(&self, args: &[String]) -> Result<Vec<String>, ParseError> {
        let flags = self.flags();
        flags.parse(args)?;
        Ok(flags.args())
    }

    pub fn set_out(&self, out: Writer) {
        self.node.borrow_mut().out = Some(out);
    }

    pub fn set_err(&self, err: Writer) {
        self.node.borrow_mut().err = Some(err);
    }

    pub fn set_in(&self, input: Reader) {
        self.node.borrow_mut().input = Some(input);
    }

    /// Output stream, inherited from the parent chain, stdout at the root.
    pub fn out_or_stdout(&self) -> Writer {
        self.inherited(|n| n.out.clone())
            .unwrap_or_else(output::stdout)
    }

    pub fn err_or_stderr(&self) -> Writer {
        self.inherited(|n| n.err.clone())
            .unwrap_or_else(output::stderr)
    }

    pub fn in_or_stdin(&self) -> Reader {
        self.inherited(|n| n.input.clone())
            .unwrap_or_else(output::stdin)
    }

    pub fn set_context<C: Any>(&self, ctx: C) {
        self.node.borrow_mut().context = Some(Rc::new(ctx));
    }

    /// Context of this command or its closest ancestor that has one.
    pub fn context(&self) -> Option<Rc<dyn Any>> {
        self.inherited(|n| n.context.clone())
    }

    pub fn context_value<C: Any>(&self) -> Option<Rc<C>> {
        self.context()?.downcast::<C>().ok()
    }

    pub fn set_help_renderer<R: HelpRenderer + 'static>(&self, renderer: R) {
        self.node.borrow_mut().help_renderer = Some(Rc::new(renderer));
    }

    pub(crate) fn help_renderer(&self) -> Rc<dyn HelpRenderer> {
        self.inherited(|n| n.help_renderer.clone())
            .unwrap_or_else(|| Rc::new(PlainRenderer))
    }

    pub fn set_printer<P: Printer + 'static>(&self, printer: P) {
        self.node.borrow_mut().printer = Some(Rc::new(printer));
    }

    pub(crate) fn printer(&self) -> Rc<dyn Printer> {
        self.inherited(|n| n.printer.clone())
            .unwrap_or_else(|| Rc::new(PlainPrinter))
    }

    /// Callback pair for `stage`. Persistent stages fall back to the closest
    /// ancestor that sets one.
    pub(crate) fn hook(&self, stage: Stage) -> Hook {
        let own = self.node.borrow().hooks.get(stage).clone();
        if own.is_set() || !stage.is_persistent() {
            return own;
        }
        self.ancestors()
            .map(|a| {
                let node = a.node.borrow();
                node.hooks.get(stage).clone()
            })
            .find(Hook::is_set)
            .unwrap_or_default()
    }

    fn inherited<T>(&self, pick: impl Fn(&Node) -> Option<T>) -> Option<T> {
        let mut current = Some(self.clone());
        while let Some(cmd) = current {
            if let Some(found) = pick(&cmd.node.borrow()) {
                return Some(found);
            }
            current = cmd.parent();
        }
        None
    }
}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Command {}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node.borrow();
        f.debug_struct("Command")
            .field("usage", &node.usage)
            .field("aliases", &node.aliases)
            .field("children", &node.children)
            .finish_non_exhaustive()
    }
}

fn first_word(usage: &str) -> &str {
    usage
        .split_once(char::is_whitespace)
        .map_or(usage, |(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn name_is_first_word_of_usage() {
        assert_eq!(Command::new("greet <name> [flags]").name(), "greet");
        assert_eq!(Command::new("root").name(), "root");
    }

    #[test]
    fn add_command_links_parent_and_child() {
        let root = Command::new("root");
        let sub = Command::new("sub");
        root.add_command(sub.clone());

        assert_eq!(root.commands(), vec![sub.clone()]);
        assert_eq!(sub.parent(), Some(root.clone()));
        assert!(!root.has_parent());
        assert!(root.has_sub_commands());
    }

    #[test]
    #[should_panic(expected = "command can't be a child of itself")]
    fn adding_self_as_child_panics() {
        let cmd = Command::new("loop");
        cmd.add_command(cmd.clone());
    }

    #[test]
    #[should_panic(expected = "child of its own descendant")]
    fn adding_an_ancestor_as_child_panics() {
        let root = Command::new("root");
        let sub = Command::new("sub");
        root.add_command(sub.clone());
        sub.add_command(root.clone());
    }

    #[test]
    fn remove_command_clears_parent() {
        let root = Command::new("root");
        let sub1 = Command::new("sub1");
        let sub2 = Command::new("sub2");
        root.add_commands([sub1.clone(), sub2.clone()]);

        root.remove_command(&sub1);
        assert_eq!(root.commands(), vec![sub2]);
        assert!(!sub1.has_parent());
    }

    #[test]
    fn re_adding_moves_a_command_between_parents() {
        let a = Command::new("a");
        let b = Command::new("b");
        let leaf = Command::new("leaf");
        a.add_command(leaf.clone());
        b.add_command(leaf.clone());

        assert!(a.commands().is_empty());
        assert_eq!(leaf.parent(), Some(b));
    }

    #[test]
    fn root_path_and_use_line() {
        let root = Command::new("app");
        let sub = Command::new("remote");
        let leaf = Command::new("add <name> <url>");
        root.add_command(sub.clone());
        sub.add_command(leaf.clone());

        assert_eq!(leaf.root(), root);
        assert_eq!(root.root(), root);
        assert_eq!(leaf.command_path(), "app remote add");
        assert_eq!(leaf.use_line(), "app remote add <name> <url>");
    }

    #[test]
    fn persistent_flags_are_visible_from_descendants() {
        let root = Command::new("root");
        root.persistent_flags()
            .bool_p("verbose", 'v', false, "Verbose output");
        let sub = Command::new("sub");
        root.add_command(sub.clone());

        let verbose = sub.flags().lookup("verbose").expect("inherited flag");
        assert_eq!(verbose.value(), crate::flags::Value::Bool(false));
        assert_eq!(sub.inherited_flags().len(), 1);
    }

    #[test]
    fn own_flag_shadows_inherited_flag() {
        let root = Command::new("root");
        root.persistent_flags().string("output", "text", "");
        let sub = Command::new("sub");
        root.add_command(sub.clone());
        sub.local_flags().string("output", "json", "");

        let flag = sub.flags().lookup("output").unwrap();
        assert!(Rc::ptr_eq(&flag, &sub.local_flags().lookup("output").unwrap()));
        assert_eq!(sub.flags().get_string("output").unwrap(), "json");
        assert!(sub.inherited_flags().is_empty());
    }

    #[test]
    fn effective_flag_registered_after_attach_shadows_inherited_flag() {
        let root = Command::new("root");
        root.persistent_flags().bool_p("verbose", 'v', false, "");
        let sub = Command::new("sub");
        root.add_command(sub.clone());
        let own = sub.flags().bool("verbose", true, "");

        assert!(sub.flags().get_bool("verbose").unwrap());
        assert!(Rc::ptr_eq(&sub.flags().lookup("verbose").unwrap(), own.flag()));
        assert!(sub.inherited_flags().is_empty());
        assert!(!root.flags().get_bool("verbose").unwrap());
    }

    #[test]
    fn closest_ancestor_wins_between_persistent_scopes() {
        let root = Command::new("root");
        root.persistent_flags().int("depth", 1, "");
        let mid = Command::new("mid");
        mid.persistent_flags().int("depth", 2, "");
        let leaf = Command::new("leaf");
        root.add_command(mid.clone());
        mid.add_command(leaf.clone());

        assert_eq!(leaf.flags().get_int("depth").unwrap(), 2);
    }

    #[test]
    fn streams_fall_back_to_parent() {
        let out = Rc::new(RefCell::new(Vec::<u8>::new()));
        let input = Rc::new(RefCell::new(std::io::Cursor::new(b"input".to_vec())));

        let root = Command::new("root");
        root.set_out(out.clone());
        root.set_in(input);
        let sub = Command::new("sub");
        root.add_command(sub.clone());

        writeln!(sub.out_or_stdout().borrow_mut(), "hello").unwrap();
        assert_eq!(out.borrow().as_slice(), b"hello\n");

        let mut text = String::new();
        sub.in_or_stdin().borrow_mut().read_to_string(&mut text).unwrap();
        assert_eq!(text, "input");
    }

    #[test]
    fn context_is_inherited_by_lookup() {
        let root = Command::new("root");
        let sub = Command::new("sub");
        root.add_command(sub.clone());
        root.set_context(String::from("value"));

        assert_eq!(sub.context_value::<String>().as_deref().map(String::as_str), Some("value"));
        assert!(sub.context_value::<u32>().is_none());
    }

    #[test]
    fn persistent_hooks_are_inherited() {
        let root = Command::new("root").persistent_pre_run(|_, _| {});
        let sub = Command::new("sub");
        root.add_command(sub.clone());

        assert!(sub.hook(Stage::PersistentPreRun).is_set());
        assert!(!sub.hook(Stage::PreRun).is_set());
    }
}
