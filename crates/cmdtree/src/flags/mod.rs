//! Typed flag scopes.
//!
//! A [`FlagSet`] is a cheap handle to a shared scope. Flags themselves are
//! shared too: merging a parent's persistent scope into a child's effective
//! scope inserts the same [`Flag`], so a value parsed through one scope is
//! observed through every scope that contains it.

mod parse;
mod value;

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{FlagError, ParseError};

pub use value::{FlagValue, Kind, Value};

/// A single named flag.
#[derive(Debug)]
pub struct Flag {
    name: String,
    shorthand: Option<char>,
    usage: String,
    default: Value,
    value: RefCell<Value>,
    changed: Cell<bool>,
    env: RefCell<Option<String>>,
    hidden: Cell<bool>,
}

impl Flag {
    fn new(name: String, shorthand: Option<char>, default: Value, usage: String) -> Self {
        Self {
            name,
            shorthand,
            usage,
            value: RefCell::new(default.clone()),
            default,
            changed: Cell::new(false),
            env: RefCell::new(None),
            hidden: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shorthand(&self) -> Option<char> {
        self.shorthand
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn kind(&self) -> Kind {
        self.default.kind()
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Current value (the default until parsed or set).
    pub fn value(&self) -> Value {
        self.value.borrow().clone()
    }

    /// Whether the value was given on the command line or via [`FlagSet::set`].
    pub fn changed(&self) -> bool {
        self.changed.get()
    }

    /// Environment variable consulted when the flag is absent from argv.
    pub fn env(&self) -> Option<String> {
        self.env.borrow().clone()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden.get()
    }

    /// Assign `raw` after converting it to the flag's kind.
    ///
    /// The first explicit assignment of a string list replaces the default,
    /// later ones append.
    fn assign(&self, raw: &str, display: &str, mark_changed: bool) -> Result<(), ParseError> {
        let parsed = Value::parse(self.kind(), raw).map_err(|reason| ParseError::InvalidValue {
            flag: display.to_string(),
            value: raw.to_string(),
            reason,
        })?;
        let mut slot = self.value.borrow_mut();
        if self.changed.get() {
            slot.append(parsed);
        } else {
            *slot = parsed;
        }
        if mark_changed {
            self.changed.set(true);
        }
        Ok(())
    }

    /// Back to the default, as before any parse.
    fn reset(&self) {
        *self.value.borrow_mut() = self.default.clone();
        self.changed.set(false);
    }

    fn display_name(&self) -> String {
        format!("--{}", self.name)
    }
}

/// Typed handle returned when a flag is registered.
pub struct Typed<T> {
    flag: Rc<Flag>,
    _kind: PhantomData<T>,
}

impl<T> Clone for Typed<T> {
    fn clone(&self) -> Self {
        Self {
            flag: Rc::clone(&self.flag),
            _kind: PhantomData,
        }
    }
}

impl<T: FlagValue> Typed<T> {
    /// Current value of the flag.
    pub fn get(&self) -> T {
        // Registration fixes the kind to `T::KIND`, so the fallback is unreachable.
        T::from_value(&self.flag.value.borrow())
            .or_else(|| T::from_value(&self.flag.default))
            .unwrap_or_else(|| unreachable!("flag {} changed kind", self.flag.name))
    }

    /// Bind an environment variable as a fallback source.
    pub fn env(self, key: impl Into<String>) -> Self {
        *self.flag.env.borrow_mut() = Some(key.into());
        self
    }

    /// Exclude the flag from help output.
    pub fn hidden(self) -> Self {
        self.flag.hidden.set(true);
        self
    }

    pub fn flag(&self) -> &Rc<Flag> {
        &self.flag
    }
}

#[derive(Debug, Default)]
struct Scope {
    name: String,
    flags: IndexMap<String, Rc<Flag>>,
    shorthands: HashMap<char, String>,
    // Names inserted by `rebuild_from` rather than registered directly.
    merged: HashSet<String>,
    args: Vec<String>,
}

impl Scope {
    // Drop a merged entry, releasing its shorthand.
    fn evict_merged(&mut self, name: &str) {
        self.merged.remove(name);
        if let Some(flag) = self.flags.shift_remove(name) {
            if let Some(c) = flag.shorthand() {
                if self.shorthands.get(&c).map(String::as_str) == Some(name) {
                    self.shorthands.remove(&c);
                }
            }
        }
    }
}

/// A named set of flags.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    scope: Rc<RefCell<Scope>>,
}

impl FlagSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            scope: Rc::new(RefCell::new(Scope {
                name: name.into(),
                ..Default::default()
            })),
        }
    }

    pub fn name(&self) -> String {
        self.scope.borrow().name.clone()
    }

    /// Register a flag of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if `name` or `shorthand` is already registered directly in this
    /// set. Entries merged from another scope give way to the new flag.
    pub fn add<T: FlagValue>(
        &self,
        name: &str,
        shorthand: Option<char>,
        default: T,
        usage: &str,
    ) -> Typed<T> {
        let flag = Rc::new(Flag::new(
            name.to_string(),
            shorthand,
            default.into_value(),
            usage.to_string(),
        ));
        let mut scope = self.scope.borrow_mut();
        if scope.merged.contains(name) {
            scope.evict_merged(name);
        } else if scope.flags.contains_key(name) {
            panic!("{} flag redefined: {name}", scope.name);
        }
        if let Some(c) = shorthand {
            if let Some(used) = scope.shorthands.get(&c).cloned() {
                if !scope.merged.contains(&used) {
                    panic!(
                        "unable to redefine {c:?} shorthand in {:?} flagset: \
                         it's already used for {used:?} flag",
                        scope.name
                    );
                }
                tracing::debug!(
                    flag = name,
                    shorthand = %c,
                    inherited = used.as_str(),
                    "own flag takes the shorthand of an inherited flag"
                );
            }
            scope.shorthands.insert(c, name.to_string());
        }
        scope.flags.insert(name.to_string(), Rc::clone(&flag));
        Typed {
            flag,
            _kind: PhantomData,
        }
    }

    pub fn bool(&self, name: &str, default: bool, usage: &str) -> Typed<bool> {
        self.add(name, None, default, usage)
    }

    pub fn bool_p(&self, name: &str, shorthand: char, default: bool, usage: &str) -> Typed<bool> {
        self.add(name, Some(shorthand), default, usage)
    }

    pub fn string(&self, name: &str, default: &str, usage: &str) -> Typed<String> {
        self.add(name, None, default.to_string(), usage)
    }

    pub fn string_p(
        &self,
        name: &str,
        shorthand: char,
        default: &str,
        usage: &str,
    ) -> Typed<String> {
        self.add(name, Some(shorthand), default.to_string(), usage)
    }

    pub fn int(&self, name: &str, default: i64, usage: &str) -> Typed<i64> {
        self.add(name, None, default, usage)
    }

    pub fn int_p(&self, name: &str, shorthand: char, default: i64, usage: &str) -> Typed<i64> {
        self.add(name, Some(shorthand), default, usage)
    }

    pub fn uint(&self, name: &str, default: u64, usage: &str) -> Typed<u64> {
        self.add(name, None, default, usage)
    }

    pub fn uint_p(&self, name: &str, shorthand: char, default: u64, usage: &str) -> Typed<u64> {
        self.add(name, Some(shorthand), default, usage)
    }

    pub fn float(&self, name: &str, default: f64, usage: &str) -> Typed<f64> {
        self.add(name, None, default, usage)
    }

    pub fn float_p(&self, name: &str, shorthand: char, default: f64, usage: &str) -> Typed<f64> {
        self.add(name, Some(shorthand), default, usage)
    }

    pub fn string_list(&self, name: &str, default: &[&str], usage: &str) -> Typed<Vec<String>> {
        self.add(name, None, to_owned_list(default), usage)
    }

    pub fn string_list_p(
        &self,
        name: &str,
        shorthand: char,
        default: &[&str],
        usage: &str,
    ) -> Typed<Vec<String>> {
        self.add(name, Some(shorthand), to_owned_list(default), usage)
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<Flag>> {
        self.scope.borrow().flags.get(name).cloned()
    }

    pub fn shorthand_lookup(&self, shorthand: char) -> Option<Rc<Flag>> {
        let scope = self.scope.borrow();
        scope
            .shorthands
            .get(&shorthand)
            .and_then(|name| scope.flags.get(name))
            .cloned()
    }

    pub fn has_flags(&self) -> bool {
        !self.scope.borrow().flags.is_empty()
    }

    /// Flags in registration order.
    pub fn iter(&self) -> Vec<Rc<Flag>> {
        self.scope.borrow().flags.values().cloned().collect()
    }

    /// Whether `name` was set on the command line or programmatically.
    pub fn changed(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|f| f.changed())
    }

    /// Programmatically assign a flag value, with the same conversion rules as parsing.
    pub fn set(&self, name: &str, value: &str) -> Result<(), ParseError> {
        let flag = self
            .lookup(name)
            .ok_or_else(|| ParseError::UnknownFlag(name.to_string()))?;
        flag.assign(value, &flag.display_name(), true)
    }

    /// Positional arguments left over by the last parse.
    pub fn args(&self) -> Vec<String> {
        self.scope.borrow().args.clone()
    }

    pub fn get<T: FlagValue>(&self, name: &str) -> Result<T, FlagError> {
        let flag = self
            .lookup(name)
            .ok_or_else(|| FlagError::NotFound(name.to_string()))?;
        let value = flag.value.borrow();
        T::from_value(&value).ok_or_else(|| FlagError::WrongType {
            name: name.to_string(),
            requested: T::KIND,
            actual: value.kind(),
        })
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, FlagError> {
        self.get(name)
    }

    pub fn get_string(&self, name: &str) -> Result<String, FlagError> {
        self.get(name)
    }

    pub fn get_int(&self, name: &str) -> Result<i64, FlagError> {
        self.get(name)
    }

    pub fn get_uint(&self, name: &str) -> Result<u64, FlagError> {
        self.get(name)
    }

    pub fn get_float(&self, name: &str) -> Result<f64, FlagError> {
        self.get(name)
    }

    pub fn get_string_list(&self, name: &str) -> Result<Vec<String>, FlagError> {
        self.get(name)
    }

    pub(crate) fn contains(&self, flag: &Rc<Flag>) -> bool {
        self.scope
            .borrow()
            .flags
            .get(flag.name())
            .is_some_and(|f| Rc::ptr_eq(f, flag))
    }

    /// Replace previously merged entries with the flags of `sources`, in order.
    ///
    /// Names already present win, so earlier sources shadow later ones and
    /// directly registered flags shadow every source.
    pub(crate) fn rebuild_from(&self, sources: &[FlagSet]) {
        let mut scope = self.scope.borrow_mut();
        let stale: Vec<String> = scope.merged.drain().collect();
        for name in stale {
            if let Some(flag) = scope.flags.shift_remove(&name) {
                if let Some(c) = flag.shorthand() {
                    if scope.shorthands.get(&c) == Some(&name) {
                        scope.shorthands.remove(&c);
                    }
                }
            }
        }

        for source in sources {
            if Rc::ptr_eq(&source.scope, &self.scope) {
                continue;
            }
            for flag in source.iter() {
                if scope.flags.contains_key(flag.name()) {
                    continue;
                }
                if let Some(c) = flag.shorthand() {
                    if let Some(owner) = scope.shorthands.get(&c).cloned() {
                        tracing::warn!(
                            flag = flag.name(),
                            shorthand = %c,
                            owner = owner.as_str(),
                            "shorthand already in use; inherited flag merged without it"
                        );
                    } else {
                        scope.shorthands.insert(c, flag.name().to_string());
                    }
                }
                scope.merged.insert(flag.name().to_string());
                scope.flags.insert(flag.name().to_string(), flag);
            }
        }
    }

    fn set_args(&self, args: Vec<String>) {
        self.scope.borrow_mut().args = args;
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
