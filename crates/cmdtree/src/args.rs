//! Positional-argument validators.
//!
//! A validator is a pure predicate over the resolved command and the
//! positional args left after flag parsing and subcommand resolution.

use std::fmt;
use std::rc::Rc;

use crate::command::Command;
use crate::error::ValidationError;

/// A positional-argument contract.
#[derive(Clone)]
pub struct PositionalArgs {
    check: Rc<dyn Fn(&Command, &[String]) -> Result<(), ValidationError>>,
}

impl PositionalArgs {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Command, &[String]) -> Result<(), ValidationError> + 'static,
    {
        Self {
            check: Rc::new(check),
        }
    }

    pub fn validate(&self, cmd: &Command, args: &[String]) -> Result<(), ValidationError> {
        (self.check)(cmd, args)
    }
}

impl fmt::Debug for PositionalArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PositionalArgs(..)")
    }
}

/// Fails on any positional arg. An unknown subcommand lands here too.
pub fn no_args() -> PositionalArgs {
    PositionalArgs::new(|cmd, args| match args.first() {
        Some(first) => Err(ValidationError::new(format!(
            "unknown command {first:?} for {:?}",
            cmd.command_path()
        ))),
        None => Ok(()),
    })
}

pub fn arbitrary_args() -> PositionalArgs {
    PositionalArgs::new(|_, _| Ok(()))
}

pub fn minimum_n_args(n: usize) -> PositionalArgs {
    PositionalArgs::new(move |_, args| {
        if args.len() < n {
            return Err(ValidationError::new(format!(
                "requires at least {n} arg(s), only received {}",
                args.len()
            )));
        }
        Ok(())
    })
}

pub fn maximum_n_args(n: usize) -> PositionalArgs {
    PositionalArgs::new(move |_, args| {
        if args.len() > n {
            return Err(ValidationError::new(format!(
                "accepts at most {n} arg(s), received {}",
                args.len()
            )));
        }
        Ok(())
    })
}

pub fn exact_args(n: usize) -> PositionalArgs {
    PositionalArgs::new(move |_, args| {
        if args.len() != n {
            return Err(ValidationError::new(format!(
                "accepts {n} arg(s), received {}",
                args.len()
            )));
        }
        Ok(())
    })
}

pub fn range_args(min: usize, max: usize) -> PositionalArgs {
    PositionalArgs::new(move |_, args| {
        if args.len() < min || args.len() > max {
            return Err(ValidationError::new(format!(
                "accepts between {min} and {max} arg(s), received {}",
                args.len()
            )));
        }
        Ok(())
    })
}

/// Every arg must be one of the command's `valid_args` (unchecked when empty).
pub fn only_valid_args() -> PositionalArgs {
    PositionalArgs::new(|cmd, args| {
        let valid = cmd.get_valid_args();
        if valid.is_empty() {
            return Ok(());
        }
        match args.iter().find(|arg| !valid.contains(arg)) {
            Some(invalid) => Err(ValidationError::new(format!(
                "invalid argument {invalid:?} for {:?}",
                cmd.command_path()
            ))),
            None => Ok(()),
        }
    })
}

/// Run `validators` in order; the first failure wins.
pub fn match_all<I>(validators: I) -> PositionalArgs
where
    I: IntoIterator<Item = PositionalArgs>,
{
    let validators: Vec<PositionalArgs> = validators.into_iter().collect();
    PositionalArgs::new(move |cmd, args| {
        validators
            .iter()
            .try_for_each(|validator| validator.validate(cmd, args))
    })
}
