use crate::command::Command;
use crate::error::{Error, Result};
use crate::flags::FlagSet;
use crate::lifecycle::Stage;
use crate::output;

const HELP_FLAG: &str = "help";
const VERSION_FLAG: &str = "version";

impl Command {
    /// Execute with the process arguments (without the program name) and
    /// environment.
    pub fn execute(&self) -> Result<()> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        self.execute_from(&args)
    }

    /// Attach `ctx` to this command, then [`execute`](Self::execute).
    pub fn execute_context<C: std::any::Any>(&self, ctx: C) -> Result<()> {
        self.set_context(ctx);
        self.execute()
    }

    /// Execute `args` against the process environment.
    pub fn execute_from(&self, args: &[String]) -> Result<()> {
        let env: Vec<(String, String)> = std::env::vars().collect();
        self.execute_with_env(args, &env)
    }

    /// Parse, resolve, validate and run.
    ///
    /// Flags are parsed against this command's effective set before the
    /// subcommand is resolved; `env` supplies values for env-bound flags not
    /// given in `args`.
    pub fn execute_with_env(&self, args: &[String], env: &[(String, String)]) -> Result<()> {
        let (args, flags) = if self.is_flag_parsing_disabled() {
            (args.to_vec(), None)
        } else {
            self.init_default_flags();
            let flags = self.flags();
            flags.parse_with_env(args, env)?;
            (flags.args(), Some(flags))
        };

        let (target, rest) = self.find(&args);
        tracing::debug!(command = %target.command_path(), args = ?rest, "resolved command");

        if let Some(flags) = &flags {
            if requested(flags, HELP_FLAG) {
                tracing::debug!(command = %target.command_path(), "help requested");
                target.help()?;
                return Ok(());
            }
            if requested(flags, VERSION_FLAG) {
                let line = format!("{} {}", self.name(), self.get_version());
                output::write_line(&target.out_or_stdout(), &line)?;
                return Ok(());
            }
        }

        if let Some(validator) = target.validator() {
            validator.validate(&target, rest)?;
        }

        match target.run_lifecycle(rest) {
            Err(err) if err.stage() == Some(Stage::Run) => {
                target.report_failure(&err);
                Err(err)
            }
            other => other,
        }
    }

    fn init_default_flags(&self) {
        let effective = self.flags();
        let local = self.local_flags();
        if effective.lookup(HELP_FLAG).is_none() {
            let shorthand = shorthand_free(&[&effective, &local], 'h').then_some('h');
            local.add(
                HELP_FLAG,
                shorthand,
                false,
                &format!("help for {}", self.name()),
            );
        }
        if !self.get_version().is_empty() && effective.lookup(VERSION_FLAG).is_none() {
            let shorthand = shorthand_free(&[&effective, &local], 'V').then_some('V');
            local.add(
                VERSION_FLAG,
                shorthand,
                false,
                &format!("version for {}", self.name()),
            );
        }
    }

    fn run_lifecycle(&self, args: &[String]) -> Result<()> {
        for stage in Stage::ALL {
            let hook = self.hook(stage);
            if !hook.is_set() {
                continue;
            }
            tracing::trace!(command = %self.command_path(), %stage, "entering stage");
            if let Err(error) = hook.invoke(self, args) {
                tracing::debug!(
                    command = %self.command_path(),
                    %stage,
                    error = %format!("{error:#}"),
                    "stage failed"
                );
                return Err(Error::Lifecycle { stage, error });
            }
        }
        Ok(())
    }

    fn report_failure(&self, err: &Error) {
        if !self.silences_errors() {
            if let Err(e) = output::write_line(&self.err_or_stderr(), &err.to_string()) {
                tracing::warn!(error = %e, "failed to write error message");
            }
        }
        if !self.silences_usage() {
            if let Err(e) = self.usage() {
                tracing::warn!(error = %e, "failed to write usage");
            }
        }
    }
}

fn requested(flags: &FlagSet, name: &str) -> bool {
    matches!(flags.get_bool(name), Ok(true))
}

fn shorthand_free(sets: &[&FlagSet], c: char) -> bool {
    sets.iter().all(|set| set.shorthand_lookup(c).is_none())
}
