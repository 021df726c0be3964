use std::fmt;
use std::rc::Rc;

use crate::command::Command;

/// A callback that cannot fail.
pub type RunFn = Rc<dyn Fn(&Command, &[String])>;

/// A callback whose error aborts the pipeline.
pub type TryRunFn = Rc<dyn Fn(&Command, &[String]) -> anyhow::Result<()>>;

/// One of the ordered callback points of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    PersistentPreRun,
    PreRun,
    Run,
    PostRun,
    PersistentPostRun,
}

impl Stage {
    /// Execution order.
    pub const ALL: [Stage; 5] = [
        Stage::PersistentPreRun,
        Stage::PreRun,
        Stage::Run,
        Stage::PostRun,
        Stage::PersistentPostRun,
    ];

    /// Persistent stages are inherited by descendants.
    pub fn is_persistent(self) -> bool {
        matches!(self, Self::PersistentPreRun | Self::PersistentPostRun)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PersistentPreRun => "persistent-pre-run",
            Self::PreRun => "pre-run",
            Self::Run => "run",
            Self::PostRun => "post-run",
            Self::PersistentPostRun => "persistent-post-run",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The callback pair for one stage. The fallible variant takes precedence.
#[derive(Clone, Default)]
pub(crate) struct Hook {
    pub(crate) plain: Option<RunFn>,
    pub(crate) fallible: Option<TryRunFn>,
}

impl Hook {
    pub(crate) fn is_set(&self) -> bool {
        self.plain.is_some() || self.fallible.is_some()
    }

    pub(crate) fn invoke(&self, cmd: &Command, args: &[String]) -> anyhow::Result<()> {
        if let Some(f) = &self.fallible {
            return f(cmd, args);
        }
        if let Some(f) = &self.plain {
            f(cmd, args);
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub(crate) struct Hooks {
    persistent_pre_run: Hook,
    pre_run: Hook,
    run: Hook,
    post_run: Hook,
    persistent_post_run: Hook,
}

impl Hooks {
    pub(crate) fn get(&self, stage: Stage) -> &Hook {
        match stage {
            Stage::PersistentPreRun => &self.persistent_pre_run,
            Stage::PreRun => &self.pre_run,
            Stage::Run => &self.run,
            Stage::PostRun => &self.post_run,
            Stage::PersistentPostRun => &self.persistent_post_run,
        }
    }

    pub(crate) fn get_mut(&mut self, stage: Stage) -> &mut Hook {
        match stage {
            Stage::PersistentPreRun => &mut self.persistent_pre_run,
            Stage::PreRun => &mut self.pre_run,
            Stage::Run => &mut self.run,
            Stage::PostRun => &mut self.post_run,
            Stage::PersistentPostRun => &mut self.persistent_post_run,
        }
    }
}
