use crate::command::Command;

impl Command {
    /// Walk the tree along `args` and return the deepest matching command
    /// together with the unconsumed args.
    ///
    /// Children are tried in registration order, each by name then alias. The
    /// walk is greedy: a matched token is never given back, and the first
    /// token that matches no child (a flag, a positional, an unknown
    /// subcommand) ends it.
    pub fn find<'a>(&self, args: &'a [String]) -> (Command, &'a [String]) {
        let Some((first, rest)) = args.split_first() else {
            return (self.clone(), args);
        };
        match self.child(first) {
            Some(child) => {
                tracing::trace!(parent = %self.name(), child = %child.name(), "matched subcommand");
                child.find(rest)
            }
            None => (self.clone(), args),
        }
    }

    /// The first child, in registration order, named or aliased `token`.
    pub fn child(&self, token: &str) -> Option<Command> {
        self.commands()
            .into_iter()
            .find(|c| c.name() == token || c.has_alias(token))
    }
}

#[cfg(test)]
mod tests {
    use crate::command::Command;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn tree() -> (Command, Command, Command) {
        let root = Command::new("root");
        let remote = Command::new("remote").alias("r");
        let add = Command::new("add <name>");
        root.add_command(remote.clone());
        remote.add_command(add.clone());
        (root, remote, add)
    }

    #[test]
    fn empty_args_resolve_to_self() {
        let (root, remote, _) = tree();
        let (found, rest) = root.find(&[]);
        assert_eq!(found, root);
        assert!(rest.is_empty());
        let (found, rest) = remote.find(&[]);
        assert_eq!(found, remote);
        assert!(rest.is_empty());
    }

    #[test]
    fn find_walks_names_and_aliases() {
        let (root, remote, add) = tree();

        let args = argv(&["remote", "add", "origin", "url"]);
        let (found, rest) = root.find(&args);
        assert_eq!(found, add);
        assert_eq!(rest, &args[2..]);

        let args = argv(&["r", "origin"]);
        let (found, rest) = root.find(&args);
        assert_eq!(found, remote);
        assert_eq!(rest, ["origin".to_string()]);
    }

    #[test]
    fn unknown_token_stops_at_current_command() {
        let (root, _, _) = tree();
        let args = argv(&["unknown", "remote"]);
        let (found, rest) = root.find(&args);
        assert_eq!(found, root);
        assert_eq!(rest, args.as_slice());

        let args = argv(&["--verbose", "remote"]);
        let (found, _) = root.find(&args);
        assert_eq!(found, root);
    }

    #[test]
    fn find_does_not_backtrack() {
        let (root, remote, _) = tree();
        // "nope" matches nothing below `remote`; resolution stays there.
        let args = argv(&["remote", "nope"]);
        let (found, rest) = root.find(&args);
        assert_eq!(found, remote);
        assert_eq!(rest, ["nope".to_string()]);
    }

    #[test]
    fn first_registered_match_wins() {
        let root = Command::new("root");
        let first = Command::new("list").alias("ls");
        let second = Command::new("ls");
        let third = Command::new("list");
        root.add_commands([first.clone(), second.clone(), third]);

        assert_eq!(root.child("ls"), Some(first.clone()));
        assert_eq!(root.child("list"), Some(first));
        assert_eq!(root.child("nope"), None);
    }

    #[test]
    fn hidden_commands_still_resolve() {
        let root = Command::new("root");
        let secret = Command::new("secret").hidden(true);
        root.add_command(secret.clone());
        let args = argv(&["secret"]);
        assert_eq!(root.find(&args).0, secret);
    }
}
