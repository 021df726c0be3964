use super::{FlagSet, Kind};
use crate::error::ParseError;

impl FlagSet {
    /// Parse `argv`, assigning recognized flags and keeping the rest as positional args.
    pub fn parse(&self, argv: &[String]) -> Result<(), ParseError> {
        self.parse_with_env(argv, &[])
    }

    /// Parse `argv`, then fill env-bound flags that were not given from `env`.
    ///
    /// Value precedence is:
    /// 1) CLI argv
    /// 2) env
    /// 3) default
    ///
    /// Parsing is interspersed: positional args may appear between flags.
    /// `--` stops flag parsing and is itself dropped. Every flag in the set
    /// starts from its default, so nothing carries over from an earlier parse.
    pub fn parse_with_env(
        &self,
        argv: &[String],
        env: &[(String, String)],
    ) -> Result<(), ParseError> {
        for flag in self.iter() {
            flag.reset();
        }
        let mut positionals: Vec<String> = Vec::new();

        let mut i = 0usize;
        while i < argv.len() {
            let arg = argv[i].as_str();

            if arg == "--" {
                positionals.extend(argv[i + 1..].iter().cloned());
                break;
            }

            if let Some(body) = arg.strip_prefix("--") {
                i = self.parse_long(body, argv, i)?;
                continue;
            }

            if arg.len() > 1 && arg.starts_with('-') {
                i = self.parse_short(&arg[1..], argv, i)?;
                continue;
            }

            positionals.push(arg.to_string());
            i += 1;
        }

        self.apply_env(env)?;
        tracing::trace!(flagset = %self.name(), args = ?positionals, "parsed flags");
        self.set_args(positionals);
        Ok(())
    }

    // --key, --key=value, --key value
    fn parse_long(&self, body: &str, argv: &[String], i: usize) -> Result<usize, ParseError> {
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        let flag = self
            .lookup(name)
            .ok_or_else(|| ParseError::UnknownFlag(name.to_string()))?;
        let display = format!("--{name}");

        match inline {
            Some(value) => {
                flag.assign(value, &display, true)?;
                Ok(i + 1)
            }
            None if flag.kind() == Kind::Bool => {
                flag.assign("true", &display, true)?;
                Ok(i + 1)
            }
            None => {
                let Some(value) = argv.get(i + 1) else {
                    return Err(ParseError::MissingValue(display));
                };
                flag.assign(value, &display, true)?;
                Ok(i + 2)
            }
        }
    }

    // -v, -o value, -o=value, -ovalue, -abc
    fn parse_short(&self, shorts: &str, argv: &[String], i: usize) -> Result<usize, ParseError> {
        let token = &argv[i];
        let mut rest = shorts;
        let mut consumed = 1usize;

        while let Some(c) = rest.chars().next() {
            rest = &rest[c.len_utf8()..];
            let flag = self
                .shorthand_lookup(c)
                .ok_or_else(|| ParseError::UnknownShorthand {
                    shorthand: c,
                    token: token.clone(),
                })?;
            let display = format!("-{c}");

            if let Some(value) = rest.strip_prefix('=') {
                flag.assign(value, &display, true)?;
                break;
            }
            if flag.kind() == Kind::Bool {
                flag.assign("true", &display, true)?;
                continue;
            }
            if !rest.is_empty() {
                flag.assign(rest, &display, true)?;
                break;
            }

            let Some(value) = argv.get(i + 1) else {
                return Err(ParseError::MissingValue(display));
            };
            flag.assign(value, &display, true)?;
            consumed = 2;
            break;
        }

        Ok(i + consumed)
    }

    fn apply_env(&self, env: &[(String, String)]) -> Result<(), ParseError> {
        for flag in self.iter() {
            if flag.changed() {
                continue;
            }
            let Some(key) = flag.env() else {
                continue;
            };
            if let Some((_, value)) = env.iter().find(|(k, _)| *k == key) {
                flag.assign(value, &format!("${key}"), false)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ParseError;
    use crate::flags::FlagSet;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_long_and_short_forms() {
        let set = FlagSet::new("test");
        let name = set.string_p("name", 'n', "", "");
        let count = set.int("count", 0, "");
        let verbose = set.bool_p("verbose", 'v', false, "");

        set.parse(&argv(&["--name=ann", "file.txt", "--count", "3", "-v"]))
            .unwrap();
        assert_eq!(name.get(), "ann");
        assert_eq!(count.get(), 3);
        assert!(verbose.get());
        assert_eq!(set.args(), vec!["file.txt"]);
    }

    #[test]
    fn parse_supports_grouped_shorts_and_attached_values() {
        let set = FlagSet::new("test");
        let verbose = set.bool_p("verbose", 'v', false, "");
        let all = set.bool_p("all", 'a', false, "");
        let output = set.string_p("output", 'o', "", "");

        set.parse(&argv(&["-vaoout.txt", "in.txt"])).unwrap();
        assert!(verbose.get());
        assert!(all.get());
        assert_eq!(output.get(), "out.txt");
        assert_eq!(set.args(), vec!["in.txt"]);

        set.parse(&argv(&["-o=x.txt"])).unwrap();
        assert_eq!(output.get(), "x.txt");
    }

    #[test]
    fn bool_flags_do_not_consume_the_next_token() {
        let set = FlagSet::new("test");
        let verbose = set.bool("verbose", false, "");
        set.parse(&argv(&["--verbose", "file.txt"])).unwrap();
        assert!(verbose.get());
        assert_eq!(set.args(), vec!["file.txt"]);

        set.parse(&argv(&["--verbose=false"])).unwrap();
        assert!(!verbose.get());
    }

    #[test]
    fn double_dash_ends_flag_parsing() {
        let set = FlagSet::new("test");
        let verbose = set.bool_p("verbose", 'v', false, "");
        set.parse(&argv(&["a", "--", "-v", "--verbose", "-"])).unwrap();
        assert!(!verbose.get());
        assert_eq!(set.args(), vec!["a", "-v", "--verbose", "-"]);
    }

    #[test]
    fn parse_reports_unknown_and_incomplete_flags() {
        let set = FlagSet::new("test");
        set.string_p("output", 'o', "", "");
        set.int("count", 0, "");

        assert_eq!(
            set.parse(&argv(&["--nope"])).unwrap_err(),
            ParseError::UnknownFlag("nope".to_string())
        );
        assert_eq!(
            set.parse(&argv(&["-x"])).unwrap_err(),
            ParseError::UnknownShorthand {
                shorthand: 'x',
                token: "-x".to_string()
            }
        );
        assert_eq!(
            set.parse(&argv(&["--output"])).unwrap_err(),
            ParseError::MissingValue("--output".to_string())
        );
        let err = set.parse(&argv(&["--count", "many"])).unwrap_err();
        assert!(err.to_string().contains("invalid argument \"many\" for \"--count\" flag"));
    }

    #[test]
    fn value_flags_accept_dash_prefixed_values() {
        let set = FlagSet::new("test");
        let offset = set.int("offset", 0, "");
        set.parse(&argv(&["--offset", "-4"])).unwrap();
        assert_eq!(offset.get(), -4);
    }

    #[test]
    fn string_lists_accumulate_occurrences() {
        let set = FlagSet::new("test");
        let tags = set.string_list_p("tag", 't', &["default"], "");
        set.parse(&argv(&["-t", "a,b", "--tag", "c"])).unwrap();
        assert_eq!(tags.get(), vec!["a", "b", "c"]);
    }

    #[test]
    fn each_parse_starts_from_defaults() {
        let set = FlagSet::new("test");
        let tags = set.string_list("tag", &["default"], "");
        let verbose = set.bool_p("verbose", 'v', false, "");

        set.parse(&argv(&["--tag", "a", "-v"])).unwrap();
        assert_eq!(tags.get(), vec!["a"]);

        set.parse(&argv(&["--tag", "b"])).unwrap();
        assert_eq!(tags.get(), vec!["b"]);
        assert!(!verbose.get());
        assert!(!set.changed("verbose"));

        set.parse(&[]).unwrap();
        assert_eq!(tags.get(), vec!["default"]);
        assert!(!set.changed("tag"));
    }

    #[test]
    fn parse_with_env_respects_precedence() {
        let set = FlagSet::new("test");
        let format = set.string("format", "plain", "").env("FORMAT");

        // default used when env absent
        set.parse_with_env(&[], &[]).unwrap();
        assert_eq!(format.get(), "plain");

        // env beats default
        let env = vec![("FORMAT".to_string(), "json".to_string())];
        set.parse_with_env(&[], &env).unwrap();
        assert_eq!(format.get(), "json");
        assert!(!set.changed("format"));

        // argv beats env
        set.parse_with_env(&argv(&["--format", "xml"]), &env).unwrap();
        assert_eq!(format.get(), "xml");
        assert!(set.changed("format"));
    }
}
