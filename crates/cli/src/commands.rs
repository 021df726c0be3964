//! The demo command tree.

use anyhow::{Context, anyhow};
use cmdtree::{Command, maximum_n_args, minimum_n_args, no_args, only_valid_args};

const LIST_ITEMS: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

pub fn build() -> Command {
    let root = Command::new("demo")
        .about("A demo application for cmdtree")
        .long_about(
            "A small application showing nested commands, scoped flags,\n\
             argument validation and lifecycle hooks.",
        )
        .example("  demo greet --name John\n  demo process --count 3\n  demo echo hello world")
        .version(env!("CARGO_PKG_VERSION"))
        .args(no_args())
        .try_persistent_pre_run(|cmd, _| {
            if verbose(cmd) {
                cmd.print_info(&format!("running {}", cmd.command_path()))?;
            }
            Ok(())
        });
    root.persistent_flags()
        .bool_p("verbose", 'v', false, "Enable verbose output");

    root.add_commands([greet(), process(), echo(), list(), fail(), doc()]);
    root
}

fn verbose(cmd: &Command) -> bool {
    cmd.flags().get_bool("verbose").unwrap_or(false)
}

fn greet() -> Command {
    let cmd = Command::new("greet [flags]")
        .alias("hi")
        .about("Greet someone")
        .example("  demo greet --name John --enthusiastic")
        .args(no_args())
        .try_run(|cmd, _| {
            let flags = cmd.flags();
            let name = flags.get_string("name")?;
            let mark = if flags.get_bool("enthusiastic")? { "!" } else { "." };
            cmd.print_success(&format!("Hello, {name}{mark}"))?;
            Ok(())
        });
    cmd.local_flags()
        .string_p("name", 'n', "World", "Name to greet")
        .env("DEMO_NAME");
    cmd.local_flags()
        .bool_p("enthusiastic", 'e', false, "Add an exclamation mark");
    cmd
}

fn process() -> Command {
    let cmd = Command::new("process [flags]")
        .about("Process a number of items")
        .args(maximum_n_args(0))
        .try_run(|cmd, _| {
            let count = cmd.flags().get_int("count")?;
            if count < 0 {
                return Err(anyhow!("count must not be negative, got {count}"));
            }
            cmd.print_header(&format!("Processing {count} items"))?;
            if verbose(cmd) {
                for i in 1..=count {
                    cmd.print_info(&format!("item {i} done"))?;
                }
            }
            cmd.print_success(&format!("Processed {count} items"))?;
            Ok(())
        });
    cmd.local_flags()
        .int_p("count", 'c', 5, "Number of items to process");
    cmd
}

fn echo() -> Command {
    let cmd = Command::new("echo <text>...")
        .alias("say")
        .about("Print the arguments")
        .args(minimum_n_args(1))
        .try_run(|cmd, args| {
            let text = args.join(" ");
            let text = if cmd.flags().get_bool("upper")? {
                text.to_uppercase()
            } else {
                text
            };
            cmd.print_info(&text)?;
            Ok(())
        });
    cmd.local_flags().bool("upper", false, "Print in upper case");
    cmd
}

fn list() -> Command {
    Command::new("list [item]...")
        .about("List known items")
        .valid_args(LIST_ITEMS)
        .args(only_valid_args())
        .try_run(|cmd, args| {
            let items: Vec<&str> = if args.is_empty() {
                LIST_ITEMS.to_vec()
            } else {
                args.iter().map(String::as_str).collect()
            };
            for item in items {
                cmd.print_info(&format!("- {item}"))?;
            }
            Ok(())
        })
}

fn fail() -> Command {
    Command::new("fail")
        .about("Always fails, to show error reporting")
        .args(no_args())
        .try_run(|_, _| {
            Err(anyhow!("connection refused")).context("failed to reach the service")
        })
}

fn doc() -> Command {
    Command::new("doc")
        .about("Print the help document as JSON")
        .hidden(true)
        .args(no_args())
        .try_run(|cmd, _| {
            let doc = cmd.root().usage_doc();
            let json = serde_json::to_string_pretty(&doc)?;
            cmd.print_info(&json)?;
            Ok(())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Buffer = Rc<RefCell<Vec<u8>>>;

    fn run(args: &[&str]) -> (cmdtree::Result<()>, String, String) {
        let root = build();
        let out: Buffer = Rc::default();
        let err: Buffer = Rc::default();
        root.set_out(out.clone());
        root.set_err(err.clone());

        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let (target, rest) = root.find(&args);
        let result = target.execute_with_env(rest, &[]);

        let out = String::from_utf8(out.borrow().clone()).unwrap();
        let err = String::from_utf8(err.borrow().clone()).unwrap();
        (result, out, err)
    }

    #[test]
    fn greet_uses_name_and_enthusiasm() {
        let (result, out, _) = run(&["greet", "-n", "Ann", "-e"]);
        result.unwrap();
        assert_eq!(out, "Hello, Ann!\n");

        let (result, out, _) = run(&["hi"]);
        result.unwrap();
        assert_eq!(out, "Hello, World.\n");
    }

    #[test]
    fn verbose_is_inherited_by_subcommands() {
        let (result, out, _) = run(&["process", "-c", "2", "-v"]);
        result.unwrap();
        assert_eq!(
            out,
            "running demo process\nProcessing 2 items\n\
             item 1 done\nitem 2 done\nProcessed 2 items\n"
        );
    }

    #[test]
    fn process_rejects_positionals() {
        let (result, _, _) = run(&["process", "extra"]);
        assert_eq!(
            result.unwrap_err().to_string(),
            "accepts at most 0 arg(s), received 1"
        );
    }

    #[test]
    fn echo_joins_arguments() {
        let (result, out, _) = run(&["say", "--upper", "hello", "world"]);
        result.unwrap();
        assert_eq!(out, "HELLO WORLD\n");

        let (result, _, _) = run(&["echo"]);
        assert!(result.is_err());
    }

    #[test]
    fn list_accepts_only_known_items() {
        let (result, out, _) = run(&["list", "beta"]);
        result.unwrap();
        assert_eq!(out, "- beta\n");

        let (result, _, _) = run(&["list", "omega"]);
        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid argument \"omega\" for \"demo list\""
        );
    }

    #[test]
    fn fail_reports_error_and_usage() {
        let (result, out, err) = run(&["fail"]);
        let err_value = result.unwrap_err();
        assert_eq!(err_value.stage(), Some(cmdtree::Stage::Run));
        assert_eq!(err, "failed to reach the service: connection refused\n");
        assert!(out.starts_with("Usage:\n  demo fail\n"));
    }

    #[test]
    fn doc_is_hidden_but_runnable() {
        let (result, out, _) = run(&["doc"]);
        result.unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["name"], "demo");
        let names: Vec<&str> = json["commands"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|c| c["name"].as_str())
            .collect();
        assert_eq!(names, vec!["greet", "process", "echo", "list", "fail"]);
    }
}
