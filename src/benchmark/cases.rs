//! The fixed table of interpreter/program combinations

use crate::config::InterpreterConfig;
use crate::constants::{STDIN_PAYLOAD, cases};
use crate::models::BenchmarkCase;

/// Build the benchmark cases, in report order
pub fn default_cases(interpreters: &InterpreterConfig) -> Vec<BenchmarkCase> {
    cases::TABLE
        .iter()
        .map(|&(name, program, reads_stdin)| {
            let (executable, examples_dir) = match name {
                cases::PIET => (&interpreters.piet_path, &interpreters.piet_examples_dir),
                _ => (
                    &interpreters.whitespace_path,
                    &interpreters.whitespace_examples_dir,
                ),
            };

            let case = BenchmarkCase::new(
                name,
                executable.clone(),
                examples_dir.join(program).display().to_string(),
            );
            if reads_stdin {
                case.with_stdin(STDIN_PAYLOAD)
            } else {
                case
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn interpreters() -> InterpreterConfig {
        InterpreterConfig {
            piet_path: PathBuf::from("/bin/piet"),
            whitespace_path: PathBuf::from("/bin/ws"),
            piet_examples_dir: PathBuf::from("piet"),
            whitespace_examples_dir: PathBuf::from("ws"),
        }
    }

    #[test]
    fn test_table_order_and_interpreters() {
        let cases = default_cases(&interpreters());
        assert_eq!(cases.len(), 8);

        let names: Vec<_> = cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Piet", "Whitespace", "Piet", "Whitespace", "Piet", "Whitespace", "Piet", "Whitespace"]
        );

        assert_eq!(cases[0].executable_path, PathBuf::from("/bin/piet"));
        assert_eq!(cases[1].executable_path, PathBuf::from("/bin/ws"));
        assert_eq!(
            PathBuf::from(&cases[0].argument),
            PathBuf::from("piet").join("fib.png")
        );
        assert_eq!(PathBuf::from(&cases[7].argument), PathBuf::from("ws").join("fact.ws"));
    }

    #[test]
    fn test_stdin_cases() {
        let cases = default_cases(&interpreters());
        let with_stdin: Vec<usize> = cases
            .iter()
            .enumerate()
            .filter(|(_, c)| c.stdin_payload.is_some())
            .map(|(i, _)| i)
            .collect();

        assert_eq!(with_stdin, vec![1, 6, 7]);
        assert_eq!(cases[1].stdin_payload.as_deref(), Some(&b"14\n"[..]));
    }
}
