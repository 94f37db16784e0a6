//! Development-mode warnings
//!
//! Warnings never fail an operation. They are handed to a [`WarningSink`];
//! the default sink forwards them to `tracing`.

use std::fmt;
use std::rc::Rc;

/// A non-fatal diagnostic produced by the reducer combinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// No valid reducers were left after filtering.
    EmptyReducerMap,
    /// A key was registered without a reducer.
    MissingReducer { key: String },
    /// The state handed to a combined reducer was not a record.
    UnexpectedStateType {
        argument: &'static str,
        kind: &'static str,
        expected_keys: Vec<String>,
    },
    /// The state carried keys no reducer owns.
    UnexpectedKeys {
        argument: &'static str,
        keys: Vec<String>,
        expected_keys: Vec<String>,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::EmptyReducerMap => write!(
                f,
                "Store does not have a valid reducer. Make sure the argument passed \
                 to combine_reducers is a mapping whose values are reducers."
            ),
            Warning::MissingReducer { key } => {
                write!(f, "No reducer provided for key \"{key}\"")
            }
            Warning::UnexpectedStateType {
                argument,
                kind,
                expected_keys,
            } => write!(
                f,
                "The {argument} has unexpected type of \"{kind}\". Expected argument to be \
                 an object with the following keys: \"{}\"",
                expected_keys.join("\", \"")
            ),
            Warning::UnexpectedKeys {
                argument,
                keys,
                expected_keys,
            } => write!(
                f,
                "Unexpected key{} \"{}\" found in {argument}. Expected to find one of the \
                 known reducer keys instead: \"{}\". Unexpected keys will be ignored.",
                if keys.len() > 1 { "s" } else { "" },
                keys.join("\", \""),
                expected_keys.join("\", \"")
            ),
        }
    }
}

/// Receiver for warnings
pub type WarningSink = Rc<dyn Fn(&Warning)>;

/// Sink that logs through `tracing::warn!`
pub fn tracing_sink() -> WarningSink {
    Rc::new(|warning: &Warning| {
        tracing::warn!(target: "statecell", "{warning}");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_unexpected_keys_message() {
        let warning = Warning::UnexpectedKeys {
            argument: "previous state received by the reducer",
            keys: vec!["c".into(), "d".into()],
            expected_keys: vec!["a".into(), "b".into()],
        };
        assert_eq!(
            warning.to_string(),
            "Unexpected keys \"c\", \"d\" found in previous state received by the reducer. \
             Expected to find one of the known reducer keys instead: \"a\", \"b\". \
             Unexpected keys will be ignored."
        );
    }

    #[test]
    fn test_single_unexpected_key_is_singular() {
        let warning = Warning::UnexpectedKeys {
            argument: "x",
            keys: vec!["c".into()],
            expected_keys: vec![],
        };
        assert!(warning.to_string().starts_with("Unexpected key \"c\""));
    }

    #[test]
    fn test_missing_reducer_message() {
        let warning = Warning::MissingReducer { key: "todos".into() };
        assert_eq!(warning.to_string(), "No reducer provided for key \"todos\"");
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_sink_logs_through_subscriber() {
        let captured = CapturedLog::default();
        let make_writer = {
            let captured = captured.clone();
            move || captured.clone()
        };
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter("statecell=warn")
            .with_ansi(false)
            .with_writer(make_writer)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let sink = tracing_sink();
            sink(&Warning::MissingReducer { key: "a".into() });
            tracing::info!(target: "statecell", "filtered out");
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("statecell"));
        assert!(output.contains("No reducer provided for key \"a\""));
        assert!(!output.contains("filtered out"));
    }
}
