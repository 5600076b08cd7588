use std::fmt::Write;

use flow_spec::{AnswerStore, RenderPayload, render_json_ui, render_text};

/// How each turn is printed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputFormat {
    /// What a handset would show.
    Text,
    /// One JSON document per turn.
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Controls which bits of state the shell prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: screens only.
    Clean,
    /// Verbose output: state names, progress and the final answer set.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints the screens produced by the orchestrator.
pub struct SessionPresenter {
    format: OutputFormat,
    verbosity: Verbosity,
}

impl SessionPresenter {
    pub fn new(format: OutputFormat, verbosity: Verbosity) -> Self {
        Self { format, verbosity }
    }

    pub fn show(&self, payload: &RenderPayload) {
        match self.format {
            OutputFormat::Json => println!("{}", render_json_ui(payload)),
            OutputFormat::Text => {
                if self.verbosity.is_verbose() {
                    eprintln!("{}", describe_position(payload));
                }
                println!("{}", render_text(payload));
            }
        }
    }

    pub fn show_answers(&self, answers: &AnswerStore) {
        if !self.verbosity.is_verbose() {
            return;
        }
        match answers.to_cbor() {
            Ok(bytes) => eprintln!("Answers (CBOR hex): {}", encode_hex(&bytes)),
            Err(err) => eprintln!("Failed to serialize answers to CBOR: {}", err),
        }
        match answers.to_json_pretty() {
            Ok(pretty) => eprintln!("{}", pretty),
            Err(err) => eprintln!("Failed to serialize answers to JSON: {}", err),
        }
    }
}

fn describe_position(payload: &RenderPayload) -> String {
    match payload.progress {
        Some(progress) => format!(
            "[{}] {}/{}",
            payload.state,
            progress.answered + 1,
            progress.total
        ),
        None => format!("[{}]", payload.state),
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(&mut encoded, "{:02x}", byte).expect("writing to string cannot fail");
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_spec::RenderProgress;

    #[test]
    fn position_counts_from_one() {
        let payload = RenderPayload {
            progress: Some(RenderProgress {
                answered: 0,
                total: 6,
            }),
            ..RenderPayload::prompt("states:register:school_id", "School ID:")
        };
        assert_eq!(
            describe_position(&payload),
            "[states:register:school_id] 1/6"
        );
        assert_eq!(
            describe_position(&RenderPayload::end("states:end", "Bye!")),
            "[states:end]"
        );
    }

    #[test]
    fn hex_is_lowercase_pairs() {
        assert_eq!(encode_hex(&[0x00, 0xa1, 0xff]), "00a1ff");
    }
}
