//! Operator keyboard input
//!
//! A reader thread turns stdin lines into [`OperatorInput`] events and sends
//! them over a channel. The control loop drains the channel once per cycle.
//!
//! | Key     | Effect                 |
//! |---------|------------------------|
//! | `1`     | avoidance only         |
//! | `2`     | tracking only          |
//! | `3`     | hybrid (no override)   |
//! | `e`, ␣  | emergency stop         |
//! | `q`     | quit                   |

use sarathi_core::OperatorOverride;
use std::io::BufRead;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorInput {
    /// `None` selects hybrid operation
    SetOverride(Option<OperatorOverride>),
    EmergencyStop,
    Quit,
}

/// Parse one input line. Returns `None` for unrecognised input.
pub fn parse_input(line: &str) -> Option<OperatorInput> {
    let line = line.trim_end_matches(['\r', '\n']);
    if !line.is_empty() && line.trim().is_empty() {
        return Some(OperatorInput::EmergencyStop);
    }
    match line.trim().to_ascii_lowercase().as_str() {
        "1" => Some(OperatorInput::SetOverride(Some(OperatorOverride::AvoidanceOnly))),
        "2" => Some(OperatorInput::SetOverride(Some(OperatorOverride::TrackingOnly))),
        "3" => Some(OperatorInput::SetOverride(None)),
        "e" | "stop" => Some(OperatorInput::EmergencyStop),
        "q" | "quit" => Some(OperatorInput::Quit),
        _ => None,
    }
}

/// Spawn a thread forwarding parsed lines from `reader` to `tx`.
///
/// The thread exits on end of input, on a read error, after forwarding
/// `Quit`, or when the receiver is dropped.
pub fn spawn_reader<R>(reader: R, tx: Sender<OperatorInput>) -> std::io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    std::thread::Builder::new()
        .name("operator-input".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!("Operator input read error: {}", e);
                        break;
                    }
                };
                let Some(input) = parse_input(&line) else {
                    if !line.is_empty() {
                        tracing::warn!("Unknown input {:?} (1/2/3, e or space, q)", line);
                    }
                    continue;
                };
                if tx.send(input).is_err() || input == OperatorInput::Quit {
                    break;
                }
            }
            tracing::debug!("Operator input thread exiting");
        })
}

/// Spawn the reader on the process stdin.
pub fn spawn_stdin_reader(tx: Sender<OperatorInput>) -> std::io::Result<JoinHandle<()>> {
    spawn_reader(std::io::BufReader::new(std::io::stdin()), tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc;

    #[test]
    fn test_parse_keys() {
        assert_eq!(
            parse_input("1"),
            Some(OperatorInput::SetOverride(Some(OperatorOverride::AvoidanceOnly)))
        );
        assert_eq!(
            parse_input("2\n"),
            Some(OperatorInput::SetOverride(Some(OperatorOverride::TrackingOnly)))
        );
        assert_eq!(parse_input("3"), Some(OperatorInput::SetOverride(None)));
        assert_eq!(parse_input(" "), Some(OperatorInput::EmergencyStop));
        assert_eq!(parse_input("E"), Some(OperatorInput::EmergencyStop));
        assert_eq!(parse_input("Q"), Some(OperatorInput::Quit));
        assert_eq!(parse_input(""), None);
        assert_eq!(parse_input("x"), None);
    }

    #[test]
    fn test_reader_forwards_until_quit() {
        let (tx, rx) = mpsc::channel();
        let input = Cursor::new("1\nbogus\n \nq\n3\n");
        spawn_reader(input, tx).unwrap().join().unwrap();

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                OperatorInput::SetOverride(Some(OperatorOverride::AvoidanceOnly)),
                OperatorInput::EmergencyStop,
                OperatorInput::Quit,
            ]
        );
    }
}
