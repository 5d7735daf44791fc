//! Manual drive mode
//!
//! Bench test for the actuator link: reads command names or the shortcuts
//! `F`/`L`/`R`/`S` from a reader and dispatches them, `Q` quits.

use crate::error::Result;
use sarathi_core::{ActuatorLink, Command, CommandDispatcher};
use std::io::BufRead;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualInput {
    Drive(Command),
    Quit,
    Invalid(String),
}

pub fn parse_manual(line: &str) -> ManualInput {
    let key = line.trim();
    match key.to_ascii_uppercase().as_str() {
        "F" => ManualInput::Drive(Command::Forward),
        "L" => ManualInput::Drive(Command::Left),
        "R" => ManualInput::Drive(Command::Right),
        "S" => ManualInput::Drive(Command::Stop),
        "Q" | "QUIT" => ManualInput::Quit,
        _ => match key.parse::<Command>() {
            Ok(command) => ManualInput::Drive(command),
            Err(_) => ManualInput::Invalid(key.to_string()),
        },
    }
}

/// Dispatch commands read from `reader` until `Q` or end of input.
/// Returns the number of commands accepted.
pub fn run<R, L>(reader: R, dispatcher: &mut CommandDispatcher<L>) -> Result<usize>
where
    R: BufRead,
    L: ActuatorLink,
{
    info!("Manual mode: F=FORWARD L=LEFT R=RIGHT S=STOP Q=QUIT");
    if !dispatcher.is_connected() {
        warn!("Actuator not connected, running in simulation mode");
    }

    let mut accepted = 0;
    for line in reader.lines() {
        match parse_manual(&line?) {
            ManualInput::Drive(command) => {
                let result = dispatcher.dispatch(command);
                accepted += 1;
                info!(
                    "Sent: {} (accepted: {}, last command: {:?})",
                    command,
                    result.sent,
                    dispatcher.last_sent()
                );
            }
            ManualInput::Quit => {
                info!("Quitting manual mode");
                break;
            }
            ManualInput::Invalid(entry) if entry.is_empty() => {}
            ManualInput::Invalid(entry) => warn!("Invalid command: {:?}", entry),
        }
    }
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sarathi_core::MockLink;
    use std::io::Cursor;

    #[test]
    fn test_parse_shortcuts_and_names() {
        assert_eq!(parse_manual("f"), ManualInput::Drive(Command::Forward));
        assert_eq!(parse_manual(" S "), ManualInput::Drive(Command::Stop));
        assert_eq!(parse_manual("right"), ManualInput::Drive(Command::Right));
        assert_eq!(parse_manual("q"), ManualInput::Quit);
        assert_eq!(
            parse_manual("reverse"),
            ManualInput::Invalid("reverse".to_string())
        );
    }

    #[test]
    fn test_run_dispatches_until_quit() {
        let mut dispatcher = CommandDispatcher::new(MockLink::new());
        let input = Cursor::new("F\nF\nbogus\n\nL\nQ\nR\n");

        let accepted = run(input, &mut dispatcher).unwrap();
        assert_eq!(accepted, 3);
        assert_eq!(dispatcher.link().sent_lines(), vec!["FORWARD", "LEFT"]);
    }
}
