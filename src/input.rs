use crate::messages::UserCommand;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

pub const HELP: &str = "\
Commands:
  r, record      start recording
  s, stop        stop recording
  p, play        play the last recording
  x, stop-play   stop playback
  h, help        show this help
  q, quit        exit";

/// Read stdin line by line and forward each line on the returned channel.
///
/// The same stream serves the permission prompt and then the command loop, so
/// there is exactly one reader on stdin. The channel closes at end of input.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    tracing::debug!("stdin closed");
                    break;
                }
                Err(e) => {
                    tracing::warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

/// Map one line of input to a trigger. Blank lines yield nothing.
pub fn parse_command(line: &str) -> Option<UserCommand> {
    let command = match line.trim().to_lowercase().as_str() {
        "" => return None,
        "r" | "record" => UserCommand::StartRecording,
        "s" | "stop" => UserCommand::StopRecording,
        "p" | "play" => UserCommand::StartPlayback,
        "x" | "stop-play" => UserCommand::StopPlayback,
        "q" | "quit" | "exit" => UserCommand::Quit,
        _ => UserCommand::Help,
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("r"), Some(UserCommand::StartRecording));
        assert_eq!(parse_command(" Record \n"), Some(UserCommand::StartRecording));
        assert_eq!(parse_command("s"), Some(UserCommand::StopRecording));
        assert_eq!(parse_command("play"), Some(UserCommand::StartPlayback));
        assert_eq!(parse_command("stop-play"), Some(UserCommand::StopPlayback));
        assert_eq!(parse_command("q"), Some(UserCommand::Quit));
    }

    #[test]
    fn test_unknown_input_shows_help() {
        assert_eq!(parse_command("dance"), Some(UserCommand::Help));
        assert_eq!(parse_command("h"), Some(UserCommand::Help));
        assert_eq!(parse_command("   "), None);
    }
}
