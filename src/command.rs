use crate::{errors::command_error::CommandError, session::ClientSession};
use std::net::SocketAddr;

/// One decoded client request, plus the two internal lifecycle events the
/// router also consumes. Sessions are owned by the router's registry; a
/// command only refers to its originator by socket address, so a command
/// whose session has already been removed is harmless.
#[derive(Debug)]
pub enum Command {
    Join {
        addr: SocketAddr,
        session: ClientSession,
    },
    ListUsers {
        addr: SocketAddr,
    },
    SendMessage {
        addr: SocketAddr,
        args: Vec<String>,
    },
    Quit {
        addr: SocketAddr,
    },
    Disconnect {
        addr: SocketAddr,
    },
}

/// Decodes one input line. The first whitespace-separated token selects the
/// command; everything after it is kept as argument tokens.
pub fn decode(addr: SocketAddr, line: &str) -> Result<Command, CommandError> {
    let mut tokens = line.trim().split_whitespace();
    let keyword = tokens.next().unwrap_or("");

    match keyword {
        "/users" => Ok(Command::ListUsers { addr }),
        "/msg" => Ok(Command::SendMessage {
            addr,
            args: tokens.map(str::to_string).collect(),
        }),
        "/quit" => Ok(Command::Quit { addr }),
        _ => Err(CommandError::UnknownCommand(keyword.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:4000".parse().unwrap()
    }

    #[test]
    fn decodes_users() {
        assert!(matches!(
            decode(addr(), "/users"),
            Ok(Command::ListUsers { .. })
        ));
    }

    #[test]
    fn decodes_msg_with_argument_tokens() {
        let Ok(Command::SendMessage { args, .. }) = decode(addr(), "/msg  hello   world\r")
        else {
            panic!("expected SendMessage");
        };

        assert_eq!(args, vec!["hello", "world"]);
    }

    #[test]
    fn decodes_quit() {
        assert!(matches!(decode(addr(), "/quit\r"), Ok(Command::Quit { .. })));
    }

    #[test]
    fn rejects_unknown_keyword() {
        let Err(error) = decode(addr(), "/foo bar") else {
            panic!("expected an error");
        };

        assert_eq!(error.to_string(), "unknown command /foo");
    }

    #[test]
    fn rejects_empty_line() {
        let Err(error) = decode(addr(), "") else {
            panic!("expected an error");
        };

        assert_eq!(error, CommandError::UnknownCommand(String::new()));
    }
}
