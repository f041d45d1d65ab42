use std::path::PathBuf;

use shared::{
    domain::{AttachmentSlot, FieldName},
    error::SchemaError,
};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  set <field> <value>     fill a field (name, email, code, phone, address, age,
                          department, designation, placeOfWork)
  attach <slot> <path>    attach a file (image, signature)
  detach <slot>           remove an attachment
  send-otp                email a one-time passcode
  verify                  verify the passcode in the code field
  submit                  submit the form and download user_details.pdf
  status                  show the form
  ok                      close the current message
  help                    show this help
  quit                    exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { field: FieldName, value: String },
    Attach { slot: AttachmentSlot, path: PathBuf },
    Detach { slot: AttachmentSlot },
    SendOtp,
    Verify,
    Submit,
    Status,
    Dismiss,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("nothing to do")]
    Empty,
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let (verb, rest) = split_word(line);
    if verb.is_empty() {
        return Err(CommandError::Empty);
    }

    match verb.to_ascii_lowercase().as_str() {
        "set" => {
            let (field, value) = split_word(rest);
            if field.is_empty() {
                return Err(CommandError::Usage("set <field> <value>"));
            }
            Ok(Command::Set {
                field: field.parse()?,
                value: value.to_string(),
            })
        }
        "attach" => {
            let (slot, path) = split_word(rest);
            if slot.is_empty() || path.is_empty() {
                return Err(CommandError::Usage("attach <image|signature> <path>"));
            }
            Ok(Command::Attach {
                slot: slot.parse()?,
                path: PathBuf::from(path),
            })
        }
        "detach" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("detach <image|signature>"));
            }
            Ok(Command::Detach { slot: rest.parse()? })
        }
        "send-otp" | "send" => Ok(Command::SendOtp),
        "verify" | "verify-otp" => Ok(Command::Verify),
        "submit" => Ok(Command::Submit),
        "status" | "show" => Ok(Command::Status),
        "ok" | "close" | "dismiss" => Ok(Command::Dismiss),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
