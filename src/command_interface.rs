//! Chat-style command front end.
//!
//! Thin adapter between one-line user commands and the lifecycle manager:
//! parsing on the way in, rendering of the manager's structured outcomes on
//! the way out. The manager itself never formats presentation text.

use std::fmt;

use crate::error_handling::types::ManagerError;
use crate::host_metrics::HostUsage;
use crate::instance_management::InstanceView;

pub const HELP_TEXT: &str = "\
commands:
  create <ram_gb> <cpu_cores> <disk_gb>   provision a new instance
  list                                    show all instances
  status <name>                           show one instance
  stop <name>                             stop an instance
  delete <name>                           delete an instance
  refresh <name>                          refresh the remote-shell session
  resources                               show host resource usage
  help                                    show this help
  quit                                    exit";

/// A parsed user command.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Command {
    Create {
        ram_gb: u64,
        cpu_cores: u64,
        disk_gb: u64,
    },
    List,
    Status { name: String },
    Stop { name: String },
    Delete { name: String },
    Refresh { name: String },
    Resources,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    UnknownCommand(String),
    BadArguments(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty command"),
            ParseError::UnknownCommand(cmd) => write!(f, "unknown command: {}", cmd),
            ParseError::BadArguments(usage) => write!(f, "bad arguments, usage: {}", usage),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses one input line into a command.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let mut parts = line.split_whitespace();
    let keyword = parts.next().ok_or(ParseError::Empty)?;
    let args: Vec<&str> = parts.collect();

    match keyword {
        "create" => {
            if args.len() != 3 {
                return Err(ParseError::BadArguments(String::from(
                    "create <ram_gb> <cpu_cores> <disk_gb>",
                )));
            }
            let numbers: Result<Vec<u64>, _> = args.iter().map(|a| a.parse::<u64>()).collect();
            match numbers {
                Ok(numbers) => Ok(Command::Create {
                    ram_gb: numbers[0],
                    cpu_cores: numbers[1],
                    disk_gb: numbers[2],
                }),
                Err(_) => Err(ParseError::BadArguments(String::from(
                    "create <ram_gb> <cpu_cores> <disk_gb>",
                ))),
            }
        }
        "list" => Ok(Command::List),
        "status" => named(args, "status <name>", |name| Command::Status { name }),
        "stop" => named(args, "stop <name>", |name| Command::Stop { name }),
        "delete" => named(args, "delete <name>", |name| Command::Delete { name }),
        "refresh" => named(args, "refresh <name>", |name| Command::Refresh { name }),
        "resources" => Ok(Command::Resources),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

fn named(
    args: Vec<&str>,
    usage: &str,
    build: impl FnOnce(String) -> Command,
) -> Result<Command, ParseError> {
    if args.len() != 1 {
        return Err(ParseError::BadArguments(usage.to_string()));
    }
    Ok(build(args[0].to_string()))
}

/// Renders one instance snapshot.
pub fn render_view(view: &InstanceView) -> String {
    let session = view.session.as_deref().unwrap_or("(not established)");
    format!(
        "{}  [{}]\n  ram: {} GB, cpu: {} cores, disk: {} GB\n  session: {}\n  created: {}",
        view.name,
        view.state,
        view.resources.ram_gb,
        view.resources.cpu_cores,
        view.resources.disk_gb,
        session,
        view.created_at.to_rfc3339(),
    )
}

/// Renders the instance listing.
pub fn render_list(views: &[InstanceView]) -> String {
    if views.is_empty() {
        return String::from("no instances");
    }
    views
        .iter()
        .map(render_view)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders a manager error for the user.
pub fn render_error(error: &ManagerError) -> String {
    format!("error: {}", error)
}

/// Renders the host usage snapshot.
pub fn render_host_usage(usage: &HostUsage) -> String {
    format!(
        "ram: {:.2}/{:.2} GB used\ncpu: {} cores, {:.1}% busy\ndisk: {:.2}/{:.2} GB used",
        usage.used_ram_gb,
        usage.total_ram_gb,
        usage.cpu_cores,
        usage.cpu_usage_percent,
        usage.disk_used_gb,
        usage.disk_total_gb,
    )
}
