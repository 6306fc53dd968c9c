use crate::models::display::{DisplayEntry, ViewModel};
use crate::scope_path::base_name;

pub const HELP: &str = "\
commands:
  add <folder>       register a folder and scan it
  remove <folder>    forget a folder
  refresh            rescan every registered folder now
  search [term]      filter by file name; no term clears the filter
  toggle <row|path>  expand or collapse a folder
  select <row>       preview a file (or toggle a folder)
  open <row>         open a file with the default application
  list               print the current view
  help               show this text
  quit               exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Row(usize),
    Folder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Add(String),
    Remove(String),
    Refresh,
    Search(String),
    Toggle(Target),
    Select(usize),
    Open(usize),
    List,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

fn parse_row(arg: &str, verb: &str) -> Result<usize, ConsoleCommand> {
    arg.parse::<usize>()
        .map_err(|_| ConsoleCommand::Invalid(format!("{verb} expects a row number, got {arg:?}")))
}

pub fn parse(line: &str) -> ConsoleCommand {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleCommand::Empty;
    }
    let (verb, arg) = match line.split_once(char::is_whitespace) {
        Some((verb, arg)) => (verb, arg.trim()),
        None => (line, ""),
    };

    match (verb.to_ascii_lowercase().as_str(), arg) {
        ("add", "") | ("remove", "") => ConsoleCommand::Invalid(format!("{verb} expects a folder")),
        ("add", folder) => ConsoleCommand::Add(folder.to_string()),
        ("remove", folder) => ConsoleCommand::Remove(folder.to_string()),
        ("refresh", _) => ConsoleCommand::Refresh,
        ("search", term) => ConsoleCommand::Search(term.to_string()),
        ("toggle", "") => ConsoleCommand::Invalid("toggle expects a row or folder".to_string()),
        ("toggle", target) => match target.parse::<usize>() {
            Ok(row) => ConsoleCommand::Toggle(Target::Row(row)),
            Err(_) => ConsoleCommand::Toggle(Target::Folder(target.to_string())),
        },
        ("select", row) => parse_row(row, "select").map_or_else(|e| e, ConsoleCommand::Select),
        ("open", row) => parse_row(row, "open").map_or_else(|e| e, ConsoleCommand::Open),
        ("list", _) => ConsoleCommand::List,
        ("help", _) | ("?", _) => ConsoleCommand::Help,
        ("quit", _) | ("exit", _) => ConsoleCommand::Quit,
        _ => ConsoleCommand::Invalid(format!("unknown command: {verb} (try `help`)")),
    }
}

/// Text rows for a view, numbered so commands can refer to them.
pub fn render(view: &ViewModel) -> Vec<String> {
    view.entries
        .iter()
        .enumerate()
        .map(|(row, entry)| {
            let marker = if view.auto_select == Some(row) { '>' } else { ' ' };
            match entry {
                DisplayEntry::FolderHeader {
                    path,
                    expanded,
                    matched_in_search,
                } => {
                    let icon = if *matched_in_search {
                        "🔍"
                    } else if *expanded {
                        "➖"
                    } else {
                        "➕"
                    };
                    format!("{marker}{row:>4}  {icon} 📁 {path}")
                }
                DisplayEntry::FileEntry { path } => {
                    format!("{marker}{row:>4}      📄 {}", base_name(path))
                }
                DisplayEntry::Separator => String::new(),
            }
        })
        .collect()
}
