//! Line commands typed at the prompt.

use std::path::PathBuf;

use kbdebugger_core::{AppViewModel, Decision, ExportFormat, Msg, TripletField};

pub const HELP: &str = "\
commands:
  keywords                      reload the keyword list
  keyword <name>                browse the subgraph of a keyword
  doc <path>                    run the pipeline on a document
  tab <existing|partial|new>    switch oversight tab
  page <n>                      go to page n of the tab
  toggle <n>                    check or uncheck row n of the page
  all on|off                    check or clear the whole page
  extract                       extract triplets from the selection
  edit <row> <field> <text>     change subject, predicate or object
  delete <row>                  delete or restore a triplet row
  submit                        upsert the reviewed triplets
  node <name>                   look up a graph node
  verify <path>                 legacy three-pane verification
  export json|txt <path>        export the subgraph sentences
  reset                         start over
  help                          show this text
  quit                          leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Keywords,
    Keyword(String),
    Document(PathBuf),
    Tab(Decision),
    Page(usize),
    Toggle(usize),
    SelectAll(bool),
    Extract,
    Edit {
        row: usize,
        field: TripletField,
        value: String,
    },
    Delete(usize),
    Submit,
    Node(String),
    Verify(PathBuf),
    Export {
        format: ExportFormat,
        path: PathBuf,
    },
    Reset,
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "keywords" => Command::Keywords,
        "keyword" => Command::Keyword(required(rest, "keyword <name>")?.to_string()),
        "doc" => Command::Document(PathBuf::from(required(rest, "doc <path>")?)),
        "tab" => Command::Tab(parse_tab(rest)?),
        "page" => Command::Page(parse_index(rest, "page <n>")?),
        "toggle" => Command::Toggle(parse_index(rest, "toggle <n>")?),
        "all" => match rest.to_ascii_lowercase().as_str() {
            "on" => Command::SelectAll(true),
            "off" => Command::SelectAll(false),
            _ => return Err("usage: all on|off".to_string()),
        },
        "extract" => Command::Extract,
        "edit" => parse_edit(rest)?,
        "delete" => Command::Delete(parse_index(rest, "delete <row>")?),
        "submit" => Command::Submit,
        "node" => Command::Node(required(rest, "node <name>")?.to_string()),
        "verify" => Command::Verify(PathBuf::from(required(rest, "verify <path>")?)),
        "export" => parse_export(rest)?,
        "reset" => Command::Reset,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(rest)
    }
}

fn parse_index(rest: &str, usage: &str) -> Result<usize, String> {
    rest.parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| format!("usage: {usage} (n starts at 1)"))
}

fn parse_tab(rest: &str) -> Result<Decision, String> {
    match rest.to_ascii_lowercase().as_str() {
        "existing" => Ok(Decision::Existing),
        "partial" | "partially_new" => Ok(Decision::PartiallyNew),
        "new" => Ok(Decision::New),
        _ => Err("usage: tab <existing|partial|new>".to_string()),
    }
}

fn parse_edit(rest: &str) -> Result<Command, String> {
    const USAGE: &str = "usage: edit <row> <subject|predicate|object> <text>";
    let mut parts = rest.splitn(3, char::is_whitespace);
    let row = parts
        .next()
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .ok_or(USAGE)?;
    let field = parts
        .next()
        .and_then(TripletField::parse)
        .ok_or(USAGE)?;
    let value = parts.next().unwrap_or("").trim().to_string();
    Ok(Command::Edit { row, field, value })
}

fn parse_export(rest: &str) -> Result<Command, String> {
    const USAGE: &str = "usage: export json|txt <path>";
    let (format, path) = rest.split_once(char::is_whitespace).ok_or(USAGE)?;
    let format = match format.to_ascii_lowercase().as_str() {
        "json" => ExportFormat::Json,
        "txt" | "text" => ExportFormat::Text,
        _ => return Err(USAGE.to_string()),
    };
    let path = path.trim();
    if path.is_empty() {
        return Err(USAGE.to_string());
    }
    Ok(Command::Export {
        format,
        path: PathBuf::from(path),
    })
}

impl Command {
    /// Resolves row numbers against what is on screen. `Help` and `Quit` are
    /// handled by the caller and map to `NoOp`.
    pub fn into_msg(self, view: &AppViewModel) -> Result<Msg, String> {
        let msg = match self {
            Command::Keywords => Msg::Started,
            Command::Keyword(name) => Msg::KeywordSelected(name),
            Command::Document(path) => Msg::DocumentChosen(path),
            Command::Tab(decision) => Msg::TabSelected(decision),
            Command::Page(page) => Msg::PageSelected(page),
            Command::Toggle(n) => {
                let row = view
                    .oversight
                    .rows
                    .get(n - 1)
                    .ok_or_else(|| format!("no row {n} on this page"))?;
                Msg::RowToggled {
                    key: row.key.clone(),
                    checked: !row.checked,
                }
            }
            Command::SelectAll(checked) => Msg::SelectAllToggled(checked),
            Command::Extract => Msg::ExtractTripletsClicked,
            Command::Edit { row, field, value } => Msg::TripletEdited {
                row_id: triplet_id(view, row)?,
                field,
                value,
            },
            Command::Delete(row) => Msg::TripletDeleteToggled {
                row_id: triplet_id(view, row)?,
            },
            Command::Submit => Msg::SubmitTripletsClicked,
            Command::Node(name) => Msg::NodeSearchSubmitted(name),
            Command::Verify(path) => Msg::VerifyDocumentClicked(path),
            Command::Export { format, path } => Msg::ExportRequested { format, path },
            Command::Reset => Msg::ResetClicked,
            Command::Help | Command::Quit => Msg::NoOp,
        };
        Ok(msg)
    }
}

fn triplet_id(view: &AppViewModel, row: usize) -> Result<String, String> {
    view.triplets
        .get(row - 1)
        .map(|r| r.id.clone())
        .ok_or_else(|| format!("no triplet row {row}"))
}
