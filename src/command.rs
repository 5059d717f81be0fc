use serde::{Deserialize, Serialize};

use crate::entry::{DateRange, FileKind, SizeBand};
use crate::listing::{SortKey, SortOrder};

/// Every operation the shell, the snapshot executor, and test scripts can
/// issue, with a stable string form for scripting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    // Navigation
    OpenFolder { id: String, name: String },
    GoRoot,
    Refresh,

    // Search overlay
    Query(String),
    ServerSearch(String),
    FilterKind(Option<FileKind>),
    FilterSize(SizeBand),
    FilterDate(DateRange),
    FilterExtension(Option<String>),
    ClearSearch,

    // Display order
    SortBy(SortKey),
    OrderBy(SortOrder),

    // Content mutations
    CreateFolder(String),
    Rename { id: String, name: String },
    Delete(String),

    Quit,

    // Multi-step commands for testing
    Sequence(Vec<Command>),
}

impl Command {
    /// Parse a command from its string representation.
    pub fn from_string(s: &str) -> Result<Self, String> {
        match s {
            "root" | "home" => return Ok(Command::GoRoot),
            "refresh" | "reload" => return Ok(Command::Refresh),
            "clear" => return Ok(Command::ClearSearch),
            "quit" | "q" => return Ok(Command::Quit),
            _ => {}
        }

        if let Some(rest) = s.strip_prefix("open:") {
            let (id, name) = rest
                .split_once(':')
                .ok_or_else(|| format!("open needs id and name: {}", s))?;
            if id.is_empty() || name.is_empty() {
                return Err(format!("open needs id and name: {}", s));
            }
            return Ok(Command::OpenFolder {
                id: id.to_string(),
                name: name.to_string(),
            });
        }

        if let Some(query) = s.strip_prefix("query:") {
            return Ok(Command::Query(query.to_string()));
        }

        if let Some(query) = s.strip_prefix("search:") {
            return Ok(Command::ServerSearch(query.to_string()));
        }

        if let Some(rest) = s.strip_prefix("filter:") {
            let (field, value) = rest
                .split_once(':')
                .ok_or_else(|| format!("filter needs field and value: {}", s))?;
            return match field {
                "type" => match value {
                    "all" => Ok(Command::FilterKind(None)),
                    _ => FileKind::from_label(value)
                        .map(|kind| Command::FilterKind(Some(kind)))
                        .ok_or_else(|| format!("unknown file type: {}", value)),
                },
                "size" => SizeBand::from_label(value)
                    .map(Command::FilterSize)
                    .ok_or_else(|| format!("unknown size band: {}", value)),
                "date" => DateRange::from_label(value)
                    .map(Command::FilterDate)
                    .ok_or_else(|| format!("unknown date range: {}", value)),
                "ext" => match value {
                    "any" => Ok(Command::FilterExtension(None)),
                    _ => Ok(Command::FilterExtension(Some(value.to_string()))),
                },
                _ => Err(format!("unknown filter field: {}", field)),
            };
        }

        if let Some(key) = s.strip_prefix("sort:") {
            return SortKey::from_label(key)
                .map(Command::SortBy)
                .ok_or_else(|| format!("unknown sort key: {}", key));
        }

        if let Some(order) = s.strip_prefix("order:") {
            return SortOrder::from_label(order)
                .map(Command::OrderBy)
                .ok_or_else(|| format!("unknown sort order: {}", order));
        }

        if let Some(name) = s.strip_prefix("mkdir:") {
            if name.is_empty() {
                return Err("mkdir needs a folder name".to_string());
            }
            return Ok(Command::CreateFolder(name.to_string()));
        }

        if let Some(rest) = s.strip_prefix("rename:") {
            let (id, name) = rest
                .split_once(':')
                .ok_or_else(|| format!("rename needs id and name: {}", s))?;
            return Ok(Command::Rename {
                id: id.to_string(),
                name: name.to_string(),
            });
        }

        if let Some(id) = s.strip_prefix("delete:") {
            if id.is_empty() {
                return Err("delete needs an item id".to_string());
            }
            return Ok(Command::Delete(id.to_string()));
        }

        if s.starts_with("sequence:[") && s.ends_with(']') {
            // sequence:[cmd1,cmd2,cmd3]. Commands containing commas are not
            // representable inside a sequence.
            let inner = &s["sequence:[".len()..s.len() - 1];
            if inner.is_empty() {
                return Ok(Command::Sequence(Vec::new()));
            }
            let mut commands = Vec::new();
            for part in inner.split(',') {
                let part = part.trim();
                match Command::from_string(part) {
                    Ok(command) => commands.push(command),
                    Err(e) => return Err(format!("invalid command in sequence '{}': {}", part, e)),
                }
            }
            return Ok(Command::Sequence(commands));
        }

        Err(format!("unknown command: {}", s))
    }

    /// Inverse of [`from_string`](Self::from_string).
    pub fn as_string(&self) -> String {
        match self {
            Command::OpenFolder { id, name } => format!("open:{}:{}", id, name),
            Command::GoRoot => "root".to_string(),
            Command::Refresh => "refresh".to_string(),
            Command::Query(query) => format!("query:{}", query),
            Command::ServerSearch(query) => format!("search:{}", query),
            Command::FilterKind(None) => "filter:type:all".to_string(),
            Command::FilterKind(Some(kind)) => format!("filter:type:{}", kind.label()),
            Command::FilterSize(band) => {
                let label = match band {
                    SizeBand::Any => "any",
                    SizeBand::Small => "small",
                    SizeBand::Medium => "medium",
                    SizeBand::Large => "large",
                };
                format!("filter:size:{}", label)
            }
            Command::FilterDate(range) => {
                let label = match range {
                    DateRange::Any => "any",
                    DateRange::Today => "today",
                    DateRange::Week => "week",
                    DateRange::Month => "month",
                };
                format!("filter:date:{}", label)
            }
            Command::FilterExtension(None) => "filter:ext:any".to_string(),
            Command::FilterExtension(Some(ext)) => format!("filter:ext:{}", ext),
            Command::ClearSearch => "clear".to_string(),
            Command::SortBy(key) => {
                let label = match key {
                    SortKey::Name => "name",
                    SortKey::Date => "date",
                    SortKey::Size => "size",
                };
                format!("sort:{}", label)
            }
            Command::OrderBy(order) => {
                let label = match order {
                    SortOrder::Asc => "asc",
                    SortOrder::Desc => "desc",
                };
                format!("order:{}", label)
            }
            Command::CreateFolder(name) => format!("mkdir:{}", name),
            Command::Rename { id, name } => format!("rename:{}:{}", id, name),
            Command::Delete(id) => format!("delete:{}", id),
            Command::Quit => "quit".to_string(),
            Command::Sequence(commands) => format!(
                "sequence:[{}]",
                commands
                    .iter()
                    .map(|c| c.as_string())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::from_string("root").unwrap(), Command::GoRoot);
        assert_eq!(Command::from_string("refresh").unwrap(), Command::Refresh);
        assert_eq!(
            Command::from_string("open:A:Docs").unwrap(),
            Command::OpenFolder {
                id: "A".to_string(),
                name: "Docs".to_string()
            }
        );
        assert_eq!(
            Command::from_string("query:invoice jan").unwrap(),
            Command::Query("invoice jan".to_string())
        );
        assert_eq!(
            Command::from_string("filter:type:image").unwrap(),
            Command::FilterKind(Some(FileKind::Image))
        );
        assert_eq!(
            Command::from_string("filter:size:large").unwrap(),
            Command::FilterSize(SizeBand::Large)
        );
        assert_eq!(
            Command::from_string("filter:ext:any").unwrap(),
            Command::FilterExtension(None)
        );
        assert_eq!(
            Command::from_string("sort:size").unwrap(),
            Command::SortBy(SortKey::Size)
        );

        assert!(Command::from_string("invalid").is_err());
        assert!(Command::from_string("").is_err());
        assert!(Command::from_string("open:A").is_err());
        assert!(Command::from_string("filter:type:spreadsheet").is_err());
    }

    #[test]
    fn test_sequence_parsing() {
        let parsed = Command::from_string("sequence:[open:A:Docs, query:report, clear]").unwrap();
        assert_eq!(
            parsed,
            Command::Sequence(vec![
                Command::OpenFolder {
                    id: "A".to_string(),
                    name: "Docs".to_string()
                },
                Command::Query("report".to_string()),
                Command::ClearSearch,
            ])
        );

        assert_eq!(
            Command::from_string("sequence:[]").unwrap(),
            Command::Sequence(Vec::new())
        );
        assert!(Command::from_string("sequence:[bogus]").is_err());
    }

    #[test]
    fn test_round_trip() {
        let commands = vec![
            "open:A:Docs",
            "root",
            "query:report",
            "search:report",
            "filter:type:audio",
            "filter:date:week",
            "sort:date",
            "order:desc",
            "mkdir:New Folder",
            "rename:f1:renamed.pdf",
            "delete:f1",
            "clear",
            "quit",
        ];
        for text in commands {
            let command = Command::from_string(text).unwrap();
            assert_eq!(command.as_string(), text);
        }
    }
}
