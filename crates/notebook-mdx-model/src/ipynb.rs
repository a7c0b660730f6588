use crate::error::{NotebookError, Result};
use log::debug;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// MIME bundle of a rich output: MIME type -> payload.
///
/// Keys iterate in lexicographic order, which keeps any "first other key"
/// choice deterministic.
pub type MimeBundle = Map<String, Value>;

/// Parsed Jupyter Notebook document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotebookDocument {
    /// Major format version (`nbformat`)
    pub nbformat: u32,
    /// Minor format version (`nbformat_minor`)
    pub nbformat_minor: u32,
    /// Notebook-level metadata
    pub metadata: NotebookMetadata,
    /// Cells in narrative order
    pub cells: Vec<Cell>,
}

/// Notebook-level metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotebookMetadata {
    /// Kernel name (e.g., "python3", "ir")
    pub kernel_name: Option<String>,
    /// Kernel display name (e.g., "Python 3")
    pub kernel_display_name: Option<String>,
    /// Default cell language: `kernelspec.language`, else `language_info.name`
    pub kernel_language: Option<String>,
    /// Every other metadata entry, kept as-is
    pub extra: Map<String, Value>,
}

/// Type of notebook cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// Executable code cell
    Code,
    /// Markdown documentation cell
    Markdown,
    /// Raw text cell (no formatting)
    Raw,
}

impl std::fmt::Display for CellKind {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Code => "code",
            Self::Markdown => "markdown",
            Self::Raw => "raw",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for CellKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "code" => Ok(Self::Code),
            "markdown" => Ok(Self::Markdown),
            "raw" => Ok(Self::Raw),
            _ => Err(format!(
                "Unknown cell type '{s}'. Expected: code, markdown, raw"
            )),
        }
    }
}

/// Cell metadata, read only for language hints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellMetadata(pub Map<String, Value>);

impl CellMetadata {
    /// Language hint with precedence `vscode.languageId`, then `languageId`,
    /// then `language`. Empty strings are ignored.
    #[must_use]
    pub fn language_hint(&self) -> Option<&str> {
        let vscode = self
            .0
            .get("vscode")
            .and_then(|v| v.get("languageId"))
            .and_then(Value::as_str);

        vscode
            .filter(|s| !s.is_empty())
            .or_else(|| self.non_empty_str("languageId"))
            .or_else(|| self.non_empty_str("language"))
    }

    /// Raw access to a metadata entry
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn non_empty_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Markdown or raw cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextCell {
    /// Unique cell identifier (nbformat 4.5+)
    pub id: Option<String>,
    /// Joined cell source
    pub source: String,
    /// Cell metadata
    pub metadata: CellMetadata,
}

/// Code cell with its outputs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeCell {
    /// Unique cell identifier (nbformat 4.5+)
    pub id: Option<String>,
    /// Joined cell source
    pub source: String,
    /// Cell metadata
    pub metadata: CellMetadata,
    /// Execution count; `None` when the cell was never run
    pub execution_count: Option<i64>,
    /// Outputs in emission order
    pub outputs: Vec<Output>,
}

/// One notebook cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Markdown(TextCell),
    Code(CodeCell),
    Raw(TextCell),
    /// Any record whose `cell_type` is not recognized (or is not an object)
    Unknown {
        /// The `cell_type` value as found, empty when absent
        cell_type: String,
    },
}

impl Cell {
    /// Cell kind, `None` for unknown cells
    #[must_use]
    pub const fn kind(&self) -> Option<CellKind> {
        match self {
            Self::Markdown(_) => Some(CellKind::Markdown),
            Self::Code(_) => Some(CellKind::Code),
            Self::Raw(_) => Some(CellKind::Raw),
            Self::Unknown { .. } => None,
        }
    }

    /// Joined source text, `None` for unknown cells
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Markdown(cell) | Self::Raw(cell) => Some(cell.source.as_str()),
            Self::Code(cell) => Some(cell.source.as_str()),
            Self::Unknown { .. } => None,
        }
    }

    /// Cell metadata, `None` for unknown cells
    #[must_use]
    pub const fn metadata(&self) -> Option<&CellMetadata> {
        match self {
            Self::Markdown(cell) | Self::Raw(cell) => Some(&cell.metadata),
            Self::Code(cell) => Some(&cell.metadata),
            Self::Unknown { .. } => None,
        }
    }
}

/// Type of cell output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Stream output (stdout/stderr)
    Stream,
    /// Rich display data (images, HTML, etc.)
    DisplayData,
    /// Result of code execution
    ExecuteResult,
    /// Error traceback
    Error,
}

impl std::fmt::Display for OutputKind {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Stream => "stream",
            Self::DisplayData => "display_data",
            Self::ExecuteResult => "execute_result",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "stream" => Ok(Self::Stream),
            "display_data" => Ok(Self::DisplayData),
            "execute_result" => Ok(Self::ExecuteResult),
            "error" => Ok(Self::Error),
            _ => Err(format!(
                "Unknown output type '{s}'. Expected: stream, display_data, execute_result, error"
            )),
        }
    }
}

/// Name of the stream a `stream` output was written to
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum StreamName {
    #[default]
    Stdout,
    Stderr,
    Other(String),
}

impl StreamName {
    fn from_field(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            None | Some("stdout") => Self::Stdout,
            Some("stderr") => Self::Stderr,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

/// `stream` output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamOutput {
    pub name: StreamName,
    /// Joined stream text
    pub text: String,
}

/// Payload shared by `display_data` and `execute_result`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichOutput {
    /// MIME type -> payload
    pub data: MimeBundle,
    /// MIME type -> render hints (e.g. `width`, `height`)
    pub metadata: Map<String, Value>,
}

/// `execute_result` output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteResult {
    /// The output's own execution count (not the cell's)
    pub execution_count: Option<i64>,
    pub rich: RichOutput,
}

/// `error` output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorOutput {
    pub ename: String,
    pub evalue: String,
    /// One entry per frame
    pub traceback: Vec<String>,
}

/// One cell output
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Stream(StreamOutput),
    DisplayData(RichOutput),
    ExecuteResult(ExecuteResult),
    Error(ErrorOutput),
    /// Any record whose `output_type` is not recognized (or is not an object)
    Unknown {
        /// The `output_type` value as found, empty when absent
        output_type: String,
    },
}

impl Output {
    /// Output kind, `None` for unknown outputs
    #[must_use]
    pub const fn kind(&self) -> Option<OutputKind> {
        match self {
            Self::Stream(_) => Some(OutputKind::Stream),
            Self::DisplayData(_) => Some(OutputKind::DisplayData),
            Self::ExecuteResult(_) => Some(OutputKind::ExecuteResult),
            Self::Error(_) => Some(OutputKind::Error),
            Self::Unknown { .. } => None,
        }
    }
}

/// Join a notebook "multiline string": either a single string or a sequence
/// of line strings concatenated as-is (lines carry their own `\n`).
///
/// Non-string entries of a sequence are skipped. Returns `None` for any other
/// JSON type.
///
/// # Examples
///
/// ```
/// use notebook_mdx_model::join_multiline;
/// use serde_json::json;
///
/// assert_eq!(join_multiline(&json!(["a\n", "b\n"])).as_deref(), Some("a\nb\n"));
/// assert_eq!(join_multiline(&json!("x")).as_deref(), Some("x"));
/// assert_eq!(join_multiline(&json!(3)), None);
/// ```
#[must_use]
pub fn join_multiline(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(lines) => Some(lines.iter().filter_map(Value::as_str).collect()),
        _ => None,
    }
}

/// Parse a Jupyter Notebook from a file path
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read (I/O error)
/// - The notebook JSON is malformed
/// - `cells` is missing or not an array
#[must_use = "this function returns a parsed notebook that should be processed"]
pub fn parse_notebook<P: AsRef<Path>>(path: P) -> Result<NotebookDocument> {
    let content = fs::read_to_string(path)?;
    parse_notebook_from_str(&content)
}

/// Parse a Jupyter Notebook from a string
///
/// # Errors
///
/// Returns [`NotebookError::ParseError`] if the text is not JSON (including
/// empty input) and [`NotebookError::ValidationError`] if it is not shaped
/// like a notebook.
#[must_use = "this function returns a parsed notebook that should be processed"]
pub fn parse_notebook_from_str(content: &str) -> Result<NotebookDocument> {
    let value: Value = serde_json::from_str(content)?;
    parse_notebook_value(&value)
}

/// Build a notebook from an already-parsed JSON value
///
/// # Errors
///
/// Returns [`NotebookError::ValidationError`] if `value` is not an object or
/// its `cells` field is missing or not an array.
#[must_use = "this function returns a parsed notebook that should be processed"]
pub fn parse_notebook_value(value: &Value) -> Result<NotebookDocument> {
    let root = value.as_object().ok_or_else(|| {
        NotebookError::ValidationError(format!(
            "expected a JSON object at the top level, found {}",
            json_type_name(value)
        ))
    })?;

    let cells = match root.get("cells") {
        None => {
            return Err(NotebookError::ValidationError(
                "missing `cells` field".to_string(),
            ))
        }
        Some(Value::Array(cells)) => cells,
        Some(other) => {
            return Err(NotebookError::ValidationError(format!(
                "`cells` must be an array, found {}",
                json_type_name(other)
            )))
        }
    };

    let metadata = extract_metadata(root.get("metadata"));
    let cells: Vec<Cell> = cells.iter().map(extract_cell).collect();

    debug!(
        "parsed notebook: {} cells, kernel language {:?}",
        cells.len(),
        metadata.kernel_language
    );

    Ok(NotebookDocument {
        nbformat: read_u32(root.get("nbformat")),
        nbformat_minor: read_u32(root.get("nbformat_minor")),
        metadata,
        cells,
    })
}

/// Extract notebook metadata
fn extract_metadata(value: Option<&Value>) -> NotebookMetadata {
    let Some(map) = value.and_then(Value::as_object) else {
        return NotebookMetadata::default();
    };

    let kernelspec = map.get("kernelspec");
    let kernel_field = |field: &str| {
        kernelspec
            .and_then(|ks| ks.get(field))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    let language_info_name = map
        .get("language_info")
        .and_then(|li| li.get("name"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let extra = map
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "kernelspec" | "language_info"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    NotebookMetadata {
        kernel_name: kernel_field("name"),
        kernel_display_name: kernel_field("display_name"),
        kernel_language: kernel_field("language").or(language_info_name),
        extra,
    }
}

/// Extract one cell record
fn extract_cell(value: &Value) -> Cell {
    let Some(map) = value.as_object() else {
        return Cell::Unknown {
            cell_type: String::new(),
        };
    };

    let cell_type = map.get("cell_type").and_then(Value::as_str).unwrap_or("");
    let id = map.get("id").and_then(Value::as_str).map(String::from);
    let source = map.get("source").and_then(join_multiline).unwrap_or_default();
    let metadata = CellMetadata(
        map.get("metadata")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
    );

    match cell_type.parse::<CellKind>() {
        Ok(CellKind::Markdown) => Cell::Markdown(TextCell {
            id,
            source,
            metadata,
        }),
        Ok(CellKind::Raw) => Cell::Raw(TextCell {
            id,
            source,
            metadata,
        }),
        Ok(CellKind::Code) => Cell::Code(CodeCell {
            id,
            source,
            metadata,
            execution_count: read_count(map.get("execution_count")),
            outputs: map
                .get("outputs")
                .and_then(Value::as_array)
                .map(|outputs| outputs.iter().map(extract_output).collect())
                .unwrap_or_default(),
        }),
        Err(_) => Cell::Unknown {
            cell_type: cell_type.to_string(),
        },
    }
}

/// Extract one output record
fn extract_output(value: &Value) -> Output {
    let Some(map) = value.as_object() else {
        return Output::Unknown {
            output_type: String::new(),
        };
    };

    let output_type = map.get("output_type").and_then(Value::as_str).unwrap_or("");

    match output_type.parse::<OutputKind>() {
        Ok(OutputKind::Stream) => Output::Stream(StreamOutput {
            name: StreamName::from_field(map.get("name")),
            text: map.get("text").and_then(join_multiline).unwrap_or_default(),
        }),
        Ok(OutputKind::DisplayData) => Output::DisplayData(extract_rich(map)),
        Ok(OutputKind::ExecuteResult) => Output::ExecuteResult(ExecuteResult {
            execution_count: read_count(map.get("execution_count")),
            rich: extract_rich(map),
        }),
        Ok(OutputKind::Error) => Output::Error(ErrorOutput {
            ename: read_string(map.get("ename")),
            evalue: read_string(map.get("evalue")),
            traceback: map
                .get("traceback")
                .and_then(Value::as_array)
                .map(|frames| {
                    frames
                        .iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        }),
        Err(_) => Output::Unknown {
            output_type: output_type.to_string(),
        },
    }
}

fn extract_rich(map: &Map<String, Value>) -> RichOutput {
    let object = |key: &str| {
        map.get(key)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    };
    RichOutput {
        data: object("data"),
        metadata: object("metadata"),
    }
}

/// Execution counts are integers, but some writers emit `3.0`
fn read_count(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

fn read_u32(value: Option<&Value>) -> u32 {
    value
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or_default()
}

fn read_string(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
