use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::column::Column;
use crate::domain::ViewError;
use crate::filter::FilterKind;
use crate::value::{Row, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    Parquet,
    Arrow,
}

#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
    pub file_type: FileType,
}

/// How loaded columns are configured.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Filter text columns by fuzzy match instead of prefix match.
    pub fuzzy_text: bool,
    /// Keys of columns to load but not render.
    pub hidden: Vec<String>,
}

/// A data file turned into rows and column descriptors, ready for `ViewEngine::reset`.
#[derive(Debug)]
pub struct LoadedTable {
    pub name: String,
    pub file_info: FileInfo,
    pub rows: Vec<Row>,
    pub columns: Vec<Column>,
}

struct ColumnData {
    name: String,
    numeric: bool,
    values: Vec<Value>,
}

pub fn load(path: PathBuf, options: &LoadOptions) -> Result<LoadedTable, ViewError> {
    let file_info = get_file_info(path)?;
    let frame = match file_info.file_type {
        FileType::Csv => load_csv(&file_info.path)?,
        FileType::Parquet => load_parquet(&file_info.path)?,
        FileType::Arrow => load_arrow(&file_info.path)?,
    };

    // Each column is converted in its own rayon task.
    let start_time = Instant::now();
    let df = frame.collect()?;
    let columns: Vec<ColumnData> = df
        .get_column_names()
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect::<Result<_, PolarsError>>()?;

    let rows = transpose(&columns, df.height());
    let columns: Vec<Column> = columns
        .iter()
        .map(|c| describe_column(c, options))
        .collect();

    info!(
        "Loading {} rows x {} columns ({} bytes) took {}ms ...",
        rows.len(),
        columns.len(),
        file_info.file_size,
        start_time.elapsed().as_millis()
    );
    for c in columns.iter() {
        debug!("Column: {c:?}");
    }

    let name = file_info
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();

    Ok(LoadedTable {
        name,
        file_info,
        rows,
        columns,
    })
}

fn transpose(columns: &[ColumnData], height: usize) -> Vec<Row> {
    (0..height)
        .into_par_iter()
        .map(|ridx| {
            columns
                .iter()
                .map(|c| (c.name.clone(), c.values[ridx].clone()))
                .collect::<Row>()
        })
        .collect()
}

fn describe_column(data: &ColumnData, options: &LoadOptions) -> Column {
    let kind = if data.numeric {
        FilterKind::AtLeast
    } else if options.fuzzy_text {
        FilterKind::Fuzzy
    } else {
        FilterKind::StartsWith
    };
    Column::new(data.name.clone())
        .filter(kind)
        .hidden(options.hidden.contains(&data.name))
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<ColumnData, PolarsError> {
    let column = df.column(col_name)?;
    let dtype = column.dtype().clone();
    let numeric = is_numeric_type(&dtype);

    let values: Vec<Value> = if numeric {
        let cast = column.cast(&DataType::Float64)?;
        cast.f64()?.into_iter().map(Value::from).collect()
    } else if dtype == DataType::Boolean {
        column.bool()?.into_iter().map(Value::from).collect()
    } else {
        let cast = column.cast(&DataType::String)?;
        cast.str()?
            .into_iter()
            .map(|value| match value {
                Some(s) => Value::Text(s.replace("\r\n", " ↵ ").replace('\n', " ↵ ")),
                None => Value::Undefined,
            })
            .collect()
    };

    Ok(ColumnData {
        name: col_name.to_string(),
        numeric,
        values,
    })
}

fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

pub fn detect_file_type(path: &Path) -> Result<FileType, ViewError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::Csv),
        Some("PARQUET") | Some("PQ") => Ok(FileType::Parquet),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::Arrow),
        _ => Err(ViewError::UnknownFileType),
    }
}

fn get_file_info(path: PathBuf) -> Result<FileInfo, ViewError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ViewError::FileNotFound,
        ErrorKind::PermissionDenied => ViewError::PermissionDenied,
        _ => ViewError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(ViewError::LoadingFailed("Not a file!".into()));
    }

    let file_type = detect_file_type(&path)?;

    Ok(FileInfo {
        path,
        file_size: metadata.len(),
        file_type,
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}
