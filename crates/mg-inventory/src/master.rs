//! Master inventory CSV reading.
//!
//! The master inventory lists files found under several scan roots with the
//! columns in [`MASTER_COLUMNS`]. When the first record names those columns
//! (any order, any case) they are mapped by name; otherwise every record,
//! including the first, is read positionally. Records with missing columns or
//! a non-numeric size are skipped.

use std::io::Read;

use camino::Utf8Path;
use mg_core::MasterDedupRow;
use tracing::debug;

use crate::error::InventoryError;

/// Expected column names, in positional order.
pub const MASTER_COLUMNS: [&str; 7] = ["root", "abs_path", "rel_path", "base_name", "ext", "size", "mtime"];

/// Column indices for the seven master fields.
type ColumnMap = [usize; 7];

const POSITIONAL: ColumnMap = [0, 1, 2, 3, 4, 5, 6];

/// Reads master inventory rows from any reader.
///
/// # Errors
///
/// Returns [`InventoryError::Csv`] only when the underlying reader fails.
/// Malformed records are skipped.
///
/// # Examples
///
/// ```
/// use mg_inventory::read_master_csv;
///
/// let csv = "\
/// root,abs_path,rel_path,base_name,ext,size,mtime
/// A,/a/src/App.js,src/App.js,App.js,.js,120,1700000000
/// B,/b/src/App.js,src/App.js,App.js,.js,not-a-size,1700000000
/// ";
/// let rows = read_master_csv(csv.as_bytes()).unwrap();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].root, "A");
/// ```
pub fn read_master_csv<R: Read>(reader: R) -> Result<Vec<MasterDedupRow>, InventoryError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut columns: Option<ColumnMap> = None;
    let mut skipped = 0usize;

    for (index, record) in csv_reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                debug!(record = index, error = %err, "Skipping unreadable master row");
                skipped += 1;
                continue;
            }
        };

        if index == 0 {
            if let Some(map) = header_map(&record) {
                columns = Some(map);
                continue;
            }
        }

        match row_from_record(&record, columns.as_ref().unwrap_or(&POSITIONAL)) {
            Some(row) => rows.push(row),
            None => skipped += 1,
        }
    }

    debug!(rows = rows.len(), skipped, "Read master inventory");
    Ok(rows)
}

/// Reads master inventory rows from a file.
///
/// # Errors
///
/// Returns [`InventoryError::Read`] if the file cannot be opened.
pub fn read_master_csv_path(path: &Utf8Path) -> Result<Vec<MasterDedupRow>, InventoryError> {
    let file = std::fs::File::open(path).map_err(|source| InventoryError::read(path, source))?;
    read_master_csv(file)
}

/// Maps column names to indices when `record` is a complete header row.
fn header_map(record: &csv::StringRecord) -> Option<ColumnMap> {
    let mut map = POSITIONAL;
    for (slot, name) in map.iter_mut().zip(MASTER_COLUMNS) {
        *slot = record
            .iter()
            .position(|field| field.eq_ignore_ascii_case(name))?;
    }
    Some(map)
}

fn row_from_record(record: &csv::StringRecord, columns: &ColumnMap) -> Option<MasterDedupRow> {
    let field = |slot: usize| record.get(columns[slot]);

    let root = field(0)?;
    let abs_path = field(1)?;
    let rel_path = field(2)?;
    let size = field(5)?.parse::<u64>().ok()?;
    if root.is_empty() || abs_path.is_empty() || rel_path.is_empty() {
        return None;
    }

    Some(MasterDedupRow {
        root: root.to_owned(),
        abs_path: abs_path.into(),
        rel_path: rel_path.to_owned(),
        base_name: field(3)?.to_owned(),
        ext: field(4)?.to_owned(),
        size,
        mtime: field(6)?.to_owned(),
    })
}
