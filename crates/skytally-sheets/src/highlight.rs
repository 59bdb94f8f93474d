//! Snapshot diff against published tabs, with in-place highlighting
//!
//! The target tab is annotated in place:
//!
//! ```text
//! row 0          header
//! rows 1..=n     target rows   (added → Addition, others unmarked)
//! row n+1        blank separator
//! rows n+2..     removed source rows (Removal)
//! ```
//!
//! Loading a tab stops at the first blank row, so the appended block is never
//! read back as snapshot data and re-running a diff is idempotent.

use crate::backend::{RowFormat, SheetsBackend};
use crate::error::{PublishError, Result};
use chrono::NaiveDate;
use skytally_core::{
    CompareMode, DiffResult, LoadedSnapshots, Marker, ServiceKind, SnapshotKey, Table,
};

/// Rebuild a published table from its `<service>-<date>` tab.
pub async fn load_table<B>(backend: &B, service: ServiceKind, date: NaiveDate) -> Result<Table>
where
    B: SheetsBackend + ?Sized,
{
    let title = Table::tab_name_for(service, date);
    let tab = backend
        .find_tab(&title)
        .await?
        .ok_or_else(|| PublishError::NotFound(format!("tab '{}'", title)))?;
    let rows = backend.read_rows(&tab).await?;
    let table = Table::from_rows(service, date, &rows);

    tracing::debug!(tab = %title, rows = table.len(), "snapshot loaded");
    Ok(table)
}

/// Writes and formats that annotate the target tab.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightPlan {
    /// First row below the target data (the separator row)
    pub append_at: usize,
    /// Removed source rows, in target column order
    pub appended: Vec<Vec<String>>,
    pub formats: Vec<RowFormat>,
}

impl HighlightPlan {
    pub fn added_rows(&self) -> usize {
        self.count(Marker::Addition)
    }

    pub fn removed_rows(&self) -> usize {
        self.appended.len()
    }

    fn count(&self, marker: Marker) -> usize {
        self.formats
            .iter()
            .filter(|f| f.marker == marker)
            .filter_map(|f| f.end_row.map(|end| end - f.start_row))
            .sum()
    }
}

/// Map a diff onto target-tab rows. Pure; no backend access.
pub fn plan_highlight(source: &Table, target: &Table, diff: &DiffResult) -> HighlightPlan {
    let key = &diff.key;

    // Header is row 0; data starts at row 1.
    let markers: Vec<Marker> = target
        .records()
        .iter()
        .map(|r| match diff.marker_for(&key.extract(r)) {
            Marker::Addition => Marker::Addition,
            _ => Marker::Unmarked,
        })
        .collect();

    let append_at = 1 + markers.len();

    // Only the winning row of a duplicated source key is shown.
    let (winners, _) = key.index(source);
    let appended: Vec<Vec<String>> = source
        .records()
        .iter()
        .filter(|r| {
            let k = key.extract(r);
            diff.removed.contains(&k) && winners.get(&k).is_some_and(|w| std::ptr::eq(*w, *r))
        })
        .map(|r| r.to_row(target.columns()))
        .collect();

    let mut formats = vec![RowFormat::from_row(1, Marker::Unmarked)];
    formats.extend(coalesce(&markers, 1).filter(|f| f.marker != Marker::Unmarked));
    if !appended.is_empty() {
        let start = append_at + 1;
        formats.push(RowFormat::rows(start, start + appended.len(), Marker::Removal));
    }

    HighlightPlan {
        append_at,
        appended,
        formats,
    }
}

/// Runs of equal markers as row ranges, offset by `first_row`.
fn coalesce(markers: &[Marker], first_row: usize) -> impl Iterator<Item = RowFormat> + '_ {
    markers
        .chunk_by(|a, b| a == b)
        .scan(first_row, |row, run| {
            let start = *row;
            *row += run.len();
            Some(RowFormat::rows(start, *row, run[0]))
        })
}

/// Write the plan to the target tab.
pub async fn apply_highlight<B>(backend: &B, target: &Table, plan: &HighlightPlan) -> Result<()>
where
    B: SheetsBackend + ?Sized,
{
    let title = target.tab_name();
    let tab = backend
        .find_tab(&title)
        .await?
        .ok_or_else(|| PublishError::NotFound(format!("tab '{}'", title)))?;

    backend.clear_tab(&tab, plan.append_at).await?;
    if !plan.appended.is_empty() {
        backend
            .write_rows(&tab, plan.append_at + 1, &plan.appended)
            .await?;
    }
    backend.format_rows(&tab, &plan.formats).await?;

    tracing::info!(
        tab = %title,
        added = plan.added_rows(),
        removed = plan.removed_rows(),
        "diff highlighted"
    );
    Ok(())
}

/// Which two snapshots to compare and how.
#[derive(Debug, Clone)]
pub struct DiffRequest {
    pub service: ServiceKind,
    pub source: NaiveDate,
    pub target: NaiveDate,
    pub key: SnapshotKey,
    pub mode: CompareMode,
    pub highlight: bool,
}

impl DiffRequest {
    /// Keys-only comparison on the service's composite key, highlighted.
    pub fn new(service: ServiceKind, source: NaiveDate, target: NaiveDate) -> Self {
        Self {
            service,
            source,
            target,
            key: SnapshotKey::for_service(service),
            mode: CompareMode::KeysOnly,
            highlight: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiffOutcome {
    pub result: DiffResult,
    /// Present when the target tab was annotated
    pub highlight: Option<HighlightPlan>,
}

/// Load both tabs, diff them and optionally annotate the target tab.
pub async fn diff_tabs<B>(backend: &B, request: &DiffRequest) -> Result<DiffOutcome>
where
    B: SheetsBackend + ?Sized,
{
    let source = load_table(backend, request.service, request.source).await?;
    let target = load_table(backend, request.service, request.target).await?;

    let result = LoadedSnapshots::load(&source, &target, request.key.clone())?.diff(request.mode);

    let highlight = if request.highlight {
        let plan = plan_highlight(&source, &target, &result);
        apply_highlight(backend, &target, &plan).await?;
        Some(plan)
    } else {
        None
    };

    Ok(DiffOutcome { result, highlight })
}
