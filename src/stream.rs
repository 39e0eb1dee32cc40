//! Pull based delivery of the cover.
use crate::{
    geometry::{GeoEngine, GeometryEngine},
    grid::GridCodec,
    scanner::RowScanner,
    Result,
};
use std::{collections::VecDeque, iter::FusedIterator};

/// Granularity of what a [CellStream] yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One [Emission::Cell] per cell.
    #[default]
    Cells,
    /// One [Emission::Row] per non-empty row.
    Rows,
}

impl OutputMode {
    pub fn from_row_mode(row_mode: bool) -> Self {
        if row_mode {
            OutputMode::Rows
        } else {
            OutputMode::Cells
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission<C> {
    Row(Vec<C>),
    Cell(C),
}

impl<C> Emission<C> {
    pub fn into_cells(self) -> Vec<C> {
        match self {
            Emission::Row(cells) => cells,
            Emission::Cell(cell) => vec![cell],
        }
    }
}

/// Iterator over the cover of a polygon set.
///
/// Rows are computed on demand, and empty rows are skipped without ending the
/// stream. In [OutputMode::Cells] at most one row is buffered. The stream
/// ends after the last polygon is finished, or right after the first error.
pub struct CellStream<G: GridCodec, E: GeometryEngine = GeoEngine> {
    scanner: RowScanner<G, E>,
    mode: OutputMode,
    pending: VecDeque<G::Cell>,
    rows_emitted: usize,
    failed: bool,
}

impl<G: GridCodec, E: GeometryEngine> CellStream<G, E> {
    pub fn new(scanner: RowScanner<G, E>, mode: OutputMode) -> Self {
        CellStream {
            scanner,
            mode,
            pending: VecDeque::new(),
            rows_emitted: 0,
            failed: false,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn scanner(&self) -> &RowScanner<G, E> {
        &self.scanner
    }

    /// Non-empty rows produced so far.
    pub fn rows_emitted(&self) -> usize {
        self.rows_emitted
    }

    /// Flatten into single cells, whatever the output mode.
    pub fn cells(self) -> impl Iterator<Item = Result<G::Cell>> {
        self.flat_map(|emission| match emission {
            Ok(emission) => emission.into_cells().into_iter().map(Ok).collect::<Vec<_>>(),
            Err(e) => vec![Err(e)],
        })
    }

    fn next_non_empty_row(&mut self) -> Result<Option<Vec<G::Cell>>> {
        while let Some(row) = self.scanner.next_row()? {
            if !row.is_empty() {
                self.rows_emitted += 1;
                return Ok(Some(row));
            }
        }
        Ok(None)
    }
}

impl<G: GridCodec, E: GeometryEngine> Iterator for CellStream<G, E> {
    type Item = Result<Emission<G::Cell>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(cell) = self.pending.pop_front() {
            return Some(Ok(Emission::Cell(cell)));
        }
        if self.failed {
            return None;
        }
        match self.next_non_empty_row() {
            Ok(Some(row)) => match self.mode {
                OutputMode::Rows => Some(Ok(Emission::Row(row))),
                OutputMode::Cells => {
                    self.pending.extend(row);
                    self.pending.pop_front().map(|cell| Ok(Emission::Cell(cell)))
                }
            },
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl<G: GridCodec, E: GeometryEngine> FusedIterator for CellStream<G, E> {}
