use polars::prelude::*;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    ops::Deref,
    path::Path,
};

use crate::config::GridConfig;
use crate::course::{ClassSection, Session};
use crate::error::Result;
use crate::scheduler::Combination;
use crate::time::{Day, TimeSlot};

/// Every distinct (start, end) pair in the catalogue, ascending by start.
pub fn unique_time_slots(catalogue: &[ClassSection]) -> Vec<TimeSlot> {
    catalogue
        .iter()
        .flat_map(|section| section.sessions().iter().map(Session::slot))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Places each session of `sections` in the cell keyed by its day and its
/// exact (start, end) slot.
pub fn project<'a>(sections: &[&'a ClassSection], slots: &[TimeSlot]) -> Grid<'a> {
    let mut cells = BTreeMap::new();
    let mut unplaced = Vec::new();

    for &section in sections {
        for session in section.sessions() {
            let slot = session.slot();
            if !slots.contains(&slot) {
                unplaced.push((section, session));
                continue;
            }
            if let Some(previous) = cells.insert((session.day(), slot), section) {
                log::warn!(
                    "{} and {} both occupy {} {}",
                    previous.name(),
                    section.name(),
                    session.day(),
                    slot
                );
            }
        }
    }

    Grid {
        slots: slots.to_vec(),
        cells,
        unplaced,
    }
}

/// Day x time-slot assignment of one combination.
#[derive(Debug, Clone)]
pub struct Grid<'a> {
    slots: Vec<TimeSlot>,
    cells: BTreeMap<(Day, TimeSlot), &'a ClassSection>,
    unplaced: Vec<(&'a ClassSection, &'a Session)>,
}

impl<'a> Grid<'a> {
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn cell(&self, day: Day, slot: TimeSlot) -> Option<&'a ClassSection> {
        self.cells.get(&(day, slot)).copied()
    }

    /// Occupied cells, day by day, earliest slot first.
    pub fn cells(&self) -> impl Iterator<Item = (Day, TimeSlot, &'a ClassSection)> + '_ {
        self.cells.iter().map(|(&(day, slot), &s)| (day, slot, s))
    }

    /// Sessions whose times match no slot of the row axis.
    pub fn unplaced(&self) -> &[(&'a ClassSection, &'a Session)] {
        &self.unplaced
    }

    /// One row per slot: the slot label followed by the cell text of each
    /// configured day.
    fn rows(&self, config: &GridConfig) -> Vec<(String, Vec<Option<String>>)> {
        for (day, slot, section) in self.cells() {
            if !config.days.contains(&day) {
                log::warn!(
                    "{} on {} {} is outside the configured day columns",
                    section.name(),
                    day,
                    slot
                );
            }
        }

        self.slots
            .iter()
            .map(|&slot| {
                let cells = config
                    .days
                    .iter()
                    .map(|&day| {
                        self.cell(day, slot).map(|s| {
                            format!("{}\n({} {})", s.name(), config.group_prefix, s.group())
                        })
                    })
                    .collect();
                (slot.to_string(), cells)
            })
            .collect()
    }

    pub fn to_df(&self, config: &GridConfig) -> Result<DataFrame> {
        Ok(frame(config, None, self.rows(config))?)
    }
}

fn frame(
    config: &GridConfig,
    index: Option<Vec<u32>>,
    rows: Vec<(String, Vec<Option<String>>)>,
) -> PolarsResult<DataFrame> {
    let mut times = Vec::with_capacity(rows.len());
    let mut days: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(rows.len()); config.days.len()];
    for (time, cells) in rows {
        times.push(time);
        for (column, cell) in days.iter_mut().zip(cells) {
            column.push(cell);
        }
    }

    let mut columns = Vec::with_capacity(config.days.len() + 2);
    if let Some(index) = index {
        columns.push(Series::new("timetable", index));
    }
    columns.push(Series::new(&config.time_header, times));
    for (day, cells) in config.days.iter().zip(days) {
        columns.push(Series::new(config.label(*day), cells));
    }
    DataFrame::new(columns)
}

/// The result of one enumeration together with the catalogue-wide row axis
/// shared by all of its grids.
#[derive(Debug, Clone)]
pub struct Timetables<'a> {
    combinations: Vec<Combination<'a>>,
    slots: Vec<TimeSlot>,
}

impl<'a> Timetables<'a> {
    pub fn new(combinations: Vec<Combination<'a>>, catalogue: &[ClassSection]) -> Timetables<'a> {
        Timetables {
            combinations,
            slots: unique_time_slots(catalogue),
        }
    }

    pub fn time_slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn combinations(&self) -> &[Combination<'a>] {
        &self.combinations
    }

    pub fn grids(&self) -> Vec<Grid<'a>> {
        self.combinations
            .iter()
            .map(|c| project(c.sections(), &self.slots))
            .collect()
    }

    /// All grids stacked in one table, numbered from 1 in the `timetable` column.
    pub fn to_df(&self, config: &GridConfig) -> Result<DataFrame> {
        let mut index = Vec::new();
        let mut rows = Vec::new();
        for (i, grid) in self.grids().iter().enumerate() {
            let grid_rows = grid.rows(config);
            index.extend(std::iter::repeat(i as u32 + 1).take(grid_rows.len()));
            rows.extend(grid_rows);
        }
        Ok(frame(config, Some(index), rows)?)
    }

    pub fn write_csv<P: AsRef<Path>>(&self, file_path: P, config: &GridConfig) -> Result<()> {
        let mut df = self.to_df(config)?;
        let mut file = File::create(file_path.as_ref())?;
        CsvWriter::new(&mut file).finish(&mut df)?;
        log::info!(
            "wrote {} timetables to {}",
            self.combinations.len(),
            file_path.as_ref().display()
        );
        Ok(())
    }
}

impl<'a> Deref for Timetables<'a> {
    type Target = [Combination<'a>];

    fn deref(&self) -> &Self::Target {
        &self.combinations
    }
}
