//! Enumerates every conflict-free timetable of a fixed size from a catalogue
//! of class sections, and lays the results out on a day x time-slot grid.
//!
//! The core is a pure function over in-memory data: [`scheduler::enumerate`]
//! takes a catalogue and a [`Request`] and returns every viable
//! [`Combination`] in a deterministic order. Loading catalogues ([`serialize`],
//! [`course::CatalogueTable`]) and exporting grids ([`grid::Timetables`]) sit
//! around it.

pub mod config;
pub mod course;
pub mod error;
pub mod grid;
pub mod scheduler;
pub mod serialize;
pub mod time;

pub use config::GridConfig;
pub use course::{has_conflict, Catalogue, ClassSection, Session};
pub use error::{Error, Result};
pub use grid::{project, unique_time_slots, Grid, Timetables};
pub use scheduler::{enumerate, Combination, Request, Scheduler};
pub use time::{overlaps, Day, TimeOfDay, TimeSlot};

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str, day: Day, start: &str, end: &str) -> ClassSection {
        let session = Session::new(day, start.parse().unwrap(), end.parse().unwrap(), None).unwrap();
        ClassSection::new(name, "1", vec![session]).unwrap()
    }

    fn abc() -> Catalogue {
        Catalogue::new(vec![
            section("A", Day::Monday, "09:00", "10:00"),
            section("B", Day::Monday, "10:00", "11:00"),
            section("C", Day::Monday, "09:30", "10:30"),
        ])
    }

    #[test]
    fn it_works() {
        let catalogue = abc();
        let combos = enumerate(&catalogue, &Request::new(2)).unwrap();
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].names(), vec!["A", "B"]);
    }

    #[test]
    fn test_mandatory_conflicting_class() {
        let catalogue = abc();
        let request = Request::new(2).with_mandatory(["C"]);
        assert!(enumerate(&catalogue, &request).unwrap().is_empty());
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let catalogue = abc();
        let request = Request::new(1).excluding([Day::Monday]);
        let scheduler = Scheduler::new(catalogue);
        let timetables = scheduler.timetables(&request).unwrap();
        assert!(timetables.is_empty());
        assert_eq!(timetables.time_slots().len(), 3);
    }

    #[test]
    fn test_grid_for_scenario() {
        let scheduler = Scheduler::new(abc());
        let timetables = scheduler.timetables(&Request::new(2)).unwrap();
        let grid = &timetables.grids()[0];
        let nine = TimeSlot::new("09:00".parse().unwrap(), "10:00".parse().unwrap());
        let ten = TimeSlot::new("10:00".parse().unwrap(), "11:00".parse().unwrap());
        assert_eq!(grid.cell(Day::Monday, nine).unwrap().name(), "A");
        assert_eq!(grid.cell(Day::Monday, ten).unwrap().name(), "B");
        assert_eq!(grid.cells().count(), 2);
    }
}
