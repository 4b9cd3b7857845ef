use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, ops::Deref, path::Path};

use crate::course::{capitalize, Catalogue, CatalogueTable, ClassSection};
use crate::error::{Error, Result};
use crate::grid::Timetables;
use crate::serialize;
use crate::time::Day;

/// What the user asks for: how many classes, which ones are required and
/// which days must stay free.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub k: usize,
    #[serde(default, deserialize_with = "deserialize_names")]
    pub mandatory: BTreeSet<String>,
    #[serde(default)]
    pub excluded_days: BTreeSet<Day>,
}

fn normalize_names<I, S>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| capitalize(n.as_ref().trim()))
        .collect()
}

fn deserialize_names<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let names = Vec::<String>::deserialize(deserializer)?;
    Ok(normalize_names(names))
}

impl Request {
    pub fn new(k: usize) -> Request {
        Request {
            k,
            ..Default::default()
        }
    }

    pub fn with_mandatory<I, S>(mut self, names: I) -> Request
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.mandatory.extend(normalize_names(names));
        self
    }

    /// Same request with mandatory names in the form section names take.
    pub fn normalized(&self) -> Request {
        Request {
            k: self.k,
            mandatory: normalize_names(&self.mandatory),
            excluded_days: self.excluded_days.clone(),
        }
    }

    pub fn excluding<I: IntoIterator<Item = Day>>(mut self, days: I) -> Request {
        self.excluded_days.extend(days);
        self
    }

    /// Checks `|mandatory| <= k <= n`, counting mandatory names after
    /// normalization.
    pub fn validate(&self, n: usize) -> Result<()> {
        let mandatory = normalize_names(&self.mandatory).len();
        if self.k > n {
            return Err(Error::InvalidInput(format!(
                "cannot pick {} classes from a catalogue of {}",
                self.k, n
            )));
        }
        if self.k < mandatory {
            return Err(Error::InvalidInput(format!(
                "{} mandatory classes do not fit in {} picks",
                mandatory,
                self.k
            )));
        }
        Ok(())
    }
}

/// A viable set of sections, kept in catalogue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination<'a> {
    indices: Vec<usize>,
    sections: Vec<&'a ClassSection>,
}

impl<'a> Combination<'a> {
    /// Positions of the chosen sections in the catalogue, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn sections(&self) -> &[&'a ClassSection] {
        &self.sections
    }

    pub fn names(&self) -> Vec<&'a str> {
        self.sections.iter().map(|s| s.name()).collect()
    }
}

impl<'a> Deref for Combination<'a> {
    type Target = [&'a ClassSection];

    fn deref(&self) -> &Self::Target {
        &self.sections
    }
}

pub fn is_conflict_free(sections: &[&ClassSection]) -> bool {
    sections.iter().enumerate().all(|(i, a)| {
        sections[i + 1..]
            .iter()
            .all(|b| !a.conflict_with(b))
    })
}

pub fn has_unique_names(sections: &[&ClassSection]) -> bool {
    let names: BTreeSet<&str> = sections.iter().map(|s| s.name()).collect();
    names.len() == sections.len()
}

pub fn respects_free_days(sections: &[&ClassSection], excluded: &BTreeSet<Day>) -> bool {
    sections
        .iter()
        .flat_map(|s| s.days())
        .all(|day| !excluded.contains(&day))
}

pub fn includes_mandatory(sections: &[&ClassSection], mandatory: &BTreeSet<String>) -> bool {
    normalize_names(mandatory)
        .iter()
        .all(|name| sections.iter().any(|s| s.name() == name.as_str()))
}

/// All four viability predicates at once.
pub fn is_viable(sections: &[&ClassSection], request: &Request) -> bool {
    is_conflict_free(sections)
        && has_unique_names(sections)
        && respects_free_days(sections, &request.excluded_days)
        && includes_mandatory(sections, &request.mandatory)
}

/// Every `request.k`-sized subset of `catalogue` that passes [`is_viable`],
/// in lexicographic order of catalogue positions.
///
/// Partial subsets are abandoned as soon as they contain a conflict, a
/// repeated name or an excluded day, or can no longer reach every mandatory
/// class. The output is the same as filtering the full C(n, k) enumeration.
pub fn enumerate<'a>(catalogue: &'a [ClassSection], request: &Request) -> Result<Vec<Combination<'a>>> {
    let request = request.normalized();
    request.validate(catalogue.len())?;

    let mut search = Search {
        catalogue,
        k: request.k,
        mandatory: &request.mandatory,
        excluded: &request.excluded_days,
        chosen: Vec::with_capacity(request.k),
        visited: 0,
        found: Vec::new(),
    };
    search.extend(0);

    log::debug!(
        "{} sections, k={}: {} candidate subsets, {} partial states visited, {} viable",
        catalogue.len(),
        request.k,
        binomial(catalogue.len(), request.k),
        search.visited,
        search.found.len()
    );
    if search.found.is_empty() {
        log::warn!(
            "no timetable satisfies k={}, mandatory={:?}, excluded days={:?}",
            request.k,
            request.mandatory,
            request.excluded_days
        );
    }
    Ok(search.found)
}

struct Search<'a, 'r> {
    catalogue: &'a [ClassSection],
    k: usize,
    mandatory: &'r BTreeSet<String>,
    excluded: &'r BTreeSet<Day>,
    chosen: Vec<usize>,
    visited: usize,
    found: Vec<Combination<'a>>,
}

impl<'a, 'r> Search<'a, 'r> {
    fn extend(&mut self, from: usize) {
        self.visited += 1;
        let remaining = self.k - self.chosen.len();
        if self.missing_mandatory() > remaining {
            return;
        }
        if remaining == 0 {
            let catalogue = self.catalogue;
            let sections = self.chosen.iter().map(|&i| &catalogue[i]).collect();
            self.found.push(Combination {
                indices: self.chosen.clone(),
                sections,
            });
            return;
        }

        let n = self.catalogue.len();
        for i in from..=n - remaining {
            if self.fits(&self.catalogue[i]) {
                self.chosen.push(i);
                self.extend(i + 1);
                self.chosen.pop();
            }
        }
    }

    fn fits(&self, candidate: &ClassSection) -> bool {
        if candidate.days().any(|d| self.excluded.contains(&d)) {
            return false;
        }
        self.chosen.iter().all(|&i| {
            let other = &self.catalogue[i];
            other.name() != candidate.name() && !other.conflict_with(candidate)
        })
    }

    fn missing_mandatory(&self) -> usize {
        self.mandatory
            .iter()
            .filter(|name| {
                !self
                    .chosen
                    .iter()
                    .any(|&i| self.catalogue[i].name() == name.as_str())
            })
            .count()
    }
}

/// C(n, k), saturating on overflow.
pub fn binomial(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k) as u128;
    let n = n as u128;
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = match acc.checked_mul(n - i) {
            Some(v) => v / (i + 1),
            None => return u128::MAX,
        };
    }
    acc
}

/// Holds a catalogue and answers enumeration requests against it.
pub struct Scheduler {
    catalogue: Catalogue,
}

impl Scheduler {
    pub fn new(catalogue: Catalogue) -> Scheduler {
        Scheduler { catalogue }
    }

    /// Loads a JSON catalogue as written by [`serialize::append_section`].
    pub fn load<P: AsRef<Path>>(file_path: P) -> Result<Scheduler> {
        Ok(Scheduler::new(serialize::load_catalogue(file_path)?))
    }

    /// Loads a flat one-row-per-session CSV catalogue.
    pub fn load_csv<P: AsRef<Path>>(file_path: P) -> Result<Scheduler> {
        let table = CatalogueTable::load(file_path)?;
        Ok(Scheduler::new(Catalogue::try_from(&table)?))
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn catalogue_mut(&mut self) -> &mut Catalogue {
        &mut self.catalogue
    }

    pub fn enumerate(&self, request: &Request) -> Result<Vec<Combination<'_>>> {
        enumerate(&self.catalogue, request)
    }

    /// Enumerates and bundles the result with the catalogue-wide time slots.
    pub fn timetables(&self, request: &Request) -> Result<Timetables<'_>> {
        let combinations = self.enumerate(request)?;
        Ok(Timetables::new(combinations, &self.catalogue))
    }
}

impl Deref for Scheduler {
    type Target = Catalogue;

    fn deref(&self) -> &Self::Target {
        &self.catalogue
    }
}
