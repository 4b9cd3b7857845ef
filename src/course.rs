use polars::{lazy::dsl::col, prelude::*};
use std::{collections::BTreeSet, collections::HashMap, fmt, ops::Deref, path::Path};

use crate::error::{Error, Result};
use crate::time::{overlaps, Day, TimeOfDay, TimeSlot};

/// Column names of the flat, one-row-per-session catalogue table.
pub const COLUMNS: [&str; 5] = ["name", "group", "day", "start_time", "end_time"];
pub const LOCATION_COLUMN: &str = "location";

/// One weekly recurring meeting of a section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Session {
    day: Day,
    start: TimeOfDay,
    end: TimeOfDay,
    location: Option<String>,
}

impl Session {
    /// Rejects sessions whose end is not strictly after their start.
    pub fn new(
        day: Day,
        start: TimeOfDay,
        end: TimeOfDay,
        location: Option<String>,
    ) -> Result<Session> {
        if end <= start {
            return Err(Error::InvalidInput(format!(
                "session on {} ends at {} which is not after its start {}",
                day, end, start
            )));
        }
        Ok(Session {
            day,
            start,
            end,
            location,
        })
    }

    pub fn day(&self) -> Day {
        self.day
    }

    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn slot(&self) -> TimeSlot {
        TimeSlot::new(self.start, self.end)
    }

    pub fn conflict_with(&self, other: &Session) -> bool {
        self.day == other.day && overlaps(self.start, self.end, other.start, other.end)
    }
}

/// One offering of a class: a name, a group label and its weekly sessions.
///
/// Two sections with the same name are the same class regardless of group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ClassSection {
    name: String,
    group: String,
    sessions: Vec<Session>,
}

impl ClassSection {
    pub fn new(name: &str, group: &str, sessions: Vec<Session>) -> Result<ClassSection> {
        let name = capitalize(name.trim());
        if name.is_empty() {
            return Err(Error::InvalidInput("class name is empty".to_string()));
        }
        if sessions.is_empty() {
            return Err(Error::InvalidInput(format!(
                "section {} (group {}) has no sessions",
                name, group
            )));
        }
        Ok(ClassSection {
            name,
            group: group.trim().to_string(),
            sessions,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn days(&self) -> impl Iterator<Item = Day> + '_ {
        self.sessions.iter().map(|s| s.day)
    }

    /// True when any session of `self` collides with any session of `other` on the same day.
    pub fn conflict_with(&self, other: &ClassSection) -> bool {
        self.sessions
            .iter()
            .any(|a| other.sessions.iter().any(|b| a.conflict_with(b)))
    }
}

pub fn has_conflict(a: &ClassSection, b: &ClassSection) -> bool {
    a.conflict_with(b)
}

impl Deref for ClassSection {
    type Target = [Session];

    fn deref(&self) -> &Self::Target {
        &self.sessions
    }
}

impl fmt::Display for ClassSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Class Name: {}", self.name)?;
        write!(f, "Group/Section: {}", self.group)?;
        for s in &self.sessions {
            write!(
                f,
                "\nDay: {}, Start Time: {}, End Time: {}",
                s.day, s.start, s.end
            )?;
            if let Some(location) = &s.location {
                write!(f, ", Location: {}", location)?;
            }
        }
        Ok(())
    }
}

/// First letter upper case, the rest lower case.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Ordered list of sections handed to the enumerator.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Catalogue {
    sections: Vec<ClassSection>,
}

impl Catalogue {
    pub fn new(sections: Vec<ClassSection>) -> Catalogue {
        Catalogue { sections }
    }

    pub fn add_section(&mut self, section: ClassSection) {
        self.sections.push(section);
    }

    /// Removes the first section matching `name` and `group`.
    pub fn remove_section(&mut self, name: &str, group: &str) -> Option<ClassSection> {
        let name = capitalize(name.trim());
        let idx = self
            .sections
            .iter()
            .position(|s| s.name == name && s.group == group.trim())?;
        Some(self.sections.remove(idx))
    }

    /// Distinct class names, sorted.
    pub fn class_names(&self) -> Vec<String> {
        self.sections
            .iter()
            .map(|s| s.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn contains_class(&self, name: &str) -> bool {
        let name = capitalize(name.trim());
        self.sections.iter().any(|s| s.name == name)
    }

    /// Groups one-row-per-session data into sections keyed by (name, group),
    /// in order of first appearance.
    pub fn from_df(df: &DataFrame) -> Result<Catalogue> {
        let has_location = df.get_column_names().contains(&LOCATION_COLUMN);
        let mut columns = COLUMNS.to_vec();
        if has_location {
            columns.push(LOCATION_COLUMN);
        }
        let df = df.select(columns)?;

        let mut index: HashMap<(String, String), usize> = HashMap::new();
        let mut rows: Vec<(String, String, Vec<Session>)> = Vec::new();

        for i in 0..df.height() {
            let row = df
                .get(i)
                .ok_or_else(|| Error::InvalidInput(format!("row {} is missing", i)))?;
            let field = |j: usize| {
                row.get(j).and_then(text).ok_or_else(|| {
                    Error::InvalidInput(format!("row {}: column {:?} is empty", i, COLUMNS[j]))
                })
            };

            let name = capitalize(&field(0)?);
            let group = field(1)?;
            let day: Day = field(2)?.parse()?;
            let start: TimeOfDay = field(3)?.parse()?;
            let end: TimeOfDay = field(4)?.parse()?;
            let location = if has_location {
                row.get(5).and_then(text)
            } else {
                None
            };
            let session = Session::new(day, start, end, location)?;

            let key = (name.clone(), group.clone());
            match index.get(&key) {
                Some(&idx) => rows[idx].2.push(session),
                None => {
                    index.insert(key, rows.len());
                    rows.push((name, group, vec![session]));
                }
            }
        }

        let sections = rows
            .into_iter()
            .map(|(name, group, sessions)| ClassSection::new(&name, &group, sessions))
            .collect::<Result<Vec<_>>>()?;
        Ok(Catalogue::new(sections))
    }
}

fn text(value: &AnyValue) -> Option<String> {
    let s = match value {
        AnyValue::Null => return None,
        AnyValue::String(s) => s.trim().to_string(),
        AnyValue::StringOwned(s) => s.trim().to_string(),
        v => v.to_string().trim().to_string(),
    };
    (!s.is_empty()).then_some(s)
}

impl Deref for Catalogue {
    type Target = [ClassSection];

    fn deref(&self) -> &Self::Target {
        &self.sections
    }
}

impl From<Vec<ClassSection>> for Catalogue {
    fn from(sections: Vec<ClassSection>) -> Self {
        Catalogue::new(sections)
    }
}

impl FromIterator<ClassSection> for Catalogue {
    fn from_iter<I: IntoIterator<Item = ClassSection>>(iter: I) -> Self {
        Catalogue::new(iter.into_iter().collect())
    }
}

impl TryFrom<&CatalogueTable> for Catalogue {
    type Error = Error;

    fn try_from(table: &CatalogueTable) -> Result<Self> {
        Catalogue::from_df(table)
    }
}

/// Flat CSV catalogue, one row per session.
pub struct CatalogueTable {
    df: DataFrame,
}

impl CatalogueTable {
    /// Every column is read as text, so group labels like `01` and `1` stay distinct.
    pub fn load<P: AsRef<Path>>(file_path: P) -> Result<CatalogueTable> {
        let df = LazyCsvReader::new(file_path.as_ref())
            .has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        log::info!(
            "loaded {} session rows from {}",
            df.height(),
            file_path.as_ref().display()
        );
        Ok(CatalogueTable { df })
    }

    pub fn from_df(df: DataFrame) -> CatalogueTable {
        CatalogueTable { df }
    }

    pub fn to_lazy(&self) -> LazyTable {
        LazyTable::new(self.df.clone().lazy())
    }

    pub fn to_catalogue(&self) -> Result<Catalogue> {
        Catalogue::from_df(&self.df)
    }
}

impl Deref for CatalogueTable {
    type Target = DataFrame;

    fn deref(&self) -> &Self::Target {
        &self.df
    }
}

impl fmt::Display for CatalogueTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.df)
    }
}

pub struct LazyTable {
    lf: LazyFrame,
}

impl LazyTable {
    pub fn new(lf: LazyFrame) -> Self {
        LazyTable { lf }
    }

    /// Keeps rows whose class name starts with any of `names`, ignoring case.
    pub fn contains(self, names: &[&str]) -> Self {
        let lf = self.lf.filter(name_matches(names));
        LazyTable { lf }
    }

    /// Keeps session rows on any of `days`. Day cells may be full names or
    /// three-letter abbreviations, in any case.
    pub fn on_days(self, days: &[Day]) -> Self {
        let alternatives = days
            .iter()
            .map(|d| format!("{}|{}", d.name(), &d.name()[..3]))
            .collect::<Vec<_>>()
            .join("|");
        let regex = format!(r"(?i)^\s*({})\s*$", alternatives);
        let lf = self.lf.filter(col("day").str().contains(lit(regex), false));
        LazyTable { lf }
    }

    pub fn collect(self) -> Result<CatalogueTable> {
        let df = self.lf.collect()?;
        Ok(CatalogueTable { df })
    }
}

fn name_matches(names: &[&str]) -> Expr {
    let alternatives = names
        .iter()
        .map(|n| escape_regex(n.trim()))
        .collect::<Vec<_>>()
        .join("|");
    let regex = format!("(?i)^({})", alternatives);
    col("name").str().contains(lit(regex), false)
}

fn escape_regex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if "\\.+*?()|[]{}^$#&-~".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl Deref for LazyTable {
    type Target = LazyFrame;

    fn deref(&self) -> &Self::Target {
        &self.lf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(day: Day, start: &str, end: &str) -> Session {
        Session::new(day, start.parse().unwrap(), end.parse().unwrap(), None).unwrap()
    }

    fn section(name: &str, sessions: Vec<Session>) -> ClassSection {
        ClassSection::new(name, "1", sessions).unwrap()
    }

    #[test]
    fn test_invalid_session() {
        let t = |s: &str| s.parse::<TimeOfDay>().unwrap();
        assert!(Session::new(Day::Monday, t("10:00"), t("10:00"), None).is_err());
        assert!(Session::new(Day::Monday, t("11:00"), t("10:00"), None).is_err());
    }

    #[test]
    fn test_section_requires_sessions() {
        assert!(matches!(
            ClassSection::new("Math", "A", vec![]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_name_is_capitalized() {
        let s = section("  lINEAR algebra", vec![session(Day::Monday, "09:00", "10:00")]);
        assert_eq!(s.name(), "Linear algebra");
        assert_eq!(capitalize("émile"), "Émile");
    }

    #[test]
    fn test_conflict_same_day_only() {
        let a = section("A", vec![session(Day::Monday, "09:00", "10:00")]);
        let b = section("B", vec![session(Day::Tuesday, "09:00", "10:00")]);
        let c = section(
            "C",
            vec![
                session(Day::Tuesday, "12:00", "13:00"),
                session(Day::Monday, "09:30", "10:30"),
            ],
        );
        assert!(!has_conflict(&a, &b));
        assert!(has_conflict(&a, &c));
        assert!(has_conflict(&c, &a));
    }

    #[test]
    fn test_conflict_not_transitive() {
        let a = section("A", vec![session(Day::Monday, "09:00", "10:00")]);
        let b = section("B", vec![session(Day::Monday, "09:30", "10:30")]);
        let c = section("C", vec![session(Day::Monday, "10:00", "11:00")]);
        assert!(a.conflict_with(&b));
        assert!(b.conflict_with(&c));
        assert!(!a.conflict_with(&c));
    }

    #[test]
    fn test_catalogue_helpers() {
        let mut catalogue = Catalogue::new(vec![
            section("physics", vec![session(Day::Monday, "09:00", "10:00")]),
            ClassSection::new("Algebra", "2", vec![session(Day::Friday, "09:00", "10:00")])
                .unwrap(),
            section("algebra", vec![session(Day::Monday, "09:00", "10:00")]),
        ]);
        assert_eq!(catalogue.class_names(), vec!["Algebra", "Physics"]);
        assert!(catalogue.contains_class("PHYSICS"));

        let removed = catalogue.remove_section("algebra", "2").unwrap();
        assert_eq!(removed.group(), "2");
        assert_eq!(catalogue.len(), 2);
        assert!(catalogue.remove_section("algebra", "2").is_none());
    }

    #[test]
    fn test_display() {
        let s = Session::new(
            Day::Monday,
            "09:00".parse().unwrap(),
            "10:00".parse().unwrap(),
            Some("Room 101".to_string()),
        )
        .unwrap();
        let text = section("math", vec![s]).to_string();
        assert_eq!(
            text,
            "Class Name: Math\nGroup/Section: 1\nDay: Monday, Start Time: 09:00, End Time: 10:00, Location: Room 101"
        );
    }

    fn sample_df() -> DataFrame {
        df!(
            "name" => &["math", "physics", "math", "Math"],
            "group" => &["A", "A", "A", "B"],
            "day" => &["Monday", "Tuesday", "Wed", "Friday"],
            "start_time" => &["09:00", "10:00", "09:00", "13:00"],
            "end_time" => &["10:00", "11:30", "10:00", "14:00"],
            "location" => &[Some("R1"), None, Some("R2"), None]
        )
        .unwrap()
    }

    #[test]
    fn test_catalogue_from_df() {
        let catalogue = Catalogue::from_df(&sample_df()).unwrap();
        assert_eq!(catalogue.len(), 3);

        let math_a = &catalogue[0];
        assert_eq!((math_a.name(), math_a.group()), ("Math", "A"));
        assert_eq!(math_a.len(), 2);
        assert_eq!(math_a[1].day(), Day::Wednesday);
        assert_eq!(math_a[1].location(), Some("R2"));

        assert_eq!(catalogue[1].name(), "Physics");
        assert_eq!(catalogue[1][0].location(), None);
        assert_eq!(catalogue[2].group(), "B");
    }

    #[test]
    fn test_catalogue_from_df_rejects_bad_session() {
        let df = df!(
            "name" => &["math"],
            "group" => &["A"],
            "day" => &["Monday"],
            "start_time" => &["10:00"],
            "end_time" => &["09:00"]
        )
        .unwrap();
        assert!(matches!(
            Catalogue::from_df(&df),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_lazy_table_filters() {
        let table = CatalogueTable::from_df(sample_df());

        let math = table.to_lazy().contains(&["MATH"]).collect().unwrap();
        assert_eq!(math.height(), 3);

        let midweek = table
            .to_lazy()
            .on_days(&[Day::Tuesday, Day::Wednesday])
            .collect()
            .unwrap();
        let catalogue = midweek.to_catalogue().unwrap();
        assert_eq!(catalogue.class_names(), vec!["Math", "Physics"]);
        assert_eq!(catalogue[1].name(), "Math");
        assert_eq!(catalogue[1].len(), 1);
        assert_eq!(catalogue[1][0].day(), Day::Wednesday);

        let math_midweek = table
            .to_lazy()
            .contains(&["math"])
            .on_days(&[Day::Wednesday])
            .collect()
            .unwrap();
        assert_eq!(math_midweek.height(), 1);
        assert_eq!(table.to_lazy().on_days(&[]).collect().unwrap().height(), 0);
    }

    #[test]
    fn test_load_keeps_group_labels_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalogue.csv");
        std::fs::write(
            &path,
            "name,group,day,start_time,end_time\n\
             math,01,Monday,09:00,10:00\n\
             math,1,Tuesday,09:00,10:00\n",
        )
        .unwrap();

        let catalogue = CatalogueTable::load(&path).unwrap().to_catalogue().unwrap();
        assert_eq!(catalogue.len(), 2);
        assert_eq!(catalogue[0].group(), "01");
        assert_eq!(catalogue[0].len(), 1);
        assert_eq!(catalogue[1].group(), "1");
        assert_eq!(catalogue[1][0].day(), Day::Tuesday);
    }

    #[test]
    fn test_quotes_in_names_survive() {
        let df = df!(
            "name" => &["intro to \"c\""],
            "group" => &["A"],
            "day" => &["Monday"],
            "start_time" => &["09:00"],
            "end_time" => &["10:00"]
        )
        .unwrap();
        let catalogue = Catalogue::from_df(&df).unwrap();
        assert_eq!(catalogue[0].name(), "Intro to \"c\"");
    }

    #[test]
    fn test_escape_regex() {
        assert_eq!(escape_regex("C++ (intro)"), "C\\+\\+ \\(intro\\)");
    }
}
