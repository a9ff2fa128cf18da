//! Public holiday lookup used by the date admissibility filter.
//!
//! [`HolidayCalendar`] is the oracle the filter consumes. [`RegionalHolidays`]
//! is the built-in implementation: a small rule table of nationwide public
//! holidays (fixed dates, Easter-relative feasts, "n-th weekday of month"
//! rules) for a handful of regions, selected from the calendar's IANA timezone.
//! Regional (state/canton) holidays and substitute days are not modeled.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use chrono_tz::Tz;
use tracing::warn;

/// Answers "is this date a public holiday" for one region.
pub trait HolidayCalendar {
    /// Name of the holiday on `date`, if any.
    fn holiday_name(&self, date: NaiveDate) -> Option<&'static str>;

    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holiday_name(date).is_some()
    }

    /// The day before a holiday, unless it is a holiday itself.
    fn is_holiday_eve(&self, date: NaiveDate) -> bool {
        !self.is_holiday(date) && date.succ_opt().is_some_and(|next| self.is_holiday(next))
    }
}

/// A calendar without any holidays.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn holiday_name(&self, _date: NaiveDate) -> Option<&'static str> {
        None
    }
}

/// Regions with a built-in rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Germany,
    Austria,
    Switzerland,
    UnitedKingdom,
    France,
    Netherlands,
    UnitedStates,
}

impl Region {
    /// Region whose public holidays apply to a timezone, if it has a rule table.
    pub fn from_timezone(tz: Tz) -> Option<Self> {
        match tz.name() {
            "Europe/Berlin" | "Europe/Busingen" => Some(Region::Germany),
            "Europe/Vienna" => Some(Region::Austria),
            "Europe/Zurich" => Some(Region::Switzerland),
            "Europe/London" | "Europe/Belfast" | "GB" => Some(Region::UnitedKingdom),
            "Europe/Paris" => Some(Region::France),
            "Europe/Amsterdam" => Some(Region::Netherlands),
            "America/New_York" | "America/Chicago" | "America/Denver" | "America/Phoenix"
            | "America/Los_Angeles" | "America/Anchorage" | "America/Detroit"
            | "Pacific/Honolulu" | "US/Eastern" | "US/Central" | "US/Mountain"
            | "US/Pacific" => Some(Region::UnitedStates),
            _ => None,
        }
    }

    fn rules(self) -> &'static [Rule] {
        match self {
            Region::Germany => GERMANY,
            Region::Austria => AUSTRIA,
            Region::Switzerland => SWITZERLAND,
            Region::UnitedKingdom => UNITED_KINGDOM,
            Region::France => FRANCE,
            Region::Netherlands => NETHERLANDS,
            Region::UnitedStates => UNITED_STATES,
        }
    }
}

/// Built-in rule-table holiday calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionalHolidays {
    region: Option<Region>,
}

impl RegionalHolidays {
    pub fn new(region: Option<Region>) -> Self {
        Self { region }
    }

    /// Holiday calendar for an IANA timezone identifier.
    ///
    /// Unknown identifiers are logged and yield a calendar without holidays.
    pub fn for_timezone(timezone: &str) -> Self {
        match timezone.parse::<Tz>() {
            Ok(tz) => Self::new(Region::from_timezone(tz)),
            Err(_) => {
                warn!(timezone, "unknown timezone, holiday rules disabled");
                Self::new(None)
            }
        }
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }
}

impl HolidayCalendar for RegionalHolidays {
    fn holiday_name(&self, date: NaiveDate) -> Option<&'static str> {
        let rules = self.region?.rules();
        let easter = easter_sunday(date.year());
        rules
            .iter()
            .find(|rule| rule.date_in(date.year(), easter) == Some(date))
            .map(Rule::name)
    }
}

enum Rule {
    /// Same month/day every year.
    Fixed(u32, u32, &'static str),
    /// Days relative to Easter Sunday.
    Easter(i64, &'static str),
    /// n-th weekday of a month (1-based).
    Nth(u32, Weekday, u8, &'static str),
    /// Last weekday of a month.
    Last(u32, Weekday, &'static str),
}

impl Rule {
    fn name(&self) -> &'static str {
        match self {
            Rule::Fixed(_, _, name)
            | Rule::Easter(_, name)
            | Rule::Nth(_, _, _, name)
            | Rule::Last(_, _, name) => name,
        }
    }

    fn date_in(&self, year: i32, easter: Option<NaiveDate>) -> Option<NaiveDate> {
        match *self {
            Rule::Fixed(month, day, _) => NaiveDate::from_ymd_opt(year, month, day),
            Rule::Easter(offset, _) => {
                let easter = easter?;
                if offset >= 0 {
                    easter.checked_add_days(Days::new(offset as u64))
                } else {
                    easter.checked_sub_days(Days::new(offset.unsigned_abs()))
                }
            }
            Rule::Nth(month, weekday, n, _) => {
                NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
            }
            Rule::Last(month, weekday, _) => last_weekday_of_month(year, month, weekday),
        }
    }
}

/// Easter Sunday (Gregorian) via the anonymous computus.
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let mut day = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    while day.weekday() != weekday {
        day = day.pred_opt()?;
    }
    Some(day)
}

const GERMANY: &[Rule] = &[
    Rule::Fixed(1, 1, "Neujahr"),
    Rule::Easter(-2, "Karfreitag"),
    Rule::Easter(1, "Ostermontag"),
    Rule::Fixed(5, 1, "Tag der Arbeit"),
    Rule::Easter(39, "Christi Himmelfahrt"),
    Rule::Easter(50, "Pfingstmontag"),
    Rule::Fixed(10, 3, "Tag der Deutschen Einheit"),
    Rule::Fixed(12, 25, "1. Weihnachtstag"),
    Rule::Fixed(12, 26, "2. Weihnachtstag"),
];

const AUSTRIA: &[Rule] = &[
    Rule::Fixed(1, 1, "Neujahr"),
    Rule::Fixed(1, 6, "Heilige Drei Könige"),
    Rule::Easter(1, "Ostermontag"),
    Rule::Fixed(5, 1, "Staatsfeiertag"),
    Rule::Easter(39, "Christi Himmelfahrt"),
    Rule::Easter(50, "Pfingstmontag"),
    Rule::Easter(60, "Fronleichnam"),
    Rule::Fixed(8, 15, "Mariä Himmelfahrt"),
    Rule::Fixed(10, 26, "Nationalfeiertag"),
    Rule::Fixed(11, 1, "Allerheiligen"),
    Rule::Fixed(12, 8, "Mariä Empfängnis"),
    Rule::Fixed(12, 25, "Christtag"),
    Rule::Fixed(12, 26, "Stefanitag"),
];

const SWITZERLAND: &[Rule] = &[
    Rule::Fixed(1, 1, "Neujahr"),
    Rule::Easter(-2, "Karfreitag"),
    Rule::Easter(1, "Ostermontag"),
    Rule::Easter(39, "Auffahrt"),
    Rule::Easter(50, "Pfingstmontag"),
    Rule::Fixed(8, 1, "Bundesfeier"),
    Rule::Fixed(12, 25, "Weihnachten"),
    Rule::Fixed(12, 26, "Stephanstag"),
];

const UNITED_KINGDOM: &[Rule] = &[
    Rule::Fixed(1, 1, "New Year's Day"),
    Rule::Easter(-2, "Good Friday"),
    Rule::Easter(1, "Easter Monday"),
    Rule::Nth(5, Weekday::Mon, 1, "Early May Bank Holiday"),
    Rule::Last(5, Weekday::Mon, "Spring Bank Holiday"),
    Rule::Last(8, Weekday::Mon, "Summer Bank Holiday"),
    Rule::Fixed(12, 25, "Christmas Day"),
    Rule::Fixed(12, 26, "Boxing Day"),
];

const FRANCE: &[Rule] = &[
    Rule::Fixed(1, 1, "Jour de l'an"),
    Rule::Easter(1, "Lundi de Pâques"),
    Rule::Fixed(5, 1, "Fête du Travail"),
    Rule::Fixed(5, 8, "Victoire 1945"),
    Rule::Easter(39, "Ascension"),
    Rule::Easter(50, "Lundi de Pentecôte"),
    Rule::Fixed(7, 14, "Fête nationale"),
    Rule::Fixed(8, 15, "Assomption"),
    Rule::Fixed(11, 1, "Toussaint"),
    Rule::Fixed(11, 11, "Armistice 1918"),
    Rule::Fixed(12, 25, "Noël"),
];

const NETHERLANDS: &[Rule] = &[
    Rule::Fixed(1, 1, "Nieuwjaarsdag"),
    Rule::Easter(1, "Tweede Paasdag"),
    Rule::Fixed(4, 27, "Koningsdag"),
    Rule::Easter(39, "Hemelvaartsdag"),
    Rule::Easter(50, "Tweede Pinksterdag"),
    Rule::Fixed(12, 25, "Eerste Kerstdag"),
    Rule::Fixed(12, 26, "Tweede Kerstdag"),
];

const UNITED_STATES: &[Rule] = &[
    Rule::Fixed(1, 1, "New Year's Day"),
    Rule::Nth(1, Weekday::Mon, 3, "Martin Luther King Jr. Day"),
    Rule::Nth(2, Weekday::Mon, 3, "Washington's Birthday"),
    Rule::Last(5, Weekday::Mon, "Memorial Day"),
    Rule::Fixed(6, 19, "Juneteenth"),
    Rule::Fixed(7, 4, "Independence Day"),
    Rule::Nth(9, Weekday::Mon, 1, "Labor Day"),
    Rule::Nth(10, Weekday::Mon, 2, "Columbus Day"),
    Rule::Fixed(11, 11, "Veterans Day"),
    Rule::Nth(11, Weekday::Thu, 4, "Thanksgiving Day"),
    Rule::Fixed(12, 25, "Christmas Day"),
];
