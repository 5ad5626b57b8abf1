use crate::calendar::days::{ALL_WEEKDAYS, DayType};
use crate::calendar::{CalendarRef, DEFAULT_BASE_CALENDAR_NAME, ProjectCalendar};
use crate::settings::ProjectSettings;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::ops::{Deref, DerefMut};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarId(u32);

impl CalendarId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CalendarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CalendarId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("unknown calendar {0}")]
    UnknownCalendar(CalendarId),

    #[error("calendar {parent} is derived from calendar {calendar} and cannot be its parent")]
    CyclicParent { calendar: CalendarId, parent: CalendarId },

    #[error("calendar {0} still has derived calendars")]
    CalendarInUse(CalendarId),

    #[error("calendar id {0} is already in use")]
    DuplicateCalendar(CalendarId),
}

pub type CalendarResult<T> = Result<T, CalendarError>;

/// Mutable handle to a calendar in a [`ProjectCalendars`] set.
///
/// Derived data held by the calendar and by every calendar derived from it
/// has already been discarded when the handle is created.
#[derive(Debug)]
pub struct CalendarMut<'a> {
    calendar: &'a mut ProjectCalendar,
}

impl Deref for CalendarMut<'_> {
    type Target = ProjectCalendar;

    fn deref(&self) -> &Self::Target {
        self.calendar
    }
}

impl DerefMut for CalendarMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.calendar
    }
}

/// The calendars of one project, addressed by id, with a parent to
/// children index.
#[derive(Debug, Clone)]
pub struct ProjectCalendars {
    settings: ProjectSettings,
    calendars: BTreeMap<CalendarId, ProjectCalendar>,
    children: BTreeMap<CalendarId, BTreeSet<CalendarId>>,
    next_id: u32,
}

impl Default for ProjectCalendars {
    fn default() -> Self {
        Self::new(ProjectSettings::default())
    }
}

impl ProjectCalendars {
    pub fn new(settings: ProjectSettings) -> Self {
        Self {
            settings,
            calendars: BTreeMap::new(),
            children: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    /// Replace the project settings, discarding all derived calendar data.
    pub fn set_settings(&mut self, settings: ProjectSettings) {
        self.settings = settings;
        for calendar in self.calendars.values_mut() {
            calendar.clear_cache();
        }
    }

    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }

    pub fn contains(&self, id: CalendarId) -> bool {
        self.calendars.contains_key(&id)
    }

    pub fn calendar(&self, id: CalendarId) -> Option<CalendarRef<'_>> {
        self.calendars.get(&id).map(|calendar| CalendarRef::new(self, calendar))
    }

    pub fn try_calendar(&self, id: CalendarId) -> CalendarResult<CalendarRef<'_>> {
        self.calendar(id).ok_or(CalendarError::UnknownCalendar(id))
    }

    pub fn calendar_by_name(&self, name: &str) -> Option<CalendarRef<'_>> {
        self.calendars
            .values()
            .find(|calendar| calendar.name() == Some(name))
            .map(|calendar| CalendarRef::new(self, calendar))
    }

    pub fn iter(&self) -> impl Iterator<Item = CalendarRef<'_>> {
        self.calendars.values().map(move |calendar| CalendarRef::new(self, calendar))
    }

    /// Borrow a calendar for modification.
    pub fn calendar_mut(&mut self, id: CalendarId) -> Option<CalendarMut<'_>> {
        if !self.calendars.contains_key(&id) {
            return None;
        }
        self.invalidate(id);
        self.calendars.get_mut(&id).map(|calendar| CalendarMut { calendar })
    }

    pub fn try_calendar_mut(&mut self, id: CalendarId) -> CalendarResult<CalendarMut<'_>> {
        self.calendar_mut(id).ok_or(CalendarError::UnknownCalendar(id))
    }

    /// Add an empty, unnamed root calendar.
    pub fn add_calendar(&mut self) -> CalendarMut<'_> {
        let id = self.allocate_id();
        let calendar = self.calendars.entry(id).or_insert_with(|| ProjectCalendar::new(id));
        CalendarMut { calendar }
    }

    /// Add a calendar built elsewhere, keeping its id and parent link.
    pub fn insert_calendar(&mut self, calendar: ProjectCalendar) -> CalendarResult<CalendarId> {
        let id = calendar.id();
        if self.calendars.contains_key(&id) {
            return Err(CalendarError::DuplicateCalendar(id));
        }
        if let Some(parent) = calendar.parent_id() {
            if !self.calendars.contains_key(&parent) {
                return Err(CalendarError::UnknownCalendar(parent));
            }
            self.children.entry(parent).or_default().insert(id);
        }

        self.next_id = self.next_id.max(id.value().saturating_add(1));
        self.calendars.insert(id, calendar);
        Ok(id)
    }

    /// Add the "Standard" calendar: Monday to Friday, 08:00-12:00 and 13:00-17:00.
    pub fn add_default_base_calendar(&mut self) -> CalendarId {
        let mut calendar = self.add_calendar();
        calendar.set_name(DEFAULT_BASE_CALENDAR_NAME);
        calendar.add_default_calendar_days();
        calendar.add_default_calendar_hours();
        calendar.id()
    }

    /// Add a calendar derived from `parent` with every day set to `Default`.
    pub fn add_default_derived_calendar(&mut self, parent: CalendarId) -> CalendarResult<CalendarId> {
        if !self.calendars.contains_key(&parent) {
            return Err(CalendarError::UnknownCalendar(parent));
        }

        let id = {
            let mut calendar = self.add_calendar();
            for day in ALL_WEEKDAYS {
                calendar.set_calendar_day_type(day, DayType::Default);
            }
            calendar.id()
        };
        self.set_parent(id, Some(parent))?;
        Ok(id)
    }

    /// Re-parent a calendar. Making a calendar its own parent is ignored;
    /// a parent derived from the calendar is rejected.
    pub fn set_parent(&mut self, id: CalendarId, parent: Option<CalendarId>) -> CalendarResult<()> {
        if !self.calendars.contains_key(&id) {
            return Err(CalendarError::UnknownCalendar(id));
        }

        if parent == Some(id) {
            warn!(calendar = %id, "ignoring attempt to make a calendar its own parent");
            return Ok(());
        }

        if let Some(parent) = parent {
            let Some(parent_ref) = self.calendar(parent) else {
                return Err(CalendarError::UnknownCalendar(parent));
            };
            if parent_ref.lineage().any(|ancestor| ancestor.id() == id) {
                return Err(CalendarError::CyclicParent { calendar: id, parent });
            }
        }

        self.invalidate(id);
        let Some(calendar) = self.calendars.get_mut(&id) else {
            return Err(CalendarError::UnknownCalendar(id));
        };
        let previous = calendar.parent_id();
        calendar.set_parent_id(parent);

        if let Some(previous) = previous {
            if let Some(siblings) = self.children.get_mut(&previous) {
                siblings.remove(&id);
            }
        }
        if let Some(parent) = parent {
            self.children.entry(parent).or_default().insert(id);
        }
        Ok(())
    }

    /// Ids of the calendars directly derived from `id`.
    pub fn derived_calendar_ids(&self, id: CalendarId) -> Vec<CalendarId> {
        self.children
            .get(&id)
            .map(|children| children.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Remove a calendar that has no derived calendars.
    pub fn remove_calendar(&mut self, id: CalendarId) -> CalendarResult<ProjectCalendar> {
        if self.children.get(&id).is_some_and(|children| !children.is_empty()) {
            return Err(CalendarError::CalendarInUse(id));
        }

        let calendar = self.calendars.remove(&id).ok_or(CalendarError::UnknownCalendar(id))?;
        self.children.remove(&id);
        if let Some(parent) = calendar.parent_id() {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.remove(&id);
            }
        }
        debug!(calendar = %id, "removed calendar");
        Ok(calendar)
    }

    /// Discard derived data for `id` and every calendar derived from it,
    /// directly or transitively.
    pub fn invalidate(&self, id: CalendarId) {
        let mut queue = VecDeque::from([id]);
        let mut visited = BTreeSet::new();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(calendar) = self.calendars.get(&current) {
                calendar.clear_shared_cache();
            }
            if let Some(children) = self.children.get(&current) {
                queue.extend(children.iter().copied());
            }
        }

        debug!(calendar = %id, descendants = visited.len() - 1, "invalidated calendar caches");
    }

    fn allocate_id(&mut self) -> CalendarId {
        while self.calendars.contains_key(&CalendarId(self.next_id)) {
            self.next_id = self.next_id.saturating_add(1);
        }
        let id = CalendarId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }
}
