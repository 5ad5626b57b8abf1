use crate::calendar::exception::CalendarException;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use lru::LruCache;
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Maximum number of `(start, end)` working time results kept per calendar.
pub const WORKING_TIME_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(4096) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

/// Memo of the most recent forward date calculation, replaced as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DateMemo {
    pub start: NaiveDateTime,
    pub remaining: i64,
    pub result: NaiveDateTime,
}

/// Derived data a calendar keeps between queries. Everything here is
/// dropped whenever the calendar or one of its ancestors changes.
pub(crate) struct CalendarCache {
    pub working_time: LruCache<(NaiveDateTime, NaiveDateTime), i64>,
    pub start_times: HashMap<NaiveDate, NaiveTime>,
    pub date_memo: Option<DateMemo>,
    pub expanded_exceptions: Option<Arc<Vec<CalendarException>>>,
}

impl CalendarCache {
    pub fn new() -> Self {
        Self {
            working_time: LruCache::new(WORKING_TIME_CACHE_CAPACITY),
            start_times: HashMap::new(),
            date_memo: None,
            expanded_exceptions: None,
        }
    }

    pub fn clear(&mut self) {
        self.working_time.clear();
        self.start_times.clear();
        self.date_memo = None;
        self.expanded_exceptions = None;
    }

    pub fn is_empty(&self) -> bool {
        self.working_time.is_empty()
            && self.start_times.is_empty()
            && self.date_memo.is_none()
            && self.expanded_exceptions.is_none()
    }
}

impl Default for CalendarCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CalendarCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarCache")
            .field("working_time", &self.working_time.len())
            .field("start_times", &self.start_times.len())
            .field("date_memo", &self.date_memo)
            .field("expanded_exceptions", &self.expanded_exceptions.as_ref().map(|e| e.len()))
            .finish()
    }
}
