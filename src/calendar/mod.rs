//! Calendar projection of a scoped task list.

pub mod buckets;
pub mod month;
pub mod projector;

pub use buckets::{bucket_by_date, tasks_on, DayCell, MonthBuckets, PILL_LIMIT};
pub use month::{bucket_date, epoch_id_date, UndatedPolicy, YearMonth};
pub use projector::{CalendarCommand, CalendarProjector, CalendarView, DayDetail, Navigation};
