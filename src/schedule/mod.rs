mod jobs;
mod render;

pub use jobs::{default_jobs, Cadence, ScheduledJob};
pub use render::{launchd_label, render_crontab, render_launchd, ScheduleTarget};
