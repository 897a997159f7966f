use super::jobs::{Cadence, ScheduledJob};
use crate::utils::slugify;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Where the automation scripts live and where their output should go.
#[derive(Debug, Clone)]
pub struct ScheduleTarget {
    pub script_dir: PathBuf,
    pub interpreter: String,
    pub log_dir: PathBuf,
}

impl ScheduleTarget {
    pub fn new(script_dir: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            script_dir: script_dir.into(),
            interpreter: "python3".to_string(),
            log_dir: log_dir.into(),
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    fn script_path(&self, job: &ScheduledJob) -> String {
        self.script_dir.join(&job.script).display().to_string()
    }

    fn log_path(&self, job: &ScheduledJob) -> String {
        self.log_dir
            .join(format!("{}.log", job.name))
            .display()
            .to_string()
    }
}

pub fn launchd_label(job: &ScheduledJob) -> String {
    format!("com.shared-brain.{}", slugify(&job.name, "job"))
}

/// One crontab line per job, appending stdout and stderr to the job log.
pub fn render_crontab(jobs: &[ScheduledJob], target: &ScheduleTarget) -> String {
    let mut out = String::from("# shared brain automation\n");
    for job in jobs {
        let mut command = format!("{} {}", target.interpreter, target.script_path(job));
        for arg in &job.args {
            command.push(' ');
            command.push_str(arg);
        }
        let _ = writeln!(
            out,
            "{} {} >> {} 2>&1",
            job.cadence.cron_expression(),
            command,
            target.log_path(job)
        );
    }
    out
}

/// A launchd property list for a single job.
pub fn render_launchd(job: &ScheduledJob, target: &ScheduleTarget) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n");
    out.push_str("<plist version=\"1.0\">\n<dict>\n");
    key_string(&mut out, "Label", &launchd_label(job));

    out.push_str("    <key>ProgramArguments</key>\n    <array>\n");
    let program = [target.interpreter.clone(), target.script_path(job)];
    for arg in program.iter().chain(job.args.iter()) {
        let _ = writeln!(out, "        <string>{}</string>", xml_escape(arg));
    }
    out.push_str("    </array>\n");

    match &job.cadence {
        Cadence::Daily { hours, minute } => {
            out.push_str("    <key>StartCalendarInterval</key>\n");
            if let [hour] = hours.as_slice() {
                calendar_entry(&mut out, "    ", *hour, *minute);
            } else {
                out.push_str("    <array>\n");
                for hour in hours {
                    calendar_entry(&mut out, "        ", *hour, *minute);
                }
                out.push_str("    </array>\n");
            }
        }
        cadence => {
            let secs = cadence.interval_secs().unwrap_or(3600);
            let _ = writeln!(
                out,
                "    <key>StartInterval</key>\n    <integer>{}</integer>",
                secs
            );
        }
    }

    let log = target.log_path(job);
    key_string(&mut out, "StandardOutPath", &log);
    key_string(&mut out, "StandardErrorPath", &log);
    out.push_str("</dict>\n</plist>\n");
    out
}

fn key_string(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(
        out,
        "    <key>{}</key>\n    <string>{}</string>",
        key,
        xml_escape(value)
    );
}

fn calendar_entry(out: &mut String, indent: &str, hour: u8, minute: u8) {
    let _ = writeln!(
        out,
        "{i}<dict>\n{i}    <key>Hour</key>\n{i}    <integer>{h}</integer>\n{i}    <key>Minute</key>\n{i}    <integer>{m}</integer>\n{i}</dict>",
        i = indent,
        h = hour,
        m = minute
    );
}

fn xml_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::default_jobs;

    fn target() -> ScheduleTarget {
        ScheduleTarget::new("/opt/brain/scripts", "/var/log/brain")
    }

    fn job(name: &str) -> ScheduledJob {
        default_jobs().into_iter().find(|j| j.name == name).unwrap()
    }

    #[test]
    fn crontab_has_one_line_per_job() {
        let tab = render_crontab(&default_jobs(), &target());
        let lines: Vec<_> = tab.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(lines.len(), default_jobs().len());
        assert!(lines.contains(
            &"0 */2 * * * python3 /opt/brain/scripts/decision_engine.py run >> /var/log/brain/decision-engine.log 2>&1"
        ));
        assert!(lines.contains(
            &"*/5 * * * * python3 /opt/brain/scripts/monitor.py >> /var/log/brain/monitor.log 2>&1"
        ));
    }

    #[test]
    fn interpreter_is_configurable() {
        let target = target().with_interpreter("/usr/local/bin/python3.12");
        let tab = render_crontab(&[job("monitor")], &target);
        assert!(tab.contains("/usr/local/bin/python3.12 /opt/brain/scripts/monitor.py"));
    }

    #[test]
    fn launchd_interval_job() {
        let plist = render_launchd(&job("monitor"), &target());
        assert!(plist.contains("<string>com.shared-brain.monitor</string>"));
        assert!(plist.contains("<key>StartInterval</key>\n    <integer>300</integer>"));
        assert!(!plist.contains("StartCalendarInterval"));
        assert!(plist.contains("<string>/var/log/brain/monitor.log</string>"));
    }

    #[test]
    fn launchd_calendar_jobs() {
        let single = render_launchd(&job("nightly-digest"), &target());
        assert!(single.contains("<key>StartCalendarInterval</key>\n    <dict>"));
        assert!(single.contains("<integer>22</integer>"));

        let multi = render_launchd(&job("orchestrator"), &target());
        assert!(multi.contains("<key>StartCalendarInterval</key>\n    <array>"));
        assert_eq!(multi.matches("<key>Hour</key>").count(), 3);
        assert!(multi.contains("<string>check</string>"));
    }

    #[test]
    fn escapes_markup_in_paths() {
        let target = ScheduleTarget::new("/tmp/a&b", "/tmp/<logs>");
        let plist = render_launchd(&job("monitor"), &target);
        assert!(plist.contains("/tmp/a&amp;b/monitor.py"));
        assert!(plist.contains("/tmp/&lt;logs&gt;/monitor.log"));
    }
}
