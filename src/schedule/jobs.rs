use serde::Serialize;

/// How often a job fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    EveryMinutes(u32),
    EveryHours(u32),
    /// Once per listed hour, at `minute` past.
    Daily { hours: Vec<u8>, minute: u8 },
}

impl Cadence {
    pub fn daily_at(hour: u8, minute: u8) -> Self {
        Cadence::Daily {
            hours: vec![hour],
            minute,
        }
    }

    pub fn cron_expression(&self) -> String {
        match self {
            Cadence::EveryMinutes(1) => "* * * * *".to_string(),
            Cadence::EveryMinutes(n) => format!("*/{} * * * *", n),
            Cadence::EveryHours(1) => "0 * * * *".to_string(),
            Cadence::EveryHours(n) => format!("0 */{} * * *", n),
            Cadence::Daily { hours, minute } => {
                let hours = hours
                    .iter()
                    .map(|h| h.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{} {} * * *", minute, hours)
            }
        }
    }

    /// Fixed interval in seconds, for interval cadences only.
    pub fn interval_secs(&self) -> Option<u64> {
        match self {
            Cadence::EveryMinutes(n) => Some(u64::from(*n) * 60),
            Cadence::EveryHours(n) => Some(u64::from(*n) * 3600),
            Cadence::Daily { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledJob {
    pub name: String,
    pub script: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    pub cadence: Cadence,
}

impl ScheduledJob {
    pub fn new(name: impl Into<String>, script: impl Into<String>, cadence: Cadence) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
            args: Vec::new(),
            cadence,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// The automation jobs and their documented cadence.
pub fn default_jobs() -> Vec<ScheduledJob> {
    vec![
        ScheduledJob::new("monitor", "monitor.py", Cadence::EveryMinutes(5)),
        ScheduledJob::new("proactive-comms", "proactive_comms.py", Cadence::EveryHours(1))
            .with_args(["check"]),
        ScheduledJob::new("decision-engine", "decision_engine.py", Cadence::EveryHours(2))
            .with_args(["run"]),
        ScheduledJob::new("morning-surprise", "morning_surprise.py", Cadence::daily_at(8, 0)),
        ScheduledJob::new("nightly-digest", "nightly_digest.py", Cadence::daily_at(22, 0)),
        ScheduledJob::new(
            "orchestrator",
            "orchestrator.py",
            Cadence::Daily {
                hours: vec![9, 14, 20],
                minute: 0,
            },
        )
        .with_args(["check"]),
    ]
}
