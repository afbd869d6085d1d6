use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub customer_name: String,
    pub start_time: String,
    pub link: String,
}

/// Response body of the reminders endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderEnvelope {
    #[serde(default)]
    pub success: bool,
    pub data: Option<Vec<Reminder>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchResult {
    pub succeeded: usize,
    pub failed: usize,
}

impl DispatchResult {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn record(&mut self, sent: bool) {
        if sent {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The backend had no reminders for the date.
    NothingToDo,
    /// The operator declined at the confirmation prompt.
    Declined,
    Completed(DispatchResult),
    Interrupted(DispatchResult),
}

impl RunOutcome {
    pub fn tally(&self) -> DispatchResult {
        match self {
            RunOutcome::Completed(result) | RunOutcome::Interrupted(result) => *result,
            RunOutcome::NothingToDo | RunOutcome::Declined => DispatchResult::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLink {
    pub phone: String,
    pub message: String,
}
