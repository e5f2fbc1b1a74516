//! Task-creation form as an explicit state machine.
//!
//! # State Machine
//! ```text
//! Pristine -> Editing <-> Invalid
//!                \-> Valid -> Submitting -> Submitted
//!                                      \-> Editing (creation failed)
//! ```
//!
//! # Invariants
//! - `values.name` never exceeds [`NAME_MAX_LEN`] characters; extra input is
//!   dropped at edit time
//! - `errors` only holds keys for rules that currently fail
//! - While `Submitting`, every edit, reset and submit is refused

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::create::{CreateError, TaskCreator};
use crate::task::{NewTask, Priority, Task};

/// Longest accepted task name, in characters.
pub const NAME_MAX_LEN: usize = 255;

pub const NAME_REQUIRED: &str = "Task name is required";
pub const DATES_INVALID: &str = "End date must be after start date";
pub const PRIORITY_REQUIRED: &str = "Priority is required";

/// Key under which an error message is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKey {
    Name,
    /// Cross-field rule on start/end date.
    Dates,
    Priority,
    /// The creation step failed after validation passed.
    Submit,
}

/// Currently failing rules, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<ErrorKey, String>);

impl FormErrors {
    pub fn get(&self, key: ErrorKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: ErrorKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = ErrorKey> + '_ {
        self.0.keys().copied()
    }

    /// Store `message` under `key`, or drop the key when the rule passes.
    fn set(&mut self, key: ErrorKey, message: Option<String>) {
        match message {
            Some(message) => {
                self.0.insert(key, message);
            }
            None => {
                self.0.remove(&key);
            }
        }
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

/// Field values of the creation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormValues {
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            name: String::new(),
            start_date: None,
            end_date: None,
            priority: Some(Priority::Normal),
        }
    }
}

/// A single user input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Name(String),
    StartDate(Option<NaiveDate>),
    EndDate(Option<NaiveDate>),
    /// `None` is the empty "Select priority" choice.
    Priority(Option<Priority>),
}

/// Where the form is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    Pristine,
    Editing,
    Valid,
    Invalid,
    Submitting,
    Submitted,
}

/// Success toast shown after a task is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

impl Notification {
    fn task_created(task: &Task) -> Self {
        Self {
            title: "Task created".to_string(),
            description: format!("Task \"{}\" has been created successfully.", task.name()),
        }
    }
}

/// A successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Created {
    pub task: Task,
    pub notification: Notification,
}

/// Refused transitions and failed submissions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("A submission is already in progress")]
    Busy,

    #[error("Form has {} invalid field(s)", .0.len())]
    Invalid(FormErrors),

    #[error("No submission is in progress")]
    NotSubmitting,

    #[error(transparent)]
    Create(#[from] CreateError),
}

fn name_error(name: &str) -> Option<String> {
    name.trim().is_empty().then(|| NAME_REQUIRED.to_string())
}

/// Equal dates pass; an end before the start fails. Only checked when both are set.
fn dates_error(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<String> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Some(DATES_INVALID.to_string()),
        _ => None,
    }
}

fn priority_error(priority: Option<Priority>) -> Option<String> {
    priority.is_none().then(|| PRIORITY_REQUIRED.to_string())
}

/// Keep at most [`NAME_MAX_LEN`] characters.
fn clamp_name(mut name: String) -> String {
    if let Some((byte_index, _)) = name.char_indices().nth(NAME_MAX_LEN) {
        name.truncate(byte_index);
    }
    name
}

/// The creation form: values, errors and phase.
#[derive(Debug, Clone)]
pub struct TaskForm {
    values: FormValues,
    errors: FormErrors,
    phase: FormPhase,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskForm {
    pub fn new() -> Self {
        Self {
            values: FormValues::default(),
            errors: FormErrors::default(),
            phase: FormPhase::Pristine,
        }
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// Submit, reset and back-navigation are disabled while submitting.
    pub fn controls_disabled(&self) -> bool {
        self.phase == FormPhase::Submitting
    }

    fn ensure_idle(&self) -> Result<(), FormError> {
        if self.phase == FormPhase::Submitting {
            return Err(FormError::Busy);
        }
        Ok(())
    }

    /// Apply one input event and re-check only the rules it touches.
    ///
    /// A date edit re-runs the date-order rule whichever date changed.
    ///
    /// # Errors
    /// `FormError::Busy` while a submission is in flight.
    pub fn apply_edit(&mut self, edit: FieldEdit) -> Result<(), FormError> {
        self.ensure_idle()?;

        match edit {
            FieldEdit::Name(name) => {
                self.values.name = clamp_name(name);
                self.errors.set(ErrorKey::Name, name_error(&self.values.name));
            }
            FieldEdit::StartDate(date) => {
                self.values.start_date = date;
                self.errors.set(
                    ErrorKey::Dates,
                    dates_error(self.values.start_date, self.values.end_date),
                );
            }
            FieldEdit::EndDate(date) => {
                self.values.end_date = date;
                self.errors.set(
                    ErrorKey::Dates,
                    dates_error(self.values.start_date, self.values.end_date),
                );
            }
            FieldEdit::Priority(priority) => {
                self.values.priority = priority;
                self.errors
                    .set(ErrorKey::Priority, priority_error(self.values.priority));
            }
        }

        self.phase = if self.has_rule_errors() {
            FormPhase::Invalid
        } else {
            FormPhase::Editing
        };
        Ok(())
    }

    fn has_rule_errors(&self) -> bool {
        self.errors.keys().any(|key| key != ErrorKey::Submit)
    }

    /// Run every rule, collecting all failures at once.
    ///
    /// Leaves the form `Valid` or `Invalid`. Clears any earlier submit error.
    ///
    /// # Errors
    /// `FormError::Busy` while a submission is in flight.
    pub fn validate(&mut self) -> Result<bool, FormError> {
        self.ensure_idle()?;

        self.errors.clear();
        self.errors.set(ErrorKey::Name, name_error(&self.values.name));
        self.errors.set(
            ErrorKey::Dates,
            dates_error(self.values.start_date, self.values.end_date),
        );
        self.errors
            .set(ErrorKey::Priority, priority_error(self.values.priority));

        let valid = self.errors.is_empty();
        self.phase = if valid {
            FormPhase::Valid
        } else {
            FormPhase::Invalid
        };
        Ok(valid)
    }

    /// Validate and, when everything passes, enter `Submitting`.
    ///
    /// # Postcondition
    /// On `Ok`, `phase() == Submitting` and the returned payload is the
    /// validated form content with the name trimmed.
    ///
    /// # Errors
    /// - `FormError::Busy` while a submission is in flight
    /// - `FormError::Invalid` carrying every failing rule
    pub fn apply_submit(&mut self) -> Result<NewTask, FormError> {
        if !self.validate()? {
            return Err(FormError::Invalid(self.errors.clone()));
        }

        let priority = match self.values.priority {
            Some(priority) => priority,
            None => return Err(FormError::Invalid(self.errors.clone())),
        };

        self.phase = FormPhase::Submitting;
        Ok(NewTask {
            name: self.values.name.trim().to_string(),
            start_date: self.values.start_date,
            end_date: self.values.end_date,
            priority,
        })
    }

    /// Finish the in-flight submission with the creator's answer.
    ///
    /// Success resets the values and yields the task with its notification. Failure returns
    /// to `Editing` with the values kept and the reason under `ErrorKey::Submit`.
    ///
    /// # Errors
    /// - `FormError::NotSubmitting` when called outside `Submitting`
    /// - `FormError::Create` with the creator's error
    pub fn complete_submission(
        &mut self,
        outcome: Result<Task, CreateError>,
    ) -> Result<Created, FormError> {
        if self.phase != FormPhase::Submitting {
            return Err(FormError::NotSubmitting);
        }

        match outcome {
            Ok(task) => {
                self.values = FormValues::default();
                self.errors.clear();
                self.phase = FormPhase::Submitted;
                let notification = Notification::task_created(&task);
                Ok(Created { task, notification })
            }
            Err(err) => {
                self.errors.set(ErrorKey::Submit, Some(err.to_string()));
                self.phase = FormPhase::Editing;
                Err(FormError::Create(err))
            }
        }
    }

    /// Return every field to its default and drop all errors.
    ///
    /// # Errors
    /// `FormError::Busy` while a submission is in flight.
    pub fn apply_reset(&mut self) -> Result<(), FormError> {
        self.ensure_idle()?;
        self.values = FormValues::default();
        self.errors.clear();
        self.phase = FormPhase::Pristine;
        Ok(())
    }

    /// Validate, hand the payload to `creator`, and apply its answer.
    ///
    /// The exclusive borrow keeps a single submission in flight per form.
    pub async fn submit_with(
        &mut self,
        creator: &dyn TaskCreator,
    ) -> Result<Created, FormError> {
        let new_task = self.apply_submit()?;
        tracing::info!(name = %new_task.name, priority = %new_task.priority, "Submitting task");

        let outcome = creator.create(new_task).await;
        match &outcome {
            Ok(task) => tracing::info!(task_id = %task.id(), "Task created"),
            Err(e) => {
                tracing::warn!(recoverable = e.is_recoverable(), "Task creation failed: {}", e)
            }
        }
        self.complete_submission(outcome)
    }
}
