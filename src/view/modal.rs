use std::fmt;

use log::debug;

use crate::form::{MemberForm, ProjectForm, ReportForm, TaskForm};

/// Lifecycle of a modal dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Hidden,
    /// Populating controls and pre-filling fields
    Opening,
    Visible,
    /// Committed or cancelled; waiting for refreshes to finish
    Closing,
}

impl ModalPhase {
    fn can_move_to(self, to: ModalPhase) -> bool {
        matches!(
            (self, to),
            (ModalPhase::Hidden, ModalPhase::Opening)
                | (ModalPhase::Opening, ModalPhase::Visible)
                | (ModalPhase::Visible, ModalPhase::Closing)
                | (ModalPhase::Closing, ModalPhase::Hidden)
        )
    }
}

impl fmt::Display for ModalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModalPhase::Hidden => "hidden",
            ModalPhase::Opening => "opening",
            ModalPhase::Visible => "visible",
            ModalPhase::Closing => "closing",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Task,
    Project,
    Member,
    Report,
}

impl fmt::Display for ModalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModalKind::Task => "task",
            ModalKind::Project => "project",
            ModalKind::Member => "team member",
            ModalKind::Report => "daily report",
        };
        f.write_str(s)
    }
}

/// Error type for modal operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModalError {
    #[error("illegal modal transition {from} -> {to}")]
    IllegalTransition { from: ModalPhase, to: ModalPhase },
    #[error("no modal is open")]
    NotOpen,
    #[error("the open modal is a {actual} form, not a {expected} form")]
    WrongKind {
        expected: ModalKind,
        actual: ModalKind,
    },
}

/// The form hosted by the open modal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalForm {
    Task(TaskForm),
    Project(ProjectForm),
    Member(MemberForm),
    Report(ReportForm),
}

impl ModalForm {
    pub fn kind(&self) -> ModalKind {
        match self {
            ModalForm::Task(_) => ModalKind::Task,
            ModalForm::Project(_) => ModalKind::Project,
            ModalForm::Member(_) => ModalKind::Member,
            ModalForm::Report(_) => ModalKind::Report,
        }
    }
}

/// The single modal slot. At most one form is hosted at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    phase: ModalPhase,
    form: Option<ModalForm>,
}

impl Default for Modal {
    fn default() -> Self {
        Modal {
            phase: ModalPhase::Hidden,
            form: None,
        }
    }
}

impl Modal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ModalPhase {
        self.phase
    }

    pub fn is_visible(&self) -> bool {
        self.phase == ModalPhase::Visible
    }

    pub fn form(&self) -> Option<&ModalForm> {
        self.form.as_ref()
    }

    pub fn kind(&self) -> Option<ModalKind> {
        self.form.as_ref().map(ModalForm::kind)
    }

    /// Move to `to`, rejecting anything outside the fixed cycle
    pub fn transition(&mut self, to: ModalPhase) -> Result<(), ModalError> {
        if !self.phase.can_move_to(to) {
            return Err(ModalError::IllegalTransition {
                from: self.phase,
                to,
            });
        }
        debug!("modal {} -> {}", self.phase, to);
        self.phase = to;
        if to == ModalPhase::Hidden {
            self.form = None;
        }
        Ok(())
    }

    /// Hidden -> Opening with `form` attached
    pub fn begin_open(&mut self, form: ModalForm) -> Result<(), ModalError> {
        self.transition(ModalPhase::Opening)?;
        self.form = Some(form);
        Ok(())
    }

    /// The hosted form while opening or visible
    pub fn form_mut(&mut self) -> Result<&mut ModalForm, ModalError> {
        match self.phase {
            ModalPhase::Opening | ModalPhase::Visible => {
                self.form.as_mut().ok_or(ModalError::NotOpen)
            }
            _ => Err(ModalError::NotOpen),
        }
    }

    /// Visible -> Closing -> Hidden, discarding the form
    pub fn close(&mut self) -> Result<(), ModalError> {
        if self.phase != ModalPhase::Visible {
            return Err(ModalError::NotOpen);
        }
        self.transition(ModalPhase::Closing)?;
        self.transition(ModalPhase::Hidden)
    }

    pub fn task_form_mut(&mut self) -> Result<&mut TaskForm, ModalError> {
        match self.form_mut()? {
            ModalForm::Task(f) => Ok(f),
            other => Err(ModalError::WrongKind {
                expected: ModalKind::Task,
                actual: other.kind(),
            }),
        }
    }

    pub fn project_form_mut(&mut self) -> Result<&mut ProjectForm, ModalError> {
        match self.form_mut()? {
            ModalForm::Project(f) => Ok(f),
            other => Err(ModalError::WrongKind {
                expected: ModalKind::Project,
                actual: other.kind(),
            }),
        }
    }

    pub fn member_form_mut(&mut self) -> Result<&mut MemberForm, ModalError> {
        match self.form_mut()? {
            ModalForm::Member(f) => Ok(f),
            other => Err(ModalError::WrongKind {
                expected: ModalKind::Member,
                actual: other.kind(),
            }),
        }
    }

    pub fn report_form_mut(&mut self) -> Result<&mut ReportForm, ModalError> {
        match self.form_mut()? {
            ModalForm::Report(f) => Ok(f),
            other => Err(ModalError::WrongKind {
                expected: ModalKind::Report,
                actual: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle() {
        let mut modal = Modal::new();
        modal.begin_open(ModalForm::Project(ProjectForm::new())).unwrap();
        assert_eq!(modal.phase(), ModalPhase::Opening);
        modal.transition(ModalPhase::Visible).unwrap();
        assert_eq!(modal.kind(), Some(ModalKind::Project));
        modal.close().unwrap();
        assert_eq!(modal.phase(), ModalPhase::Hidden);
        assert!(modal.form().is_none());
    }

    #[test]
    fn skipping_a_phase_is_rejected() {
        let mut modal = Modal::new();
        assert_eq!(
            modal.transition(ModalPhase::Visible),
            Err(ModalError::IllegalTransition {
                from: ModalPhase::Hidden,
                to: ModalPhase::Visible,
            })
        );
        modal.begin_open(ModalForm::Task(TaskForm::new())).unwrap();
        assert!(modal.transition(ModalPhase::Closing).is_err());
        assert!(matches!(
            modal.begin_open(ModalForm::Task(TaskForm::new())),
            Err(ModalError::IllegalTransition { .. })
        ));
    }

    #[test]
    fn closing_a_hidden_modal_is_an_error() {
        let mut modal = Modal::new();
        assert_eq!(modal.close(), Err(ModalError::NotOpen));
        assert_eq!(modal.form_mut().err(), Some(ModalError::NotOpen));
    }

    #[test]
    fn typed_form_access_checks_kind() {
        let mut modal = Modal::new();
        modal.begin_open(ModalForm::Member(MemberForm::new())).unwrap();
        modal.transition(ModalPhase::Visible).unwrap();
        assert!(modal.member_form_mut().is_ok());
        assert_eq!(
            modal.task_form_mut().err(),
            Some(ModalError::WrongKind {
                expected: ModalKind::Task,
                actual: ModalKind::Member,
            })
        );
        let err = modal.report_form_mut().err().unwrap();
        assert_eq!(
            err.to_string(),
            "the open modal is a team member form, not a daily report form"
        );
    }
}
