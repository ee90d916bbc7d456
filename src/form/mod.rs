pub mod forms;
pub mod populate;
pub mod propagate;
pub mod select;

pub use forms::{FieldError, FormErrors, MemberForm, ProjectForm, ReportForm, TaskForm};
pub use select::{SelectControl, SelectOption};
