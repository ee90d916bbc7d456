pub mod controller;
pub mod modal;
pub mod pages;
pub mod registry;

pub use controller::{Controller, ControllerError, Tab};
pub use modal::{Modal, ModalError, ModalForm, ModalKind, ModalPhase};
pub use pages::View;
pub use registry::{Topic, ViewId, ViewRegistry};
