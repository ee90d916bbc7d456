/// One entry of a selection control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// Submitted value; `""` for placeholders
    pub value: String,
    pub label: String,
    /// A disabled option is shown but cannot be chosen
    pub disabled: bool,
}

/// A headless `<select>`: ordered options plus the chosen values.
///
/// A single-valued control holds at most one selected value. A multi-valued
/// control keeps its selections in the order they were made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectControl {
    pub options: Vec<SelectOption>,
    pub selected: Vec<String>,
    pub multiple: bool,
    /// Locked controls keep their selection and reject changes
    pub locked: bool,
}

impl SelectControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_multiple() -> Self {
        SelectControl {
            multiple: true,
            ..Self::default()
        }
    }

    /// Remove every option. Selections are kept until
    /// [`retain_valid_selection`](Self::retain_valid_selection) runs.
    pub fn clear_options(&mut self) {
        self.options.clear();
    }

    pub fn push_option(&mut self, value: impl Into<String>, label: impl Into<String>) {
        self.options.push(SelectOption {
            value: value.into(),
            label: label.into(),
            disabled: false,
        });
    }

    pub fn push_placeholder(&mut self, label: impl Into<String>, disabled: bool) {
        self.options.push(SelectOption {
            value: String::new(),
            label: label.into(),
            disabled,
        });
    }

    pub fn labels(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.value.as_str()).collect()
    }

    fn is_choosable(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value && !o.disabled)
    }

    /// Choose `value`. Returns false (and changes nothing) when the value is
    /// not an enabled option or the control is locked.
    pub fn select(&mut self, value: &str) -> bool {
        if self.locked || !self.is_choosable(value) {
            return false;
        }
        if self.multiple {
            if value.is_empty() {
                // the placeholder of a multi-select means "none"
                self.selected.clear();
            } else if !self.selected.iter().any(|v| v == value) {
                self.selected.push(value.to_string());
            }
        } else {
            self.selected = vec![value.to_string()];
        }
        true
    }

    /// Set the selection without checking it against the options, as when
    /// pre-filling an edit form before population.
    pub fn preselect(&mut self, values: impl IntoIterator<Item = String>) {
        self.selected = values.into_iter().filter(|v| !v.is_empty()).collect();
        if !self.multiple {
            self.selected.truncate(1);
        }
    }

    pub fn deselect_all(&mut self) {
        if !self.locked {
            self.selected.clear();
        }
    }

    /// Drop selected values that no longer name an option
    pub fn retain_valid_selection(&mut self) {
        let options = &self.options;
        self.selected
            .retain(|v| options.iter().any(|o| o.value == *v && !v.is_empty()));
    }

    /// The single chosen value, if any (placeholders count as none)
    pub fn selected_value(&self) -> Option<&str> {
        self.selected
            .first()
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }
}
