use serde::Serialize;

/// A per-field validation error in the `{param, msg, value}` shape the form
/// pages render.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub param: String,
    pub msg: String,
    pub value: String,
}

/// Collects field checks for one submitted form.
#[derive(Debug, Default)]
pub struct FormCheck {
    errors: Vec<FieldError>,
}

impl FormCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, param: &str, value: &str, msg: &str) -> Self {
        if value.trim().is_empty() {
            self.push(param, msg, value);
        }
        self
    }

    pub fn email(mut self, param: &str, value: &str, msg: &str) -> Self {
        if !is_email(value) {
            self.push(param, msg, value);
        }
        self
    }

    /// Two fields must carry the same value (password confirmation).
    pub fn equals(mut self, param: &str, value: &str, other: &str, msg: &str) -> Self {
        if value != other {
            self.push(param, msg, value);
        }
        self
    }

    /// Report a check done outside the builder, e.g. a uniqueness lookup.
    pub fn custom(mut self, param: &str, failed: bool, value: &str, msg: &str) -> Self {
        if failed {
            self.push(param, msg, value);
        }
        self
    }

    pub fn finish(self) -> Vec<FieldError> {
        self.errors
    }

    fn push(&mut self, param: &str, msg: &str, value: &str) {
        self.errors.push(FieldError {
            param: param.to_string(),
            msg: msg.to_string(),
            value: value.to_string(),
        });
    }
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
