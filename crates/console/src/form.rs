//! Form buffer with declarative field constraints.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use bankconsole_core::{DomainError, DomainResult};
use bankconsole_gateway::EntityKind;

/// Shape of an e-mail address as accepted by the console forms.
///
/// Length limits (254 overall, 64 local part) are checked separately.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+)*@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Empty,
    Text(String),
    /// Reference to another record by id.
    Integer(i64),
    Number(Decimal),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(t) => t.is_empty(),
            FieldValue::Integer(_) | FieldValue::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// How raw input for a field is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Reference,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Required,
    MinLength(usize),
    Email,
    Numeric,
}

impl Constraint {
    /// Empty values only ever fail `Required`.
    fn check(&self, value: &FieldValue) -> bool {
        match self {
            Constraint::Required => !value.is_empty(),
            _ if value.is_empty() => true,
            Constraint::MinLength(min) => value
                .as_text()
                .is_none_or(|t| t.chars().count() >= *min),
            Constraint::Email => value.as_text().is_some_and(is_email),
            Constraint::Numeric => matches!(value, FieldValue::Integer(_) | FieldValue::Number(_)),
        }
    }
}

fn is_email(text: &str) -> bool {
    let Some((local, _)) = text.split_once('@') else {
        return false;
    };
    text.len() <= 254 && local.len() <= 64 && EMAIL.is_match(text)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub constraint: Constraint,
}

impl core::fmt::Display for FieldError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.constraint {
            Constraint::Required => write!(f, "{} is required", self.field),
            Constraint::MinLength(n) => {
                write!(f, "{} must be at least {} characters", self.field, n)
            }
            Constraint::Email => write!(f, "{} must be a valid email address", self.field),
            Constraint::Numeric => write!(f, "{} must be a number", self.field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Control {
    kind: FieldKind,
    value: FieldValue,
    constraints: Vec<Constraint>,
    touched: bool,
}

/// Named controls of one edit form, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormBuffer {
    order: Vec<&'static str>,
    controls: BTreeMap<&'static str, Control>,
}

impl FormBuffer {
    fn empty() -> Self {
        Self {
            order: Vec::new(),
            controls: BTreeMap::new(),
        }
    }

    fn control(
        mut self,
        name: &'static str,
        kind: FieldKind,
        initial: FieldValue,
        constraints: &[Constraint],
    ) -> Self {
        self.order.push(name);
        self.controls.insert(
            name,
            Control {
                kind,
                value: initial,
                constraints: constraints.to_vec(),
                touched: false,
            },
        );
        self
    }

    pub fn for_entity(entity: EntityKind) -> Self {
        match entity {
            EntityKind::Account => Self::account(),
            _ => Self::customer(),
        }
    }

    pub fn customer() -> Self {
        use Constraint::*;
        Self::empty()
            .control("name", FieldKind::Text, FieldValue::text(""), &[Required, MinLength(2)])
            .control("email", FieldKind::Text, FieldValue::text(""), &[Required, Email])
            .control("username", FieldKind::Text, FieldValue::text(""), &[Required, MinLength(3)])
            .control("password", FieldKind::Text, FieldValue::text(""), &[])
            .control("role", FieldKind::Text, FieldValue::text("User"), &[])
    }

    pub fn account() -> Self {
        use Constraint::*;
        Self::empty()
            .control("customer", FieldKind::Reference, FieldValue::Empty, &[Required])
            .control(
                "balance",
                FieldKind::Number,
                FieldValue::Number(Decimal::ZERO),
                &[Required, Numeric],
            )
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.controls.get(name).map(|c| &c.value)
    }

    /// Text content of a field, `""` for anything else.
    pub fn text(&self, name: &str) -> &str {
        self.value(name).and_then(FieldValue::as_text).unwrap_or("")
    }

    pub fn set(&mut self, name: &str, value: FieldValue) -> DomainResult<()> {
        let control = self
            .controls
            .get_mut(name)
            .ok_or_else(|| DomainError::validation(format!("unknown form field {name:?}")))?;
        control.value = value;
        Ok(())
    }

    /// Set a field from raw user input, interpreted per the field's kind.
    ///
    /// Input that does not parse is kept as text so that validation reports it.
    pub fn set_input(&mut self, name: &str, raw: &str) -> DomainResult<()> {
        let kind = self
            .controls
            .get(name)
            .map(|c| c.kind)
            .ok_or_else(|| DomainError::validation(format!("unknown form field {name:?}")))?;
        let raw = raw.trim();
        let value = if raw.is_empty() {
            match kind {
                FieldKind::Text => FieldValue::text(""),
                _ => FieldValue::Empty,
            }
        } else {
            match kind {
                FieldKind::Text => FieldValue::text(raw),
                FieldKind::Reference => raw
                    .parse::<i64>()
                    .map(FieldValue::Integer)
                    .unwrap_or_else(|_| FieldValue::text(raw)),
                FieldKind::Number => raw
                    .parse::<Decimal>()
                    .map(FieldValue::Number)
                    .unwrap_or_else(|_| FieldValue::text(raw)),
            }
        };
        self.set(name, value)
    }

    /// Overwrite several fields at once; unknown names are ignored.
    pub fn patch<'a>(&mut self, values: impl IntoIterator<Item = (&'a str, FieldValue)>) {
        for (name, value) in values {
            if let Some(control) = self.controls.get_mut(name) {
                control.value = value;
            }
        }
    }

    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let errors: Vec<FieldError> = self
            .order
            .iter()
            .filter_map(|name| self.controls.get(name).map(|c| (*name, c)))
            .flat_map(|(field, control)| {
                control
                    .constraints
                    .iter()
                    .filter(|c| !c.check(&control.value))
                    .map(move |c| FieldError {
                        field,
                        constraint: *c,
                    })
            })
            .collect();
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn mark_all_touched(&mut self) {
        for control in self.controls.values_mut() {
            control.touched = true;
        }
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.controls.get(name).is_some_and(|c| c.touched)
    }

    pub fn all_touched(&self) -> bool {
        self.controls.values().all(|c| c.touched)
    }
}
