//! Declarative rules for incoming product form fields.
//!
//! A [`Schema`] is a static table of field rules. Validation walks every rule
//! and collects one [`ValidationIssue`] per failing field instead of stopping
//! at the first problem, then rejects any field the schema does not name.

use std::{collections::BTreeMap, fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use serde_json::Value;

/// Raw field values as parsed from the request body, keyed by field name.
pub type FormFields = BTreeMap<String, Value>;

pub const MAX_NAME_LEN: usize = 255;
pub const PRICE_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text { max_len: Option<usize> },
    Decimal { scale: u32 },
    /// Text stand-in for a file part. Checked like text, never stored.
    Upload,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
}

#[derive(Debug)]
pub struct Schema {
    pub rules: &'static [FieldRule],
}

pub static CREATE_PRODUCT: Schema = Schema {
    rules: &[
        FieldRule {
            name: "name",
            kind: FieldKind::Text {
                max_len: Some(MAX_NAME_LEN),
            },
            presence: Presence::Required,
        },
        FieldRule {
            name: "description",
            kind: FieldKind::Text { max_len: None },
            presence: Presence::Required,
        },
        FieldRule {
            name: "price",
            kind: FieldKind::Decimal { scale: PRICE_SCALE },
            presence: Presence::Required,
        },
        FieldRule {
            name: "imageFile",
            kind: FieldKind::Upload,
            presence: Presence::Optional,
        },
    ],
};

pub static EDIT_PRODUCT: Schema = Schema {
    rules: &[
        FieldRule {
            name: "name",
            kind: FieldKind::Text {
                max_len: Some(MAX_NAME_LEN),
            },
            presence: Presence::Optional,
        },
        FieldRule {
            name: "description",
            kind: FieldKind::Text { max_len: None },
            presence: Presence::Optional,
        },
        FieldRule {
            name: "price",
            kind: FieldKind::Decimal { scale: PRICE_SCALE },
            presence: Presence::Optional,
        },
        FieldRule {
            name: "imageFile",
            kind: FieldKind::Upload,
            presence: Presence::Optional,
        },
    ],
};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Decimal(Decimal),
}

/// Field values that passed a schema, already coerced to their rule's type.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidatedFields {
    values: BTreeMap<&'static str, FieldValue>,
}

impl ValidatedFields {
    pub fn take_text(&mut self, name: &str) -> Option<String> {
        match self.values.remove(name) {
            Some(FieldValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn decimal(&self, name: &str) -> Option<Decimal> {
        match self.values.get(name) {
            Some(FieldValue::Decimal(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueContext {
    pub label: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub message: String,
    pub path: Vec<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub context: IssueContext,
}

impl ValidationIssue {
    fn new(field: &str, kind: &'static str, value: Option<&Value>) -> Self {
        let message = match kind {
            "any.required" => format!("\"{}\" is required", field),
            "string.base" => format!("\"{}\" must be a string", field),
            "string.empty" => format!("\"{}\" is not allowed to be empty", field),
            "number.base" => format!("\"{}\" must be a number", field),
            "number.infinity" => format!("\"{}\" cannot be infinity", field),
            "object.unknown" => format!("\"{}\" is not allowed", field),
            _ => format!("\"{}\" is invalid", field),
        };

        Self {
            message,
            path: vec![field.to_string()],
            kind,
            context: IssueContext {
                label: field.to_string(),
                key: field.to_string(),
                limit: None,
                value: value.cloned(),
            },
        }
    }

    fn too_long(field: &str, limit: usize, value: &Value) -> Self {
        Self {
            message: format!(
                "\"{}\" length must be less than or equal to {} characters long",
                field, limit
            ),
            path: vec![field.to_string()],
            kind: "string.max",
            context: IssueContext {
                label: field.to_string(),
                key: field.to_string(),
                limit: Some(limit),
                value: Some(value.clone()),
            },
        }
    }

    pub fn field(&self) -> &str {
        &self.context.key
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationIssue>);

impl ValidationErrors {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(ValidationIssue::field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|i| i.message.as_str()).collect();
        write!(f, "{}", messages.join(". "))
    }
}

impl std::error::Error for ValidationErrors {}

impl Schema {
    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    pub fn validate(&self, fields: &FormFields) -> Result<ValidatedFields, ValidationErrors> {
        let mut validated = ValidatedFields::default();
        let mut issues = Vec::new();

        for rule in self.rules {
            let Some(raw) = fields.get(rule.name) else {
                if rule.presence == Presence::Required {
                    issues.push(ValidationIssue::new(rule.name, "any.required", None));
                }
                continue;
            };

            match check_field(rule, raw) {
                Ok(Some(value)) => {
                    validated.values.insert(rule.name, value);
                }
                Ok(None) => {}
                Err(issue) => issues.push(issue),
            }
        }

        for (key, value) in fields {
            if self.rule(key).is_none() {
                issues.push(ValidationIssue::new(key, "object.unknown", Some(value)));
            }
        }

        if issues.is_empty() {
            Ok(validated)
        } else {
            Err(ValidationErrors(issues))
        }
    }
}

fn check_field(rule: &FieldRule, raw: &Value) -> Result<Option<FieldValue>, ValidationIssue> {
    match rule.kind {
        FieldKind::Text { max_len } => check_text(rule.name, raw, max_len).map(Some),
        FieldKind::Upload => check_text(rule.name, raw, None).map(|_| None),
        FieldKind::Decimal { scale } => {
            let value = match raw {
                Value::Number(n) => parse_decimal(&n.to_string()),
                Value::String(s) => parse_decimal(s),
                _ => Err("number.base"),
            }
            .map_err(|kind| ValidationIssue::new(rule.name, kind, Some(raw)))?;

            Ok(Some(FieldValue::Decimal(round_to_scale(value, scale))))
        }
    }
}

fn check_text(
    field: &str,
    raw: &Value,
    max_len: Option<usize>,
) -> Result<FieldValue, ValidationIssue> {
    let Value::String(text) = raw else {
        return Err(ValidationIssue::new(field, "string.base", Some(raw)));
    };

    if text.is_empty() {
        return Err(ValidationIssue::new(field, "string.empty", Some(raw)));
    }

    // Lengths are measured in UTF-16 code units, so a character outside the
    // Basic Multilingual Plane counts twice.
    if let Some(limit) = max_len {
        if text.encode_utf16().count() > limit {
            return Err(ValidationIssue::too_long(field, limit, raw));
        }
    }

    Ok(FieldValue::Text(text.clone()))
}

/// Accepts plain decimal notation and scientific notation.
fn parse_decimal(raw: &str) -> Result<Decimal, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("number.base");
    }

    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    if unsigned.starts_with(['+', '-']) {
        return Err("number.base");
    }
    if unsigned.eq_ignore_ascii_case("infinity") {
        return Err("number.infinity");
    }

    let digits = raw.strip_prefix('+').unwrap_or(raw);
    Decimal::from_str(digits)
        .or_else(|_| Decimal::from_scientific(digits))
        .map_err(|_| "number.base")
}

pub fn round_to_scale(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    rounded
}
