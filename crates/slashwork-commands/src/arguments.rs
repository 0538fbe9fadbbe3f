//! Typed argument descriptors and the values provided for them at dispatch time

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CommandError, Result};
use crate::limits::{self, MAX_CHOICES, MAX_CHOICE_LABEL_LENGTH, MAX_TEXT_LENGTH};

/// Type tag of an argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentKind {
    Text,
    Integer,
    Number,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Attachment,
}

impl ArgumentKind {
    /// Whether the kind can carry a choice list
    pub fn supports_choices(&self) -> bool {
        matches!(
            self,
            ArgumentKind::Text | ArgumentKind::Integer | ArgumentKind::Number
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ArgumentKind::Integer | ArgumentKind::Number)
    }

    /// Whether the value is a reference to a platform entity (user, role, ...)
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            ArgumentKind::User | ArgumentKind::Channel | ArgumentKind::Role | ArgumentKind::Mentionable
        )
    }
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArgumentKind::Text => "text",
            ArgumentKind::Integer => "integer",
            ArgumentKind::Number => "number",
            ArgumentKind::Boolean => "boolean",
            ArgumentKind::User => "user",
            ArgumentKind::Channel => "channel",
            ArgumentKind::Role => "role",
            ArgumentKind::Mentionable => "mentionable",
            ArgumentKind::Attachment => "attachment",
        };
        f.write_str(label)
    }
}

/// Channel types a channel argument may be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Text,
    Voice,
    Category,
    News,
    Stage,
    Forum,
    PublicThread,
    PrivateThread,
    NewsThread,
}

/// Value of a predefined choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl ChoiceValue {
    fn fits(&self, kind: ArgumentKind) -> bool {
        match (self, kind) {
            (ChoiceValue::Text(_), ArgumentKind::Text) => true,
            (ChoiceValue::Integer(_), ArgumentKind::Integer) => true,
            (ChoiceValue::Integer(_), ArgumentKind::Number) => true,
            (ChoiceValue::Number(n), ArgumentKind::Number) => n.is_finite(),
            _ => false,
        }
    }

    fn matches(&self, value: &ArgumentValue) -> bool {
        match (self, value) {
            (ChoiceValue::Text(a), ArgumentValue::Text(b)) => a == b,
            (ChoiceValue::Integer(a), ArgumentValue::Integer(b)) => a == b,
            (ChoiceValue::Integer(a), ArgumentValue::Number(b)) => (*a as f64) == *b,
            (ChoiceValue::Number(a), ArgumentValue::Number(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for ChoiceValue {
    fn from(value: &str) -> Self {
        ChoiceValue::Text(value.to_string())
    }
}

impl From<String> for ChoiceValue {
    fn from(value: String) -> Self {
        ChoiceValue::Text(value)
    }
}

impl From<i64> for ChoiceValue {
    fn from(value: i64) -> Self {
        ChoiceValue::Integer(value)
    }
}

impl From<f64> for ChoiceValue {
    fn from(value: f64) -> Self {
        ChoiceValue::Number(value)
    }
}

/// A predefined `(label, value)` pair offered to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub value: ChoiceValue,
}

impl Choice {
    pub fn new(label: impl Into<String>, value: impl Into<ChoiceValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Kind-specific constraints; unset bounds are `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channel_types: Vec<ChannelType>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }
}

/// Definition of a single typed option on a command node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentDescriptor {
    name: String,
    description: String,
    kind: ArgumentKind,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    autocomplete: bool,
    #[serde(default, skip_serializing_if = "Constraints::is_empty")]
    constraints: Constraints,
}

impl ArgumentDescriptor {
    pub fn new(kind: ArgumentKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
            autocomplete: false,
            constraints: Constraints::default(),
        }
    }

    pub fn text(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ArgumentKind::Text, name, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ArgumentKind::Integer, name, description)
    }

    pub fn number(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ArgumentKind::Number, name, description)
    }

    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ArgumentKind::Boolean, name, description)
    }

    pub fn user(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ArgumentKind::User, name, description)
    }

    pub fn channel(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ArgumentKind::Channel, name, description)
    }

    pub fn role(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ArgumentKind::Role, name, description)
    }

    pub fn mentionable(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ArgumentKind::Mentionable, name, description)
    }

    pub fn attachment(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ArgumentKind::Attachment, name, description)
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_autocomplete(mut self, autocomplete: bool) -> Self {
        self.autocomplete = autocomplete;
        self
    }

    pub fn with_min_length(mut self, min: u16) -> Self {
        self.constraints.min_length = Some(min);
        self
    }

    pub fn with_max_length(mut self, max: u16) -> Self {
        self.constraints.max_length = Some(max);
        self
    }

    pub fn with_min_value(mut self, min: f64) -> Self {
        self.constraints.min_value = Some(min);
        self
    }

    pub fn with_max_value(mut self, max: f64) -> Self {
        self.constraints.max_value = Some(max);
        self
    }

    pub fn with_choice(mut self, label: impl Into<String>, value: impl Into<ChoiceValue>) -> Self {
        self.constraints.choices.push(Choice::new(label, value));
        self
    }

    pub fn with_choices(mut self, choices: impl IntoIterator<Item = Choice>) -> Self {
        self.constraints.choices.extend(choices);
        self
    }

    pub fn with_channel_types(mut self, types: impl IntoIterator<Item = ChannelType>) -> Self {
        self.constraints.channel_types.extend(types);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> ArgumentKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Autocomplete never applies to an argument with predefined choices
    pub fn is_autocomplete(&self) -> bool {
        self.autocomplete && self.constraints.choices.is_empty()
    }

    pub fn min_length(&self) -> Option<u16> {
        self.constraints.min_length
    }

    pub fn max_length(&self) -> Option<u16> {
        self.constraints.max_length
    }

    pub fn min_value(&self) -> Option<f64> {
        self.constraints.min_value
    }

    pub fn max_value(&self) -> Option<f64> {
        self.constraints.max_value
    }

    pub fn choices(&self) -> &[Choice] {
        &self.constraints.choices
    }

    pub fn channel_types(&self) -> &[ChannelType] {
        &self.constraints.channel_types
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Check the descriptor against platform limits and its own kind
    pub fn validate(&self) -> Result<()> {
        limits::check_name("Argument", &self.name)?;
        limits::check_description("Argument", &self.name, &self.description)?;

        let c = &self.constraints;
        let fail = |reason: String| {
            Err(CommandError::configuration(format!(
                "Argument '{}' ({}): {}",
                self.name, self.kind, reason
            )))
        };

        if (c.min_length.is_some() || c.max_length.is_some()) && self.kind != ArgumentKind::Text {
            return fail("length bounds only apply to text arguments".to_string());
        }
        if (c.min_value.is_some() || c.max_value.is_some()) && !self.kind.is_numeric() {
            return fail("value bounds only apply to numeric arguments".to_string());
        }
        if !c.channel_types.is_empty() && self.kind != ArgumentKind::Channel {
            return fail("channel types only apply to channel arguments".to_string());
        }
        if !c.choices.is_empty() && !self.kind.supports_choices() {
            return fail("choices are not supported for this kind".to_string());
        }

        if let (Some(min), Some(max)) = (c.min_length, c.max_length) {
            if min > max {
                return fail(format!("min length {} exceeds max length {}", min, max));
            }
        }
        for bound in [c.min_length, c.max_length].into_iter().flatten() {
            if bound > MAX_TEXT_LENGTH {
                return fail(format!(
                    "length bound {} exceeds the maximum of {}",
                    bound, MAX_TEXT_LENGTH
                ));
            }
        }
        for bound in [c.min_value, c.max_value].into_iter().flatten() {
            if !bound.is_finite() {
                return fail(format!("value bound {} is not a finite number", bound));
            }
        }
        if let (Some(min), Some(max)) = (c.min_value, c.max_value) {
            if min > max {
                return fail(format!("min value {} exceeds max value {}", min, max));
            }
        }
        if self.kind == ArgumentKind::Integer {
            for bound in [c.min_value, c.max_value].into_iter().flatten() {
                if bound.fract() != 0.0 {
                    return fail(format!("integer bound {} is not a whole number", bound));
                }
            }
        }

        if c.choices.len() > MAX_CHOICES {
            return fail(format!(
                "{} choices given, the maximum is {}",
                c.choices.len(),
                MAX_CHOICES
            ));
        }
        for choice in &c.choices {
            let label_length = choice.label.chars().count();
            if label_length == 0 || label_length > MAX_CHOICE_LABEL_LENGTH {
                return fail(format!(
                    "choice label '{}' must be 1 to {} characters",
                    choice.label, MAX_CHOICE_LABEL_LENGTH
                ));
            }
            if !choice.value.fits(self.kind) {
                return fail(format!(
                    "choice '{}' has a value of the wrong type",
                    choice.label
                ));
            }
        }

        Ok(())
    }

    /// Parse a raw text token (from a prefix message) into a value of this kind
    pub fn parse_token(&self, raw: &str) -> Result<ArgumentValue> {
        let invalid = |reason: String| CommandError::invalid_argument(&self.name, reason);

        let value = match self.kind {
            ArgumentKind::Text => ArgumentValue::Text(raw.to_string()),
            ArgumentKind::Integer => raw
                .parse::<i64>()
                .map(ArgumentValue::Integer)
                .map_err(|_| invalid(format!("'{}' is not a whole number", raw)))?,
            ArgumentKind::Number => raw
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(ArgumentValue::Number)
                .ok_or_else(|| invalid(format!("'{}' is not a number", raw)))?,
            ArgumentKind::Boolean => match raw.to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => ArgumentValue::Boolean(true),
                "false" | "no" | "off" | "0" => ArgumentValue::Boolean(false),
                _ => return Err(invalid(format!("'{}' is not a yes/no value", raw))),
            },
            ArgumentKind::User => ArgumentValue::User(parse_mention(raw, &["<@!", "<@"])
                .ok_or_else(|| invalid(format!("'{}' is not a user", raw)))?),
            ArgumentKind::Channel => ArgumentValue::Channel(parse_mention(raw, &["<#"])
                .ok_or_else(|| invalid(format!("'{}' is not a channel", raw)))?),
            ArgumentKind::Role => ArgumentValue::Role(parse_mention(raw, &["<@&"])
                .ok_or_else(|| invalid(format!("'{}' is not a role", raw)))?),
            ArgumentKind::Mentionable => ArgumentValue::Mentionable(
                parse_mention(raw, &["<@&", "<@!", "<@"])
                    .ok_or_else(|| invalid(format!("'{}' is not a mention", raw)))?,
            ),
            ArgumentKind::Attachment => {
                return Err(invalid(
                    "attachments cannot be passed as text".to_string(),
                ))
            }
        };

        self.check_value(&value)?;
        Ok(value)
    }

    /// Check a provided value against bounds and choices
    pub fn check_value(&self, value: &ArgumentValue) -> Result<()> {
        let invalid = |reason: String| Err(CommandError::invalid_argument(&self.name, reason));
        let c = &self.constraints;

        if value.kind() != self.kind
            && !(self.kind == ArgumentKind::Number && value.kind() == ArgumentKind::Integer)
        {
            return invalid(format!("expected {}, got {}", self.kind, value.kind()));
        }

        if let ArgumentValue::Text(text) = value {
            let length = text.chars().count();
            if let Some(min) = c.min_length {
                if length < usize::from(min) {
                    return invalid(format!("must be at least {} characters", min));
                }
            }
            if let Some(max) = c.max_length {
                if length > usize::from(max) {
                    return invalid(format!("must be at most {} characters", max));
                }
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = c.min_value {
                if n < min {
                    return invalid(format!("must be at least {}", min));
                }
            }
            if let Some(max) = c.max_value {
                if n > max {
                    return invalid(format!("must be at most {}", max));
                }
            }
        }

        if !c.choices.is_empty() && !c.choices.iter().any(|choice| choice.value.matches(value)) {
            let labels: Vec<&str> = c.choices.iter().map(|choice| choice.label.as_str()).collect();
            return invalid(format!("must be one of: {}", labels.join(", ")));
        }

        Ok(())
    }
}

/// Accepts a raw snowflake or a mention wrapped with one of `openers` and `>`
fn parse_mention(raw: &str, openers: &[&str]) -> Option<u64> {
    if let Ok(id) = raw.parse::<u64>() {
        return Some(id);
    }
    let inner = raw.strip_suffix('>')?;
    openers
        .iter()
        .find_map(|opener| inner.strip_prefix(opener))
        .and_then(|id| id.parse::<u64>().ok())
}

/// Uploaded file referenced by an attachment argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: u64,
    pub filename: String,
    pub url: String,
}

/// Concrete value supplied for an argument
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    Text(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(u64),
    Channel(u64),
    Role(u64),
    Mentionable(u64),
    Attachment(Attachment),
}

impl ArgumentValue {
    pub fn kind(&self) -> ArgumentKind {
        match self {
            ArgumentValue::Text(_) => ArgumentKind::Text,
            ArgumentValue::Integer(_) => ArgumentKind::Integer,
            ArgumentValue::Number(_) => ArgumentKind::Number,
            ArgumentValue::Boolean(_) => ArgumentKind::Boolean,
            ArgumentValue::User(_) => ArgumentKind::User,
            ArgumentValue::Channel(_) => ArgumentKind::Channel,
            ArgumentValue::Role(_) => ArgumentKind::Role,
            ArgumentValue::Mentionable(_) => ArgumentKind::Mentionable,
            ArgumentValue::Attachment(_) => ArgumentKind::Attachment,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgumentValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgumentValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgumentValue::Integer(n) => Some(*n as f64),
            ArgumentValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgumentValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Snowflake of a user, channel, role, or mentionable reference
    pub fn as_id(&self) -> Option<u64> {
        match self {
            ArgumentValue::User(id)
            | ArgumentValue::Channel(id)
            | ArgumentValue::Role(id)
            | ArgumentValue::Mentionable(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_attachment(&self) -> Option<&Attachment> {
        match self {
            ArgumentValue::Attachment(attachment) => Some(attachment),
            _ => None,
        }
    }
}

/// Name-keyed values provided with one invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvidedArguments {
    values: HashMap<String, ArgumentValue>,
}

impl ProvidedArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: ArgumentValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgumentValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ArgumentValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgumentValue::as_str)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ArgumentValue::as_i64)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ArgumentValue::as_f64)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ArgumentValue::as_bool)
    }

    pub fn user(&self, name: &str) -> Option<u64> {
        match self.get(name) {
            Some(ArgumentValue::User(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn channel(&self, name: &str) -> Option<u64> {
        match self.get(name) {
            Some(ArgumentValue::Channel(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn role(&self, name: &str) -> Option<u64> {
        match self.get(name) {
            Some(ArgumentValue::Role(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn mentionable(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(ArgumentValue::as_id)
    }

    pub fn attachment(&self, name: &str) -> Option<&Attachment> {
        self.get(name).and_then(ArgumentValue::as_attachment)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgumentValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_input() -> ArgumentDescriptor {
        ArgumentDescriptor::text("input", "Text to echo")
            .with_required(true)
            .with_min_length(1)
            .with_max_length(100)
    }

    #[test]
    fn test_text_bounds_read_back() {
        let arg = echo_input();
        assert!(arg.validate().is_ok());
        assert_eq!(arg.min_length(), Some(1));
        assert_eq!(arg.max_length(), Some(100));
        assert!(arg.is_required());
        assert_eq!(arg.kind(), ArgumentKind::Text);
    }

    #[test]
    fn test_choices_disable_autocomplete() {
        let open = ArgumentDescriptor::text("colour", "Pick one").with_autocomplete(true);
        assert!(open.is_autocomplete());

        let closed = open.with_choice("Red", "red");
        assert!(!closed.is_autocomplete());
        assert_eq!(closed.choices().len(), 1);
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let arg = ArgumentDescriptor::integer("count", "How many")
            .with_min_value(10.0)
            .with_max_value(1.0);
        assert!(arg.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_validate_rejects_constraints_for_wrong_kind() {
        assert!(ArgumentDescriptor::boolean("flag", "A flag")
            .with_min_length(1)
            .validate()
            .is_err());
        assert!(ArgumentDescriptor::text("name", "A name")
            .with_max_value(3.0)
            .validate()
            .is_err());
        assert!(ArgumentDescriptor::user("who", "A user")
            .with_choice("me", "me")
            .validate()
            .is_err());
        assert!(ArgumentDescriptor::text("where", "A place")
            .with_channel_types([ChannelType::Text])
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_bounds() {
        for bound in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let low = ArgumentDescriptor::number("ratio", "Ratio").with_min_value(bound);
            let high = ArgumentDescriptor::number("ratio", "Ratio").with_max_value(bound);
            assert!(low.validate().unwrap_err().is_configuration());
            assert!(high.validate().unwrap_err().is_configuration());
        }

        let nan_choice = ArgumentDescriptor::number("ratio", "Ratio").with_choice("none", f64::NAN);
        assert!(nan_choice.validate().is_err());

        let bounded = ArgumentDescriptor::number("ratio", "Ratio")
            .with_min_value(0.0)
            .with_max_value(1.0);
        assert!(bounded.validate().is_ok());
        assert!(bounded.check_value(&ArgumentValue::Number(2.0)).is_err());
    }

    #[test]
    fn test_validate_rejects_fractional_integer_bounds() {
        let arg = ArgumentDescriptor::integer("count", "How many").with_max_value(2.5);
        assert!(arg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_mistyped_choice() {
        let arg = ArgumentDescriptor::integer("count", "How many").with_choice("one", "1");
        assert!(arg.validate().is_err());

        let widened = ArgumentDescriptor::number("ratio", "Ratio").with_choice("one", 1i64);
        assert!(widened.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_too_many_choices() {
        let choices = (0..=MAX_CHOICES as i64).map(|i| Choice::new(format!("c{}", i), i));
        let arg = ArgumentDescriptor::integer("pick", "Pick").with_choices(choices);
        assert!(arg.validate().is_err());
    }

    #[test]
    fn test_parse_token_enforces_bounds() {
        let arg = echo_input();
        assert_eq!(
            arg.parse_token("hello").unwrap(),
            ArgumentValue::Text("hello".to_string())
        );
        let long = "x".repeat(101);
        assert!(matches!(
            arg.parse_token(&long),
            Err(CommandError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_parse_token_numeric() {
        let arg = ArgumentDescriptor::integer("count", "How many")
            .with_min_value(1.0)
            .with_max_value(10.0);
        assert_eq!(arg.parse_token("7").unwrap(), ArgumentValue::Integer(7));
        assert!(arg.parse_token("11").is_err());
        assert!(arg.parse_token("seven").is_err());

        let ratio = ArgumentDescriptor::number("ratio", "Ratio");
        assert_eq!(ratio.parse_token("0.5").unwrap(), ArgumentValue::Number(0.5));
        assert!(ratio.parse_token("NaN").is_err());
    }

    #[test]
    fn test_parse_token_mentions() {
        let user = ArgumentDescriptor::user("who", "Who");
        assert_eq!(user.parse_token("<@42>").unwrap(), ArgumentValue::User(42));
        assert_eq!(user.parse_token("<@!42>").unwrap(), ArgumentValue::User(42));
        assert_eq!(user.parse_token("42").unwrap(), ArgumentValue::User(42));
        assert!(user.parse_token("<#42>").is_err());

        let role = ArgumentDescriptor::role("role", "Role");
        assert_eq!(role.parse_token("<@&7>").unwrap(), ArgumentValue::Role(7));

        let channel = ArgumentDescriptor::channel("where", "Where");
        assert_eq!(channel.parse_token("<#9>").unwrap(), ArgumentValue::Channel(9));
    }

    #[test]
    fn test_parse_token_respects_choices() {
        let arg = ArgumentDescriptor::text("colour", "Colour")
            .with_choice("Red", "red")
            .with_choice("Blue", "blue");
        assert!(arg.parse_token("red").is_ok());
        assert!(arg.parse_token("green").is_err());
    }

    #[test]
    fn test_parse_token_booleans_and_attachments() {
        let flag = ArgumentDescriptor::boolean("flag", "Flag");
        assert_eq!(flag.parse_token("YES").unwrap(), ArgumentValue::Boolean(true));
        assert_eq!(flag.parse_token("off").unwrap(), ArgumentValue::Boolean(false));
        assert!(flag.parse_token("maybe").is_err());

        let file = ArgumentDescriptor::attachment("file", "File");
        assert!(file.parse_token("anything").is_err());
    }

    #[test]
    fn test_provided_arguments_typed_getters() {
        let args = ProvidedArguments::new()
            .with("text", ArgumentValue::Text("hi".to_string()))
            .with("count", ArgumentValue::Integer(3))
            .with("who", ArgumentValue::User(5));

        assert_eq!(args.text("text"), Some("hi"));
        assert_eq!(args.integer("count"), Some(3));
        assert_eq!(args.number("count"), Some(3.0));
        assert_eq!(args.user("who"), Some(5));
        assert_eq!(args.mentionable("who"), Some(5));
        assert_eq!(args.role("who"), None);
        assert_eq!(args.text("missing"), None);
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_descriptor_serializes_without_empty_constraints() {
        let json = serde_json::to_value(ArgumentDescriptor::boolean("flag", "Flag")).unwrap();
        assert!(json.get("constraints").is_none());
        assert_eq!(json["kind"], "boolean");

        let parsed: ArgumentDescriptor = serde_json::from_value(serde_json::json!({
            "name": "input",
            "description": "Text to echo",
            "kind": "text",
            "required": true,
            "constraints": { "min_length": 1, "max_length": 100 }
        }))
        .unwrap();
        assert_eq!(parsed, echo_input());
    }
}
