//! Routing and argument parsing for prefix messages

use crate::arguments::{ArgumentDescriptor, ArgumentKind, ProvidedArguments};
use crate::error::{CommandError, Result};
use crate::model::{CommandDefinition, NodeHolder};

/// Where the tokens after the command name lead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route<'a> {
    pub group: Option<&'a str>,
    pub subcommand: Option<&'a str>,
    /// Tokens left over for the node's arguments
    pub rest: &'a [&'a str],
}

/// Match the leading tokens against a group, then a sub-command.
///
/// Falls back to the root with every token as an argument. A group name
/// without a known sub-command after it does not route.
pub fn route<'a>(definition: &CommandDefinition, tokens: &'a [&'a str]) -> Option<Route<'a>> {
    let root = Route {
        group: None,
        subcommand: None,
        rest: tokens,
    };
    let Some((&first, rest)) = tokens.split_first() else {
        return Some(root);
    };

    if let Ok(group) = definition.group(first) {
        let (&second, rest) = rest.split_first()?;
        if !group.has_node(second) {
            return None;
        }
        return Some(Route {
            group: Some(first),
            subcommand: Some(second),
            rest,
        });
    }

    if definition.has_node(first) {
        return Some(Route {
            group: None,
            subcommand: Some(first),
            rest,
        });
    }

    Some(root)
}

/// Parse tokens positionally into `arguments`.
///
/// A trailing text argument takes every remaining token. Extra tokens are
/// ignored. Attachments cannot come from text and are skipped when optional.
pub fn parse_arguments(arguments: &[ArgumentDescriptor], tokens: &[&str]) -> Result<ProvidedArguments> {
    let mut provided = ProvidedArguments::new();
    let mut cursor = 0;

    for (index, argument) in arguments.iter().enumerate() {
        if argument.kind() == ArgumentKind::Attachment {
            if argument.is_required() {
                return Err(CommandError::invalid_argument(
                    argument.name(),
                    "attachments cannot be passed as text",
                ));
            }
            continue;
        }

        let is_last = index + 1 == arguments.len();
        let raw = if is_last && argument.kind() == ArgumentKind::Text && cursor < tokens.len() {
            let joined = tokens[cursor..].join(" ");
            cursor = tokens.len();
            Some(joined)
        } else {
            let token = tokens.get(cursor).map(|token| token.to_string());
            if token.is_some() {
                cursor += 1;
            }
            token
        };

        match raw {
            Some(raw) => provided.insert(argument.name(), argument.parse_token(&raw)?),
            None if argument.is_required() => {
                return Err(CommandError::invalid_argument(argument.name(), "is required"));
            }
            None => {}
        }
    }

    Ok(provided)
}

/// Check interaction-supplied values against the node's declarations
pub fn check_arguments(arguments: &[ArgumentDescriptor], provided: &ProvidedArguments) -> Result<()> {
    for argument in arguments {
        match provided.get(argument.name()) {
            Some(value) => argument.check_value(value)?,
            None if argument.is_required() => {
                return Err(CommandError::invalid_argument(argument.name(), "is required"));
            }
            None => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::ArgumentValue;
    use crate::builder::{CommandBuilder, GroupBuilder, NodeBuilder};

    fn tree() -> CommandDefinition {
        CommandBuilder::new("parent", "Parent")
            .executes(|_ctx| async { Ok(()) })
            .subcommand(NodeBuilder::new("direct", "Direct").executes(|_ctx| async { Ok(()) }))
            .group(
                GroupBuilder::new("group1", "Group")
                    .subcommand(NodeBuilder::new("sub2", "Second").executes(|_ctx| async { Ok(()) })),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_route_prefers_group_then_subcommand() {
        let def = tree();

        let tokens = ["group1", "sub2", "a"];
        let grouped = route(&def, &tokens).unwrap();
        assert_eq!(grouped.group, Some("group1"));
        assert_eq!(grouped.subcommand, Some("sub2"));
        assert_eq!(grouped.rest, &["a"]);

        let tokens = ["direct", "x", "y"];
        let direct = route(&def, &tokens).unwrap();
        assert_eq!(direct.group, None);
        assert_eq!(direct.subcommand, Some("direct"));
        assert_eq!(direct.rest.len(), 2);
    }

    #[test]
    fn test_route_falls_back_to_root() {
        let def = tree();

        let tokens = ["hello", "world"];
        let root = route(&def, &tokens).unwrap();
        assert_eq!(root.subcommand, None);
        assert_eq!(root.rest, &["hello", "world"]);

        assert_eq!(route(&def, &[]).unwrap().subcommand, None);
    }

    #[test]
    fn test_group_without_known_subcommand_does_not_route() {
        let def = tree();
        assert!(route(&def, &["group1"]).is_none());
        assert!(route(&def, &["group1", "nope"]).is_none());
    }

    #[test]
    fn test_trailing_text_takes_the_rest() {
        let arguments = vec![
            ArgumentDescriptor::integer("times", "Times").with_required(true),
            ArgumentDescriptor::text("message", "Message"),
        ];

        let provided = parse_arguments(&arguments, &["3", "hello", "there"]).unwrap();
        assert_eq!(provided.integer("times"), Some(3));
        assert_eq!(provided.text("message"), Some("hello there"));

        let provided = parse_arguments(&arguments, &["3"]).unwrap();
        assert!(!provided.contains("message"));
    }

    #[test]
    fn test_missing_and_malformed_arguments() {
        let arguments = vec![ArgumentDescriptor::integer("times", "Times").with_required(true)];

        let err = parse_arguments(&arguments, &[]).unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument { .. }));

        let err = parse_arguments(&arguments, &["three"]).unwrap_err();
        assert!(err.to_string().contains("times"));
    }

    #[test]
    fn test_mentions_and_bounds() {
        let arguments = vec![
            ArgumentDescriptor::user("target", "Target").with_required(true),
            ArgumentDescriptor::integer("days", "Days").with_min_value(1.0).with_max_value(7.0),
        ];

        let provided = parse_arguments(&arguments, &["<@!42>", "3"]).unwrap();
        assert_eq!(provided.user("target"), Some(42));
        assert!(parse_arguments(&arguments, &["<@42>", "9"]).is_err());
    }

    #[test]
    fn test_optional_attachment_is_skipped() {
        let arguments = vec![
            ArgumentDescriptor::attachment("file", "File"),
            ArgumentDescriptor::boolean("public", "Public"),
        ];
        let provided = parse_arguments(&arguments, &["yes"]).unwrap();
        assert_eq!(provided.boolean("public"), Some(true));

        let required = vec![ArgumentDescriptor::attachment("file", "File").with_required(true)];
        assert!(parse_arguments(&required, &[]).is_err());
    }

    #[test]
    fn test_check_arguments() {
        let arguments = vec![
            ArgumentDescriptor::text("input", "Input").with_required(true).with_max_length(3),
        ];

        let ok = ProvidedArguments::new().with("input", ArgumentValue::Text("abc".into()));
        assert!(check_arguments(&arguments, &ok).is_ok());

        let long = ProvidedArguments::new().with("input", ArgumentValue::Text("abcd".into()));
        assert!(check_arguments(&arguments, &long).is_err());
        assert!(check_arguments(&arguments, &ProvidedArguments::new()).is_err());
    }
}
