use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use slashwork_commands::limits::MAX_NAME_LENGTH;
use slashwork_commands::*;

fn noop() -> Executor {
    executor(|_ctx| async { Ok(()) })
}

// Property 1: name length limit
// Names up to the maximum build; anything longer is a configuration error
proptest! {
    #[test]
    fn prop_name_length_limit(length in 1usize..=64) {
        let name = "a".repeat(length);
        let result = NodeBuilder::new(name, "Description").executor(noop()).build();

        if length <= MAX_NAME_LENGTH {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.unwrap_err().is_configuration());
        }
    }
}

// Property 2: registry consistency
// After any sequence of registrations the count matches the distinct names,
// and every name resolves
proptest! {
    #[test]
    fn prop_registry_consistency(names in prop::collection::vec("[a-z][a-z0-9_-]{0,20}", 1..20)) {
        let registry = CommandRegistry::new();
        for name in &names {
            registry.register(
                CommandBuilder::new(name.as_str(), "Generated")
                    .root_executor(noop())
                    .build()
                    .unwrap(),
            );
        }

        let unique: HashSet<&String> = names.iter().collect();
        prop_assert_eq!(registry.len(), unique.len());
        for name in unique {
            prop_assert!(registry.get(name).is_some());
        }
    }
}

// Property 3: register then unregister
// get returns the same definition until it is unregistered
proptest! {
    #[test]
    fn prop_register_unregister(name in "[a-z]{1,32}") {
        let registry = CommandRegistry::new();
        let def = Arc::new(
            CommandBuilder::new(name.as_str(), "Generated")
                .root_executor(noop())
                .build()
                .unwrap(),
        );
        registry.register_arc(Arc::clone(&def));
        prop_assert!(Arc::ptr_eq(&registry.get(&name).unwrap(), &def));

        registry.unregister(&name);
        prop_assert!(registry.get(&name).is_none());
    }
}

// Property 4: permission AND
// A list is satisfied exactly when every evaluator is covered
proptest! {
    #[test]
    fn prop_permission_list_is_and(granted in any::<u64>(), required in prop::collection::vec(any::<u64>(), 0..5)) {
        let granted = Permissions::from_bits_truncate(granted) - Permissions::ADMINISTRATOR;
        let evaluators: Vec<PermissionEvaluator> = required
            .iter()
            .map(|bits| PermissionEvaluator::Guild(Permissions::from_bits_truncate(*bits)))
            .collect();
        let ctx = CommandContext::builder(1)
            .guild(1)
            .member(MemberPermissions::uniform(granted))
            .build();

        let expected = evaluators.iter().all(|evaluator| match evaluator {
            PermissionEvaluator::Guild(bits) => granted.contains(*bits),
            _ => unreachable!(),
        });
        prop_assert_eq!(permission::evaluate_all(&evaluators, &ctx), expected);
    }
}

// Property 5: per-user cooldown windows
// Within a window only the first call per user passes; after it the user passes again
proptest! {
    #[test]
    fn prop_user_cooldown_window(users in prop::collection::vec(0u64..5, 1..30), seconds in 1u64..120) {
        let clock = Arc::new(ManualClock::new());
        let cooldown = Cooldown::with_clock(CooldownScope::User, Duration::from_secs(seconds), clock.clone());

        let mut seen = HashSet::new();
        for user in &users {
            prop_assert_eq!(cooldown.admit(*user, None), seen.insert(*user));
        }

        clock.advance(Duration::from_secs(seconds));
        for user in seen {
            prop_assert!(cooldown.admit(user, None));
        }
    }
}

// Property 6: prefix parsing of integers
// Any in-range integer token parses back to the same value
proptest! {
    #[test]
    fn prop_integer_tokens_parse(value in -1000i64..1000) {
        let arguments = vec![
            ArgumentDescriptor::integer("value", "Value")
                .with_required(true)
                .with_min_value(-1000.0)
                .with_max_value(1000.0),
        ];
        let token = value.to_string();
        let provided = dispatcher::prefix::parse_arguments(&arguments, &[token.as_str()]).unwrap();
        prop_assert_eq!(provided.integer("value"), Some(value));
    }
}
