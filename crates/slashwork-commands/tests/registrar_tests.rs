use std::sync::Arc;
use std::time::Duration;

use slashwork_commands::registrar::handler;
use slashwork_commands::*;
use tokio::sync::mpsc;

struct Parent;

impl DeclarativeCommand for Parent {
    fn descriptor() -> CommandDescriptor {
        let noop = handler(|_ctx, _args| async { Ok(()) });
        CommandDescriptor::new("parent", "Parent command")
            .handler(
                HandlerDescriptor::sub("sub1", "First sub-command", noop.clone())
                    .in_group("group1", "First group")
                    .parameter(ParameterDescriptor::context("ctx")),
            )
            .handler(
                HandlerDescriptor::sub("sub2", "Second sub-command", noop.clone())
                    .in_group("group1", "First group")
                    .cooldown(CooldownTag::new(Duration::from_secs(10)))
                    .parameter(ParameterDescriptor::context("ctx"))
                    .parameter(ParameterDescriptor::argument(
                        "amount",
                        ArgumentDescriptor::integer("amount", "How many")
                            .with_required(true)
                            .with_min_value(1.0)
                            .with_max_value(10.0),
                    )),
            )
            .handler(
                HandlerDescriptor::sub("other", "Ungrouped", noop)
                    .permission(PermissionTag::channel(Permissions::MANAGE_MESSAGES))
                    .parameter(ParameterDescriptor::context("ctx")),
            )
    }
}

struct Echo;

impl DeclarativeCommand for Echo {
    fn descriptor() -> CommandDescriptor {
        CommandDescriptor::new("echo", "Echo text back").handler(
            HandlerDescriptor::root(handler(|ctx: CommandContext, args: HandlerArgs| async move {
                let text = args.text(0).unwrap_or_default().to_string();
                ctx.reply(text).await?;
                Ok(())
            }))
            .ephemeral(true)
            .parameter(ParameterDescriptor::context("ctx"))
            .parameter(ParameterDescriptor::argument(
                "input",
                ArgumentDescriptor::text("input", "Text to echo")
                    .with_required(true)
                    .with_min_length(1)
                    .with_max_length(100),
            )),
        )
    }
}

#[test]
fn test_grouped_subcommand_is_reachable() {
    let registry = CommandRegistry::new();
    registry.register_declarative::<Parent>().unwrap();

    let parent = registry.get("parent").unwrap();
    assert!(!parent.has_root());
    let sub2 = parent.group("group1").unwrap().node("sub2").unwrap();
    let amount = sub2.argument("amount").unwrap();
    assert_eq!(amount.kind(), ArgumentKind::Integer);
    assert_eq!(amount.min_value(), Some(1.0));
    assert_eq!(amount.max_value(), Some(10.0));
    assert_eq!(sub2.cooldown().scope(), CooldownScope::User);

    let other = parent.node("other").unwrap();
    assert_eq!(
        other.permissions(),
        &[PermissionEvaluator::Channel(Permissions::MANAGE_MESSAGES)]
    );
}

#[test]
fn test_echo_argument_bounds() {
    let echo = registrar::resolve_type::<Echo>().unwrap();
    let root = echo.root().unwrap();
    let input = root.argument("input").unwrap();

    assert_eq!(input.min_length(), Some(1));
    assert_eq!(input.max_length(), Some(100));
    assert!(input.is_required());
    assert!(root.is_ephemeral());
}

#[tokio::test]
async fn test_declarative_handler_receives_arguments() {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let tx = Arc::new(tx);

    let descriptor = CommandDescriptor::new("say", "Say something").handler(
        HandlerDescriptor::root(handler(move |_ctx, args| {
            let tx = Arc::clone(&tx);
            async move {
                let words = args.text(0).unwrap_or_default();
                let times = args.integer(1).unwrap_or(1);
                let _ = tx.send(vec![words; times as usize].join(" "));
                Ok(())
            }
        }))
        .parameter(ParameterDescriptor::context("ctx"))
        .parameter(ParameterDescriptor::argument("words", ArgumentDescriptor::text("words", "Words")))
        .parameter(ParameterDescriptor::argument("times", ArgumentDescriptor::integer("times", "Times"))),
    );

    let dispatcher = Dispatcher::builder()
        .message_prefix("!")
        .build()
        .unwrap();
    dispatcher.registry().register_descriptors([&descriptor]).unwrap();

    let ctx = CommandContext::builder(1)
        .argument("words", ArgumentValue::Text("hi".to_string()))
        .argument("times", ArgumentValue::Integer(3))
        .build();
    assert_eq!(
        dispatcher.dispatch("say", None, None, ctx).await,
        DispatchOutcome::Completed
    );
    assert_eq!(rx.recv().await.unwrap(), "hi hi hi");
}

#[test]
fn test_dispatcher_builder_resolves_declarative_types() {
    let dispatcher = Dispatcher::builder()
        .declarative::<Parent>()
        .declarative::<Echo>()
        .build()
        .unwrap();

    assert_eq!(dispatcher.registry().names(), vec!["echo", "parent"]);
}

#[test]
fn test_invalid_descriptor_fails_the_build() {
    struct Broken;

    impl DeclarativeCommand for Broken {
        fn descriptor() -> CommandDescriptor {
            CommandDescriptor::new("broken", "Broken").handler(
                HandlerDescriptor::root(handler(|_ctx, _args| async { Ok(()) }))
                    .parameter(ParameterDescriptor::context("ctx"))
                    .parameter(ParameterDescriptor::new("untagged")),
            )
        }
    }

    let err = Dispatcher::builder()
        .declarative::<Broken>()
        .build()
        .err()
        .unwrap();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("untagged"));
}
