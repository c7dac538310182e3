
// Cross-module scenario tests
#[cfg(test)]
mod tests {
    use crate::commands::{CommandHandler, CommandTable, Dispatcher};
    use crate::connection::{ConnectionHandle, LoopbackConnection};
    use crate::messaging::{Outbound, INVALID_COMMAND_REPLY};
    use crate::player::Player;
    use crate::world::{PlayerIdentity, World, KICK_NOTICE};
    use futures::FutureExt;
    use session_core::{AsyncExecutor, ConnectionState, ErrorSink, SessionError, Tier};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Handler that records (command, args) for every invocation.
    fn recording_handler(
        log: Arc<Mutex<Vec<(String, Vec<String>)>>>,
        name: &str,
    ) -> CommandHandler {
        let name = name.to_string();
        Arc::new(move |_player, args| {
            let log = log.clone();
            let name = name.clone();
            async move {
                log.lock().unwrap().push((name, args));
                Ok(String::new())
            }
            .boxed()
        })
    }

    #[derive(Debug, Default)]
    struct RecordingSink {
        reports: Mutex<Vec<String>>,
    }

    impl ErrorSink for RecordingSink {
        fn report(&self, error: &SessionError) {
            self.reports.lock().unwrap().push(error.to_string());
        }
    }

    fn frame(line: &str) -> String {
        serde_json::json!({ "command": line }).to_string()
    }

    /// Lets deferred dispatch work drain.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(60)).await;
    }

    fn test_player(
        username: &str,
        tier: Tier,
        executor: &AsyncExecutor,
    ) -> (Arc<Player>, Arc<LoopbackConnection>) {
        let conn = LoopbackConnection::new();
        let player = Player::new(username, tier, conn.clone(), executor.clone());
        (player, conn)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn kick_command_end_to_end_by_tier() {
        let executor = AsyncExecutor::new();
        let table = Arc::new(CommandTable::new());
        let invocations = Arc::new(Mutex::new(Vec::new()));
        table
            .add("kick", Tier::Moderator, recording_handler(invocations.clone(), "kick"))
            .await;
        let dispatcher = Dispatcher::new(table.clone(), executor.clone());

        // A tier-2 player registers and invokes the tier-2 command.
        let (moderator, moderator_conn) = test_player("mod", Tier::Moderator, &executor);
        dispatcher.register(&moderator, Some(&names(&["kick"]))).await;
        moderator.on_message(&frame("kick me")).await.unwrap();
        settle().await;

        assert_eq!(
            invocations.lock().unwrap().clone(),
            vec![("kick".to_string(), vec!["me".to_string()])]
        );
        // The handler result is diagnostic only - nothing was auto-sent.
        assert!(moderator_conn.sent_frames().is_empty());

        // A tier-3 player's registration of the same name is tier-rejected,
        // so dispatch yields the canonical rejection and no invocation.
        let (anyone, anyone_conn) = test_player("any", Tier::Any, &executor);
        dispatcher.register(&anyone, Some(&names(&["kick"]))).await;
        anyone.on_message(&frame("kick me")).await.unwrap();
        settle().await;

        assert_eq!(invocations.lock().unwrap().len(), 1);
        assert_eq!(anyone_conn.sent_frames(), vec![INVALID_COMMAND_REPLY.to_string()]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn authorization_follows_the_live_table() {
        let executor = AsyncExecutor::new();
        let table = Arc::new(CommandTable::new());
        let invocations = Arc::new(Mutex::new(Vec::new()));
        table
            .add("stats", Tier::Any, recording_handler(invocations.clone(), "stats"))
            .await;
        let dispatcher = Dispatcher::new(table.clone(), executor.clone());

        let (player, conn) = test_player("any", Tier::Any, &executor);
        dispatcher.register(&player, Some(&names(&["stats"]))).await;

        player.on_message(&frame("stats")).await.unwrap();
        settle().await;
        assert_eq!(invocations.lock().unwrap().len(), 1);

        // Tightening the tier after registration is honored at dispatch.
        table
            .add("stats", Tier::Moderator, recording_handler(invocations.clone(), "stats"))
            .await;
        assert_eq!(dispatcher.list().await["stats"].tier, Tier::Moderator);
        player.on_message(&frame("stats")).await.unwrap();
        settle().await;
        assert_eq!(invocations.lock().unwrap().len(), 1);
        assert_eq!(conn.sent_frames(), vec![INVALID_COMMAND_REPLY.to_string()]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn authorization_is_monotonic_in_tier() {
        let executor = AsyncExecutor::new();
        let table = Arc::new(CommandTable::new());
        let invocations = Arc::new(Mutex::new(Vec::new()));
        table
            .add("ban", Tier::Moderator, recording_handler(invocations.clone(), "ban"))
            .await;
        let dispatcher = Dispatcher::new(table.clone(), executor.clone());

        // Everyone at or above moderator privilege may invoke; tier 3 may not.
        for (tier, permitted) in [
            (Tier::Owner, true),
            (Tier::Admin, true),
            (Tier::Moderator, true),
            (Tier::Any, false),
        ] {
            let before = invocations.lock().unwrap().len();
            let (player, conn) = test_player("tiered", tier, &executor);
            dispatcher.register(&player, Some(&names(&["ban"]))).await;
            player.on_message(&frame("ban target")).await.unwrap();
            settle().await;

            let after = invocations.lock().unwrap().len();
            if permitted {
                assert_eq!(after, before + 1, "tier {tier} should be permitted");
                assert!(conn.sent_frames().is_empty());
            } else {
                assert_eq!(after, before, "tier {tier} should be rejected");
                assert_eq!(conn.sent_frames(), vec![INVALID_COMMAND_REPLY.to_string()]);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unregister_detaches_all_command_listening() {
        let executor = AsyncExecutor::new();
        let table = Arc::new(CommandTable::new());
        let invocations = Arc::new(Mutex::new(Vec::new()));
        table
            .add("first", Tier::Any, recording_handler(invocations.clone(), "first"))
            .await;
        table
            .add("second", Tier::Any, recording_handler(invocations.clone(), "second"))
            .await;
        let dispatcher = Dispatcher::new(table.clone(), executor.clone());

        let (player, conn) = test_player("any", Tier::Any, &executor);
        dispatcher.register(&player, None).await;
        player.on_message(&frame("first")).await.unwrap();
        player.on_message(&frame("second")).await.unwrap();
        settle().await;
        assert_eq!(invocations.lock().unwrap().len(), 2);

        // An explicit empty set detaches nothing.
        dispatcher.unregister(&player, Some(&[])).await;
        player.on_message(&frame("first")).await.unwrap();
        settle().await;
        assert_eq!(invocations.lock().unwrap().len(), 3);

        // Naming one command detaches listening for both.
        dispatcher.unregister(&player, Some(&names(&["first"]))).await;
        player.on_message(&frame("first")).await.unwrap();
        player.on_message(&frame("second")).await.unwrap();
        settle().await;
        assert_eq!(invocations.lock().unwrap().len(), 3);
        // With the subscription gone there is no dispatch and no reply.
        assert!(conn.sent_frames().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_string_command_payload_reaches_the_sink() {
        let sink = Arc::new(RecordingSink::default());
        let executor = AsyncExecutor::with_sink(sink.clone());
        let table = Arc::new(CommandTable::new());
        let invocations = Arc::new(Mutex::new(Vec::new()));
        table
            .add("stats", Tier::Any, recording_handler(invocations.clone(), "stats"))
            .await;
        let dispatcher = Dispatcher::new(table.clone(), executor.clone());

        let (player, conn) = test_player("any", Tier::Any, &executor);
        dispatcher.register(&player, None).await;
        player.on_message(r#"{ "command": 42 }"#).await.unwrap();
        settle().await;

        assert!(invocations.lock().unwrap().is_empty());
        assert!(conn.sent_frames().is_empty());
        let reports = sink.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].contains("malformed message"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn handler_failures_never_reach_the_connection_loop() {
        let sink = Arc::new(RecordingSink::default());
        let executor = AsyncExecutor::with_sink(sink.clone());
        let table = Arc::new(CommandTable::new());
        table
            .add(
                "explode",
                Tier::Any,
                Arc::new(|_player, _args| {
                    async { Err(SessionError::HandlerFailure("oops".to_string())) }.boxed()
                }),
            )
            .await;
        let dispatcher = Dispatcher::new(table.clone(), executor.clone());

        let (player, conn) = test_player("any", Tier::Any, &executor);
        dispatcher.register(&player, None).await;
        player.on_message(&frame("explode")).await.unwrap();
        settle().await;

        assert_eq!(player.connection_state(), ConnectionState::Open);
        assert!(conn.sent_frames().is_empty());
        assert_eq!(sink.reports.lock().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn kick_is_idempotent() {
        let executor = AsyncExecutor::new();
        let world = World::new();
        let conn = LoopbackConnection::new();
        let player = world
            .accept(
                conn.clone(),
                PlayerIdentity {
                    username: "victim".to_string(),
                    tier: Tier::Any,
                },
                executor.clone(),
            )
            .await;
        assert_eq!(world.player_count().await, 1);

        world.kick(&player).await.expect("first kick succeeds");
        assert_eq!(world.player_count().await, 0);
        assert_eq!(conn.sent_frames(), vec![KICK_NOTICE.to_string()]);
        assert_eq!(player.connection_state(), ConnectionState::Closed);

        // Second kick: no-op success, no second notice.
        world.kick(&player).await.expect("second kick is a no-op");
        assert_eq!(conn.sent_frames().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn transport_close_removes_the_player_exactly_once() {
        let executor = AsyncExecutor::new();
        let world = World::new();
        let conn = LoopbackConnection::new();
        let player = world
            .accept(
                conn.clone(),
                PlayerIdentity {
                    username: "dropper".to_string(),
                    tier: Tier::Any,
                },
                executor.clone(),
            )
            .await;

        conn.close().await.unwrap();
        settle().await;
        assert_eq!(world.player_count().await, 0);

        // A kick after the transport already closed stays a no-op.
        world.kick(&player).await.expect("kick after close");
        assert_eq!(world.player_count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn broadcast_survives_a_failing_target() {
        let executor = AsyncExecutor::new();
        let world = World::new();
        let mut conns = Vec::new();
        for name in ["alpha", "beta", "gamma"] {
            let conn = LoopbackConnection::new();
            world
                .accept(
                    conn.clone(),
                    PlayerIdentity {
                        username: name.to_string(),
                        tier: Tier::Any,
                    },
                    executor.clone(),
                )
                .await;
            conns.push(conn);
        }
        conns[1].set_fail_sends(true);

        let delivered = world.broadcast(Outbound::Text("hello".to_string()), None).await;

        assert_eq!(delivered, 2);
        assert_eq!(conns[0].sent_frames(), vec!["hello".to_string()]);
        assert!(conns[1].sent_frames().is_empty());
        assert_eq!(conns[2].sent_frames(), vec!["hello".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn add_player_is_duplicate_safe() {
        let executor = AsyncExecutor::new();
        let world = World::new();
        let conn = LoopbackConnection::new();
        let player = Player::new("twin", Tier::Any, conn.clone(), executor);

        world.add_player(player.clone()).await;
        world.add_player(player.clone()).await;
        assert_eq!(world.player_count().await, 1);
    }

    // Single-threaded runtime: spawn order is poll order, which makes the
    // arrival-order property observable without racing workers.
    #[tokio::test]
    async fn dispatch_starts_in_arrival_order_per_player() {
        let executor = AsyncExecutor::new();
        let table = Arc::new(CommandTable::new());
        let starts = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(Mutex::new(Vec::new()));
        {
            let starts = starts.clone();
            let completions = completions.clone();
            table
                .add(
                    "seq",
                    Tier::Any,
                    Arc::new(move |_player, args| {
                        let starts = starts.clone();
                        let completions = completions.clone();
                        async move {
                            let tag = args.first().cloned().unwrap_or_default();
                            starts.lock().unwrap().push(tag.clone());
                            // The first command is the slow one.
                            let delay = if tag == "1" { 40 } else { 5 };
                            tokio::time::sleep(Duration::from_millis(delay)).await;
                            completions.lock().unwrap().push(tag);
                            Ok(String::new())
                        }
                        .boxed()
                    }),
                )
                .await;
        }
        let dispatcher = Dispatcher::new(table.clone(), executor.clone());

        let (player, _conn) = test_player("sequencer", Tier::Any, &executor);
        dispatcher.register(&player, None).await;

        player.on_message(&frame("seq 1")).await.unwrap();
        player.on_message(&frame("seq 2")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(*starts.lock().unwrap(), vec!["1".to_string(), "2".to_string()]);
        assert_eq!(
            *completions.lock().unwrap(),
            vec!["2".to_string(), "1".to_string()]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn registration_skips_unknown_names() {
        let executor = AsyncExecutor::new();
        let table = Arc::new(CommandTable::new());
        let invocations = Arc::new(Mutex::new(Vec::new()));
        table
            .add("real", Tier::Any, recording_handler(invocations.clone(), "real"))
            .await;
        let dispatcher = Dispatcher::new(table.clone(), executor.clone());

        let (player, conn) = test_player("any", Tier::Any, &executor);
        dispatcher
            .register(&player, Some(&names(&["real", "ghost"])))
            .await;

        // The known name dispatches.
        player.on_message(&frame("real")).await.unwrap();
        settle().await;
        assert_eq!(invocations.lock().unwrap().len(), 1);

        // The unknown name was excluded from the registered set.
        player.on_message(&frame("ghost")).await.unwrap();
        settle().await;
        assert_eq!(invocations.lock().unwrap().len(), 1);
        assert_eq!(conn.sent_frames(), vec![INVALID_COMMAND_REPLY.to_string()]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_command_line_is_rejected() {
        let executor = AsyncExecutor::new();
        let table = Arc::new(CommandTable::new());
        let invocations = Arc::new(Mutex::new(Vec::new()));
        table
            .add("real", Tier::Any, recording_handler(invocations.clone(), "real"))
            .await;
        let dispatcher = Dispatcher::new(table.clone(), executor.clone());

        let (player, conn) = test_player("any", Tier::Any, &executor);
        dispatcher.register(&player, None).await;
        player.on_message(&frame("   ")).await.unwrap();
        settle().await;

        assert!(invocations.lock().unwrap().is_empty());
        assert_eq!(conn.sent_frames(), vec![INVALID_COMMAND_REPLY.to_string()]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reregistration_replaces_the_registered_set() {
        let executor = AsyncExecutor::new();
        let table = Arc::new(CommandTable::new());
        let invocations = Arc::new(Mutex::new(Vec::new()));
        table
            .add("first", Tier::Any, recording_handler(invocations.clone(), "first"))
            .await;
        table
            .add("second", Tier::Any, recording_handler(invocations.clone(), "second"))
            .await;
        let dispatcher = Dispatcher::new(table.clone(), executor.clone());

        let (player, conn) = test_player("any", Tier::Any, &executor);
        dispatcher.register(&player, Some(&names(&["first"]))).await;
        dispatcher.register(&player, Some(&names(&["second"]))).await;

        player.on_message(&frame("first")).await.unwrap();
        settle().await;
        assert!(invocations.lock().unwrap().is_empty());
        assert_eq!(conn.sent_frames(), vec![INVALID_COMMAND_REPLY.to_string()]);

        player.on_message(&frame("second")).await.unwrap();
        settle().await;
        assert_eq!(invocations.lock().unwrap().len(), 1);
    }
}
