use buzzer::broadcast::{outbound_channel, Inbox};
use buzzer::manager::{SessionHandle, SessionManager};
use buzzer::protocol::{ClientMessage, ServerMessage};
use buzzer::types::BuzzEntry;
use std::collections::HashSet;
use std::time::Duration;

type Rx = Inbox;

struct Client {
    id: String,
    rx: Rx,
}

fn connect(handle: &SessionHandle) -> Client {
    let (tx, rx) = outbound_channel();
    let id = handle.connect(tx);
    Client { id, rx }
}

async fn next(client: &mut Client) -> ServerMessage {
    tokio::time::timeout(Duration::from_secs(1), client.rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("outbound queue closed")
}

/// Everything queued so far; the snapshot round-trip makes sure the manager
/// has processed all earlier commands.
async fn drain(handle: &SessionHandle, client: &mut Client) -> Vec<ServerMessage> {
    handle.snapshot().await.expect("manager running");
    let mut out = Vec::new();
    while let Ok(msg) = client.rx.try_recv() {
        out.push(msg);
    }
    out
}

fn join(name: &str) -> ClientMessage {
    ClientMessage::Join {
        name: name.to_string(),
    }
}

fn buzz(name: &str) -> ClientMessage {
    ClientMessage::Buzz {
        name: name.to_string(),
    }
}

/// End-to-end round: join, buzz, rename, reset, hard reset
#[tokio::test]
async fn test_full_round_flow() {
    let handle = SessionManager::new(64).spawn();
    let mut host = connect(&handle);
    let mut alice = connect(&handle);
    let mut bob = connect(&handle);

    // 1. Host asks for state on connect
    handle.dispatch(&host.id, ClientMessage::GetState);
    assert_eq!(
        next(&mut host).await,
        ServerMessage::Players {
            players: vec![],
            buzz_order: vec![]
        }
    );

    // 2. Players join
    handle.dispatch(&alice.id, join("Alice"));
    handle.dispatch(&bob.id, join("Bob"));
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.players, vec!["Alice".to_string(), "Bob".to_string()]);

    // 3. Both buzz, Alice first
    handle.dispatch(&alice.id, buzz("Alice"));
    handle.dispatch(&bob.id, buzz("Bob"));
    let snapshot = handle.snapshot().await.unwrap();
    let names: Vec<_> = snapshot.buzz_order.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);
    assert!(snapshot.buzz_order[0].time <= snapshot.buzz_order[1].time);
    assert_eq!(snapshot.standings[0].gap_ms, 0);
    assert_eq!(
        snapshot.standings[1].gap_ms,
        snapshot.buzz_order[1].time - snapshot.buzz_order[0].time
    );

    // Host saw the join broadcasts and both buzzes, in order
    let host_msgs = drain(&handle, &mut host).await;
    let orders: Vec<Vec<String>> = host_msgs
        .iter()
        .map(|m| match m {
            ServerMessage::BuzzOrder { buzz_order } => {
                buzz_order.iter().map(|e| e.name.clone()).collect()
            }
            other => panic!("Expected BuzzOrder, got {:?}", other),
        })
        .collect();
    assert_eq!(
        orders,
        vec![
            vec![],
            vec![],
            vec!["Alice".to_string()],
            vec!["Alice".to_string(), "Bob".to_string()],
        ]
    );

    // 4. Alice renames, keeping her slot
    let before = snapshot.buzz_order.clone();
    handle.dispatch(
        &alice.id,
        ClientMessage::ChangeName {
            old_name: "Alice".to_string(),
            new_name: "Alicia".to_string(),
        },
    );
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(
        snapshot.buzz_order,
        vec![
            BuzzEntry {
                name: "Alicia".to_string(),
                time: before[0].time
            },
            BuzzEntry {
                name: "Bob".to_string(),
                time: before[1].time
            },
        ]
    );
    assert_eq!(snapshot.standings[1].gap_ms, before[1].time - before[0].time);

    // 5. Reset keeps players
    handle.dispatch(&host.id, ClientMessage::Reset);
    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.buzz_order.is_empty());
    assert_eq!(snapshot.players, vec!["Alicia".to_string(), "Bob".to_string()]);

    // 6. Hard reset reaches everyone exactly once
    drain(&handle, &mut host).await;
    drain(&handle, &mut alice).await;
    drain(&handle, &mut bob).await;
    handle.dispatch(&host.id, ClientMessage::HardReset);
    for client in [&mut host, &mut alice, &mut bob] {
        assert_eq!(
            drain(&handle, client).await,
            vec![ServerMessage::HardReset]
        );
    }
    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.players.is_empty());
    assert!(snapshot.buzz_order.is_empty());
}

#[tokio::test]
async fn test_join_distinct_names_from_many_connections() {
    let handle = SessionManager::new(64).spawn();
    let names = ["Dana", "alice", "Alice", "Bob", "Eve", "Carol"];

    let clients: Vec<_> = names.iter().map(|_| connect(&handle)).collect();
    for (client, name) in clients.iter().zip(names) {
        handle.dispatch(&client.id, join(name));
    }

    let snapshot = handle.snapshot().await.unwrap();
    let joined: HashSet<_> = snapshot.players.iter().map(String::as_str).collect();
    let expected: HashSet<_> = names.into_iter().collect();
    assert_eq!(joined, expected);
    assert_eq!(snapshot.connections, names.len());
}

#[tokio::test]
async fn test_concurrent_buzzes_are_serialized() {
    let handle = SessionManager::new(64).spawn();
    let count = 20;

    let mut clients = Vec::new();
    for i in 0..count {
        let client = connect(&handle);
        handle.dispatch(&client.id, join(&format!("player-{}", i)));
        clients.push(client);
    }
    handle.snapshot().await.unwrap();

    let tasks: Vec<_> = clients
        .iter()
        .enumerate()
        .map(|(i, client)| {
            let handle = handle.clone();
            let id = client.id.clone();
            tokio::spawn(async move {
                // Every player mashes the button
                for _ in 0..3 {
                    handle.dispatch(&id, buzz(&format!("player-{}", i)));
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.buzz_order.len(), count);
    let unique: HashSet<_> = snapshot.buzz_order.iter().map(|e| &e.name).collect();
    assert_eq!(unique.len(), count);
    assert!(snapshot
        .buzz_order
        .windows(2)
        .all(|pair| pair[0].time <= pair[1].time));

    // Every connection saw the same final order
    for client in clients.iter_mut() {
        let last_order = drain(&handle, client)
            .await
            .into_iter()
            .filter_map(|m| match m {
                ServerMessage::BuzzOrder { buzz_order } => Some(buzz_order),
                _ => None,
            })
            .last()
            .unwrap();
        assert_eq!(last_order, snapshot.buzz_order);
    }
}

#[tokio::test]
async fn test_repeated_buzz_is_idempotent() {
    let handle = SessionManager::new(64).spawn();
    let mut alice = connect(&handle);
    handle.dispatch(&alice.id, join("Alice"));
    handle.dispatch(&alice.id, buzz("Alice"));
    let once = handle.snapshot().await.unwrap().buzz_order;
    drain(&handle, &mut alice).await;

    handle.dispatch(&alice.id, buzz("Alice"));

    assert_eq!(handle.snapshot().await.unwrap().buzz_order, once);
    assert!(drain(&handle, &mut alice).await.is_empty());
}

#[tokio::test]
async fn test_dropped_connection_is_removed_from_fanout() {
    let handle = SessionManager::new(64).spawn();
    let mut alice = connect(&handle);
    let ghost = connect(&handle);
    handle.dispatch(&alice.id, join("Alice"));
    assert_eq!(handle.snapshot().await.unwrap().connections, 2);

    // Socket task died without saying goodbye
    drop(ghost.rx);
    handle.dispatch(&alice.id, buzz("Alice"));

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.connections, 1);
    let msgs = drain(&handle, &mut alice).await;
    assert!(matches!(msgs.last(), Some(ServerMessage::BuzzOrder { buzz_order }) if buzz_order.len() == 1));
}

#[tokio::test]
async fn test_stalled_connection_is_dropped_others_keep_receiving() {
    let handle = SessionManager::new(64).spawn();
    let mut host = connect(&handle);
    let _stalled = connect(&handle);
    assert_eq!(handle.snapshot().await.unwrap().connections, 2);

    // Every reset is broadcast; the host keeps reading, the other side never does
    for _ in 0..3 {
        for _ in 0..100 {
            handle.dispatch(&host.id, ClientMessage::Reset);
        }
        assert_eq!(drain(&handle, &mut host).await.len(), 100);
    }

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.connections, 1);
    handle.dispatch(&host.id, ClientMessage::GetState);
    assert!(matches!(next(&mut host).await, ServerMessage::Players { .. }));
}
