//! Telemetry over a loopback socket

use agora_core::{ConversationState, Speaker};
use agora_debate::{DebateConfig, DebateEvent, SessionController, TelemetrySink};
use agora_llm::MockProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

async fn wait_connected(sink: &TelemetrySink) {
    for _ in 0..200 {
        if sink.is_connected() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("telemetry client never registered");
}

#[tokio::test]
async fn turns_stream_to_connected_client() {
    let sink = Arc::new(TelemetrySink::bind("127.0.0.1:0").await.unwrap());
    let client = TcpStream::connect(sink.local_addr()).await.unwrap();
    wait_connected(&sink).await;

    let config = DebateConfig {
        turn_delay: Duration::from_secs(5),
        ..DebateConfig::immediate()
    };
    let (mut session, _events) = SessionController::builder(Arc::new(MockProvider::smart()))
        .config(config)
        .topic("AI's impact on privacy")
        .telemetry(sink.clone())
        .build();
    session.start().await;

    let mut lines = BufReader::new(client).lines();
    let read = |line: Option<String>| -> serde_json::Value {
        serde_json::from_str(&line.expect("telemetry stream closed")).unwrap()
    };

    let first = read(lines.next_line().await.unwrap());
    assert_eq!(first["speaker"], "System");
    assert_eq!(first["message"], "Debate started on: AI's impact on privacy");
    assert!(first["sentiment"].is_number());

    let second = read(lines.next_line().await.unwrap());
    assert_eq!(second["speaker"], "Analyst");

    session.end().await;
}

#[tokio::test]
async fn debate_continues_after_client_leaves() {
    let sink = Arc::new(TelemetrySink::bind("127.0.0.1:0").await.unwrap());
    let client = TcpStream::connect(sink.local_addr()).await.unwrap();
    wait_connected(&sink).await;
    drop(client);

    let (mut session, mut events) = SessionController::builder(Arc::new(MockProvider::smart()))
        .config(DebateConfig::immediate())
        .topic("AI's influence on art and creativity")
        .telemetry(sink)
        .build();
    session.start().await;

    let mut debater_turns = 0;
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = events.recv().await {
            if matches!(event, DebateEvent::TurnRecorded(ref t) if t.speaker.is_debater()) {
                debater_turns += 1;
                if debater_turns == 4 {
                    break;
                }
            }
        }
    })
    .await
    .expect("debate stalled without a telemetry client");

    assert!(session.end().await);
}

async fn wait_disconnected(sink: &TelemetrySink) {
    for _ in 0..500 {
        if !sink.is_connected() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("stalled telemetry client was never dropped");
}

#[tokio::test]
async fn stalled_client_never_blocks_publishing() {
    let sink = TelemetrySink::bind_with_timeout("127.0.0.1:0", Duration::from_millis(200))
        .await
        .unwrap();
    // Connected but never reads
    let stalled = TcpStream::connect(sink.local_addr()).await.unwrap();
    wait_connected(&sink).await;

    let mut conversation = ConversationState::new();
    let big = "word ".repeat(200_000);
    let turn = conversation.append(Speaker::debater("Analyst"), big, "Arguments").clone();

    tokio::time::timeout(Duration::from_secs(2), async {
        for _ in 0..1_000 {
            sink.publish(&turn);
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("publishing waited on a client that never reads");

    wait_disconnected(&sink).await;
    drop(stalled);

    // The slot is free again
    let _next = TcpStream::connect(sink.local_addr()).await.unwrap();
    wait_connected(&sink).await;
}

#[tokio::test]
async fn stalled_client_never_blocks_the_debate() {
    let sink = Arc::new(
        TelemetrySink::bind_with_timeout("127.0.0.1:0", Duration::from_secs(30))
            .await
            .unwrap(),
    );
    let _stalled = TcpStream::connect(sink.local_addr()).await.unwrap();
    wait_connected(&sink).await;

    let long_argument = "This argument keeps going without end. ".repeat(12_500);
    let config = DebateConfig {
        context_window: 2,
        ..DebateConfig::immediate()
    };
    let (mut session, mut events) =
        SessionController::builder(Arc::new(MockProvider::constant(&long_argument)))
            .config(config)
            .topic("AI's role in future job markets")
            .telemetry(sink.clone())
            .build();
    session.start().await;

    let mut debater_turns = 0;
    tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(event) = events.recv().await {
            if matches!(event, DebateEvent::TurnRecorded(ref t) if t.speaker.is_debater()) {
                debater_turns += 1;
                if debater_turns == 12 {
                    break;
                }
            }
        }
    })
    .await
    .expect("debate stalled behind the telemetry client");

    assert!(session.snapshot().await.state.is_active());
    tokio::time::timeout(Duration::from_secs(5), session.end())
        .await
        .expect("ending the session hung");
}
