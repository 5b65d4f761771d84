//! Real API integration tests for the Reya WebSocket v2 feed.
//!
//! These tests connect to the live Reya endpoint and require network access.
//! Run with: `cargo test --features integration-tests`

#![cfg(feature = "integration-tests")]

mod common;

use futures_util::{SinkExt, StreamExt};
use tungstenite::Message;

use common::REYA_WS_URL;
use rill::models::{Channel, IncomingMessage, OutgoingMessage};
use rill::websocket::connect;

#[tokio::test]
async fn test_connect_to_reya_websocket() {
    let result = connect(REYA_WS_URL).await;
    assert!(result.is_ok(), "Failed to connect to Reya WebSocket");
}

#[tokio::test]
async fn test_subscribe_and_receive_prices() {
    let (mut write, mut read) = connect(REYA_WS_URL).await.expect("Failed to connect");

    let channel = Channel::Prices.name("BTCRUSDPERP");
    let request = OutgoingMessage::Subscribe {
        channel: channel.clone(),
    };
    let json = serde_json::to_string(&request).expect("Failed to serialize subscribe");
    write
        .send(Message::Text(json.into()))
        .await
        .expect("Failed to send subscribe");

    // Wait for an ack or data frame for our channel (with timeout).
    let timeout = tokio::time::timeout(tokio::time::Duration::from_secs(10), async {
        while let Some(msg) = read.next().await {
            if let Ok(Message::Text(text)) = msg {
                let Ok(incoming) = serde_json::from_str::<IncomingMessage>(&text) else {
                    continue;
                };
                match incoming {
                    IncomingMessage::Subscribed { channel: ch } if ch == channel => return true,
                    IncomingMessage::ChannelData(data) if data.channel == channel => return true,
                    _ => {}
                }
            }
        }
        false
    });

    let received = timeout.await.expect("Timeout waiting for prices channel");
    assert!(received, "Did not receive prices subscription traffic");
}

#[tokio::test]
async fn test_server_pings_get_answered() {
    let (mut write, mut read) = connect(REYA_WS_URL).await.expect("Failed to connect");

    // The server pings periodically; answer the first one and make sure the
    // connection stays up for a little while afterwards.
    let timeout = tokio::time::timeout(tokio::time::Duration::from_secs(30), async {
        while let Some(msg) = read.next().await {
            if let Ok(Message::Text(text)) = msg {
                if let Ok(IncomingMessage::Ping { timestamp }) =
                    serde_json::from_str::<IncomingMessage>(&text)
                {
                    let pong = OutgoingMessage::Pong { timestamp };
                    let json = serde_json::to_string(&pong).expect("Failed to serialize pong");
                    write
                        .send(Message::Text(json.into()))
                        .await
                        .expect("Failed to send pong");
                    return true;
                }
            }
        }
        false
    });

    let answered = timeout.await.expect("Timeout waiting for server ping");
    assert!(answered, "Never saw a server ping");
}
