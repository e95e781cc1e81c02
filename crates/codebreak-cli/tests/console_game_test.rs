//! A scripted console game over localhost TCP.

use std::time::Duration;

use codebreak_app::{Runtime, RuntimeConfig, SessionHandle, SystemEnv};
use codebreak_cli::{Console, TcpTransport};
use codebreak_core::{PeerId, SessionStatus};
use codebreak_proto::Code;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};

fn code(s: &str) -> Code {
    s.parse().unwrap()
}

/// Read console output until it contains `needle`.
async fn read_until(screen: &mut DuplexStream, seen: &mut Vec<u8>, needle: &str) {
    let wait = async {
        while !String::from_utf8_lossy(seen).contains(needle) {
            let mut buf = [0u8; 1024];
            let n = screen.read(&mut buf).await.unwrap();
            assert!(n > 0, "console closed before printing {needle:?}");
            seen.extend_from_slice(&buf[..n]);
        }
    };
    tokio::time::timeout(Duration::from_secs(10), wait).await.unwrap();
}

async fn hosted_game() -> (SessionHandle, SessionHandle, tokio::sync::mpsc::Receiver<codebreak_app::Notice>) {
    let transport = TcpTransport::bind("127.0.0.1:0").await.unwrap();
    let addr = PeerId::new(transport.local_addr().unwrap().to_string());

    let (runtime, maker, _) =
        Runtime::new(transport, SystemEnv::new(), addr.clone(), RuntimeConfig::default());
    tokio::spawn(runtime.run());

    let (runtime, breaker, notices) = Runtime::new(
        TcpTransport::outbound_only(),
        SystemEnv::new(),
        PeerId::from("breaker"),
        RuntimeConfig::default(),
    );
    tokio::spawn(runtime.run());

    breaker.connect(addr).await.unwrap();
    maker.wait_for(|v| v.status == SessionStatus::AwaitingSecret).await.unwrap();

    (maker, breaker, notices)
}

#[tokio::test]
async fn scripted_breaker_cracks_the_code() {
    let (maker, breaker, notices) = hosted_game().await;
    maker.submit_secret(code("r g b y")).await.unwrap();
    breaker.wait_for(|v| v.status == SessionStatus::Playing).await.unwrap();

    let (mut keyboard, input) = tokio::io::duplex(1024);
    let (output, mut screen) = tokio::io::duplex(64 * 1024);
    let console =
        tokio::spawn(Console::new(breaker.clone(), notices, BufReader::new(input), output).run());

    let mut seen = Vec::new();
    read_until(&mut screen, &mut seen, "colors: red(r) blue(b)").await;

    keyboard.write_all(b"purple\n").await.unwrap();
    read_until(&mut screen, &mut seen, "rejected: ").await;

    keyboard.write_all(b"teal teal teal teal\n").await.unwrap();
    read_until(&mut screen, &mut seen, "unknown color").await;

    keyboard.write_all(b"r r g g\n").await.unwrap();
    read_until(&mut screen, &mut seen, " 1. red red green green").await;

    keyboard.write_all(b"r g b y\n").await.unwrap();
    read_until(&mut screen, &mut seen, "code cracked in 2 attempts").await;

    keyboard.write_all(b"quit\n").await.unwrap();
    console.await.unwrap().unwrap();

    let maker_view = maker.wait_for(|v| v.status.is_finished()).await.unwrap();
    assert_eq!(maker_view.status, SessionStatus::Won);
    assert_eq!(maker_view.attempts, breaker.view().attempts);
}

#[tokio::test]
async fn console_sets_the_secret_for_a_host() {
    let (maker, breaker, _breaker_notices) = hosted_game().await;

    let (maker_notices_tx, maker_notices) = tokio::sync::mpsc::channel(1);
    drop(maker_notices_tx);

    let (mut keyboard, input) = tokio::io::duplex(1024);
    let (output, mut screen) = tokio::io::duplex(64 * 1024);
    let console =
        tokio::spawn(Console::new(maker.clone(), maker_notices, BufReader::new(input), output).run());

    let mut seen = Vec::new();
    read_until(&mut screen, &mut seen, "enter a secret of 4 colors").await;

    keyboard.write_all(b"yellow yellow blue blue\n").await.unwrap();
    read_until(&mut screen, &mut seen, "secret locked").await;

    breaker.wait_for(|v| v.status == SessionStatus::Playing).await.unwrap();
    assert_eq!(maker.view().secret, Some(code("y y b b")));

    drop(keyboard);
    console.await.unwrap().unwrap();
}
