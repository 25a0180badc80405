use super::*;

#[cfg(unix)]
fn fake_engine() -> EngineSettings {
    // A shell stand-in that speaks just enough UCI for the transport.
    const SCRIPT: &str = r#"
while read line; do
  case "$line" in
    uci) echo "id name fakefish"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) echo "info depth 1 score cp 13"; echo "bestmove e2e4" ;;
    quit) exit 0 ;;
  esac
done
"#;
    EngineSettings {
        path: "sh".to_string(),
        args: vec!["-c".to_string(), SCRIPT.to_string()],
        ..EngineSettings::default()
    }
}

#[cfg(unix)]
#[tokio::test]
async fn handshakes_searches_and_closes_idempotently() {
    let mut link = UciProcess::spawn(&fake_engine()).await.expect("spawn");
    let mut lines = link.take_lines();

    link.send("go depth 1");
    let best = loop {
        match lines.recv().await {
            Some(line) if line.starts_with("bestmove") => break line,
            Some(_) => continue,
            None => panic!("engine died before answering"),
        }
    };
    assert_eq!(best, "bestmove e2e4");

    link.close().await;
    // A second close and post-close sends are quiet no-ops.
    link.close().await;
    link.send("go depth 1");
    assert_eq!(lines.recv().await, None);

    // The line stream can only be taken once; a re-take is already closed.
    let mut retaken = link.take_lines();
    assert_eq!(retaken.recv().await, None);
}

#[tokio::test]
async fn missing_executable_is_reported_as_unavailable() {
    let settings = EngineSettings {
        path: "/nonexistent/engine-binary".to_string(),
        ..EngineSettings::default()
    };
    match UciProcess::spawn(&settings).await {
        Err(EngineError::Unavailable { path, .. }) => {
            assert_eq!(path, "/nonexistent/engine-binary");
        }
        Ok(_) => panic!("spawn unexpectedly succeeded"),
        Err(other) => panic!("wrong error: {other}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn engine_that_never_handshakes_times_out_or_eofs() {
    // `true` exits immediately without ever answering `uci`.
    let settings = EngineSettings {
        path: "true".to_string(),
        args: Vec::new(),
        ..EngineSettings::default()
    };
    match UciProcess::spawn(&settings).await {
        Err(EngineError::HandshakeEof { .. }) | Err(EngineError::HandshakeTimeout { .. }) => {}
        Ok(_) => panic!("spawn unexpectedly succeeded"),
        Err(other) => panic!("wrong error: {other}"),
    }
}
