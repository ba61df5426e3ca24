use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;
use std::time::Duration;

use audioscribe::transcribe::assemblyai::AssemblyAiClient;
use audioscribe::transcribe::chunks::ChunkReader;
use audioscribe::transcribe::poller::PollPolicy;
use audioscribe::transcribe::runner::{run_pipeline, upload_file, SaveResult, TranscribeRequest};
use audioscribe::Error;
use tempfile::TempDir;

const API_KEY: &str = "test-api-key";

#[derive(Debug)]
struct Recorded {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Serve one scripted response per connection, in order, then return what
/// the client sent.
fn spawn_stub(script: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Recorded>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}/v2", listener.local_addr().unwrap());

    let handle = std::thread::spawn(move || {
        let mut recorded = Vec::new();
        for (status, body) in script {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            recorded.push(read_request(&mut reader));

            let reply = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                if status < 400 { "OK" } else { "Error" },
                body.len(),
                body
            );
            let mut stream = reader.into_inner();
            stream.write_all(reply.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
        recorded
    });

    (base_url, handle)
}

fn read_request<R: BufRead>(reader: &mut R) -> Recorded {
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap().to_string();
    let path = parts.next().unwrap().to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        let (k, v) = line.split_once(':').unwrap();
        headers.push((k.trim().to_ascii_lowercase(), v.trim().to_string()));
    }

    let find = |name: &str| {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };

    let mut body = Vec::new();
    if let Some(len) = find("content-length") {
        let len: usize = len.parse().unwrap();
        body.resize(len, 0);
        reader.read_exact(&mut body).unwrap();
    } else if find("transfer-encoding").is_some_and(|v| v.contains("chunked")) {
        loop {
            let mut size_line = String::new();
            reader.read_line(&mut size_line).unwrap();
            let size_str = size_line.trim().split(';').next().unwrap();
            let size = usize::from_str_radix(size_str, 16).unwrap();
            if size == 0 {
                // Trailers end with an empty line.
                loop {
                    let mut trailer = String::new();
                    reader.read_line(&mut trailer).unwrap();
                    if trailer.trim().is_empty() {
                        break;
                    }
                }
                break;
            }
            let mut chunk = vec![0u8; size];
            reader.read_exact(&mut chunk).unwrap();
            body.extend_from_slice(&chunk);
            let mut crlf = [0u8; 2];
            reader.read_exact(&mut crlf).unwrap();
        }
    }

    Recorded {
        method,
        path,
        headers,
        body,
    }
}

fn client(base_url: &str) -> AssemblyAiClient {
    AssemblyAiClient::new(base_url, API_KEY.to_string(), Duration::from_secs(10)).unwrap()
}

fn policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_secs(30),
        backoff_factor: 1.0,
        max_interval: Duration::from_secs(30),
        max_attempts: Some(10),
    }
}

fn audio_file(tmp: &TempDir, bytes: &[u8]) -> std::path::PathBuf {
    let path = tmp.path().join("a1.wav");
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_pipeline_against_stub_service() {
    let tmp = TempDir::new().unwrap();
    let audio_bytes: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    let audio = audio_file(&tmp, &audio_bytes);

    let (base_url, server) = spawn_stub(vec![
        (200, r#"{"upload_url": "https://cdn.example.com/upload/xyz"}"#),
        (200, r#"{"id": "t-42", "status": "queued"}"#),
        (200, r#"{"id": "t-42", "status": "processing", "text": null}"#),
        (200, r#"{"id": "t-42", "status": "processing"}"#),
        (200, r#"{"id": "t-42", "status": "completed", "text": "hello world"}"#),
    ]);

    let request = TranscribeRequest {
        audio,
        title: "demo".to_string(),
        output_dir: tmp.path().join("out"),
        chunk_size: 1024,
    };
    let mut waits = 0;
    let result = run_pipeline(&client(&base_url), &request, &policy(), |_| waits += 1).unwrap();

    let expected = tmp.path().join("out").join("demo.txt");
    assert_eq!(result, SaveResult::Saved(expected.clone()));
    assert_eq!(std::fs::read_to_string(&expected).unwrap(), "hello world");
    assert_eq!(waits, 2);

    let recorded = server.join().unwrap();
    assert_eq!(recorded.len(), 5);
    for req in &recorded {
        assert_eq!(req.header("authorization"), Some(API_KEY));
    }

    assert_eq!(recorded[0].method, "POST");
    assert_eq!(recorded[0].path, "/v2/upload");
    assert_eq!(recorded[0].body, audio_bytes);

    assert_eq!(recorded[1].method, "POST");
    assert_eq!(recorded[1].path, "/v2/transcript");
    let job_request: serde_json::Value = serde_json::from_slice(&recorded[1].body).unwrap();
    assert_eq!(job_request["audio_url"], "https://cdn.example.com/upload/xyz");
    assert!(recorded[1]
        .header("content-type")
        .is_some_and(|v| v.starts_with("application/json")));

    for req in &recorded[2..] {
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/v2/transcript/t-42");
    }
}

#[test]
fn test_error_status_reports_message_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let audio = audio_file(&tmp, b"not really audio");

    let (base_url, server) = spawn_stub(vec![
        (200, r#"{"upload_url": "https://cdn.example.com/upload/1"}"#),
        (200, r#"{"id": "t-1", "status": "queued"}"#),
        (200, r#"{"id": "t-1", "status": "error", "error": "bad audio"}"#),
    ]);

    let request = TranscribeRequest {
        audio,
        title: "demo".to_string(),
        output_dir: tmp.path().to_path_buf(),
        chunk_size: 4096,
    };
    let result = run_pipeline(&client(&base_url), &request, &policy(), |_| {}).unwrap();

    assert_eq!(result, SaveResult::Failed("bad audio".to_string()));
    assert!(!tmp.path().join("demo.txt").exists());
    server.join().unwrap();
}

#[test]
fn test_upload_rejected_is_remote_error() {
    let tmp = TempDir::new().unwrap();
    let audio = audio_file(&tmp, b"abc");

    let (base_url, server) = spawn_stub(vec![(401, r#"{"error": "Authentication error"}"#)]);

    let err = upload_file(&client(&base_url), &audio, 1024).unwrap_err();
    match err {
        Error::Remote(msg) => {
            assert!(msg.contains("401"), "message was: {}", msg);
            assert!(msg.contains("Authentication error"));
        }
        other => panic!("expected remote error, got {:?}", other),
    }
    server.join().unwrap();
}

#[test]
fn test_malformed_upload_response_is_remote_error() {
    let tmp = TempDir::new().unwrap();
    let audio = audio_file(&tmp, b"abc");

    let (base_url, server) = spawn_stub(vec![(200, r#"{"unexpected": true}"#)]);

    let err = upload_file(&client(&base_url), &audio, 1024).unwrap_err();
    assert!(matches!(err, Error::Remote(_)));
    server.join().unwrap();
}

/// Hands out `good` bytes, then fails every later read.
struct FailAfter {
    good: usize,
}

impl Read for FailAfter {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.good == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk went away",
            ));
        }
        let n = buf.len().min(self.good);
        buf[..n].fill(0);
        self.good -= n;
        Ok(n)
    }
}

#[test]
fn test_read_failure_mid_upload_is_io_error() {
    // Accept one connection and drain it; the upload never completes, so no
    // reply is sent.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}/v2", listener.local_addr().unwrap());
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut sink = Vec::new();
            let _ = stream.read_to_end(&mut sink);
        }
    });

    let chunks = ChunkReader::new(FailAfter { good: 1024 }, 1024).unwrap();
    let err = client(&base_url).upload_chunks(chunks).unwrap_err();
    match err {
        Error::Io { source, .. } => assert_eq!(source.to_string(), "disk went away"),
        other => panic!("expected local I/O error, got {:?}", other),
    }
}
