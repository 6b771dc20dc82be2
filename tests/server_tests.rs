//! End-to-end server tests
//!
//! Drives a real server over TCP: credential gate, the full
//! add/show/edit/delete scenario, error reporting, and concurrent sessions.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use notekeep::network::Server;
use notekeep::{Config, CredentialGate, Directory};

const SECRET: &str = "test-secret";
const BANNER_END: &[u8] = b"[+] 4. Edit a note\n";
const PROMPT: &[u8] = b"> ";

// =============================================================================
// Harness
// =============================================================================

/// Start a server on an ephemeral port, returning its address and a handle
/// on the shared directory for state assertions
fn start_server(max_store_bytes: usize) -> (SocketAddr, Arc<Directory>) {
    let config = Config::builder()
        .listen_host("127.0.0.1")
        .port_range(0, 0)
        .max_store_bytes(max_store_bytes)
        .build();

    let directory = Arc::new(Directory::new(max_store_bytes));
    let gate = Arc::new(CredentialGate::from_secret(SECRET));
    let server = Server::new(config, Arc::clone(&directory), gate);

    let listener = server.bind().expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    thread::spawn(move || {
        let _ = server.serve(listener);
    });

    (addr, directory)
}

/// Connect and pass the credential gate
fn open_session(addr: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout");

    read_until(&mut stream, b"cred:\n");
    send_line(&mut stream, SECRET);
    read_until(&mut stream, BANNER_END);

    stream
}

/// Read until the collected bytes end with `marker`, returning everything
/// before it
fn read_until(stream: &mut TcpStream, marker: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 512];

    loop {
        if buf.ends_with(marker) {
            buf.truncate(buf.len() - marker.len());
            return buf;
        }
        let n = stream.read(&mut chunk).expect("read from server");
        assert!(n > 0, "server closed while waiting for {marker:?}");
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Read until the peer closes the stream
fn read_to_eof(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).expect("read to EOF");
    buf
}

fn send_line(stream: &mut TcpStream, text: &str) {
    stream.write_all(text.as_bytes()).expect("write");
    stream.write_all(b"\n").expect("write newline");
}

/// Walk the selector/size/level exchange
fn locate(stream: &mut TcpStream, selector: &str, size: &str, level: &str) {
    send_line(stream, selector);
    read_until(stream, PROMPT);
    send_line(stream, size);
    read_until(stream, PROMPT);
    send_line(stream, level);
}

/// ADD with `size` bytes of content
fn add(stream: &mut TcpStream, size: usize, level: &str, fill: u8) {
    locate(stream, "1", &size.to_string(), level);
    stream.write_all(&vec![fill; size]).expect("write content");
    let reply = read_until(stream, BANNER_END);
    assert!(
        !contains(&reply, b"[X]") && !contains(&reply, b"[-]"),
        "add failed: {}",
        String::from_utf8_lossy(&reply)
    );
}

/// SHOW, expecting exactly `size` content bytes back
fn show(stream: &mut TcpStream, size: usize, level: &str, position: &str) -> Vec<u8> {
    locate(stream, "3", &size.to_string(), level);
    read_until(stream, PROMPT);
    send_line(stream, position);

    let mut content = vec![0u8; size];
    stream.read_exact(&mut content).expect("read content");
    read_until(stream, BANNER_END);
    content
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// =============================================================================
// Credential Gate Tests
// =============================================================================

#[test]
fn test_wrong_credential_closes_session() {
    let (addr, _directory) = start_server(1 << 20);

    let mut stream = TcpStream::connect(addr).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout");

    read_until(&mut stream, b"cred:\n");
    send_line(&mut stream, "not-the-secret");

    // No banner, no detail: the stream just closes
    let rest = read_to_eof(&mut stream);
    assert!(!contains(&rest, b"Notebook Manager"));
}

#[test]
fn test_prefix_credential_is_rejected() {
    let (addr, _directory) = start_server(1 << 20);

    let mut stream = TcpStream::connect(addr).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout");

    read_until(&mut stream, b"cred:\n");
    send_line(&mut stream, &SECRET[..4]);

    let rest = read_to_eof(&mut stream);
    assert!(!contains(&rest, b"Notebook Manager"));
}

#[test]
fn test_correct_credential_reaches_menu() {
    let (addr, _directory) = start_server(1 << 20);
    let _stream = open_session(addr);
}

// =============================================================================
// Scenario Tests
// =============================================================================

#[test]
fn test_add_show_edit_delete_round_trip() {
    let (addr, directory) = start_server(1 << 20);
    let mut stream = open_session(addr);

    // ADD 256 bytes of 'A'
    add(&mut stream, 256, "0", b'A');
    assert_eq!(directory.bucket_count(), 1);

    // SHOW position 0 returns the same bytes
    let content = show(&mut stream, 256, "0", "0");
    assert_eq!(content, vec![b'A'; 256]);

    // EDIT position 0 to 'B'
    locate(&mut stream, "4", "256", "0");
    read_until(&mut stream, PROMPT);
    send_line(&mut stream, "0");
    stream.write_all(&vec![b'B'; 256]).expect("write content");
    read_until(&mut stream, BANNER_END);

    let content = show(&mut stream, 256, "0", "0");
    assert_eq!(content, vec![b'B'; 256]);

    // DELETE position 0 empties and removes the bucket
    locate(&mut stream, "2", "256", "0");
    read_until(&mut stream, PROMPT);
    send_line(&mut stream, "0");
    read_until(&mut stream, BANNER_END);

    assert_eq!(directory.bucket_count(), 0);

    // SHOW against the emptied key now reports a missing bucket
    locate(&mut stream, "3", "256", "0");
    let reply = read_until(&mut stream, BANNER_END);
    assert!(contains(&reply, b"No note list found"));
}

#[test]
fn test_front_insert_order_over_the_wire() {
    let (addr, _directory) = start_server(1 << 20);
    let mut stream = open_session(addr);

    add(&mut stream, 256, "0", b'1');
    add(&mut stream, 256, "0", b'2');

    assert_eq!(show(&mut stream, 256, "0", "0"), vec![b'2'; 256]);
    assert_eq!(show(&mut stream, 256, "0", "1"), vec![b'1'; 256]);
}

// =============================================================================
// Error Reporting Tests
// =============================================================================

#[test]
fn test_invalid_sizes_report_and_session_survives() {
    let (addr, directory) = start_server(1 << 20);
    let mut stream = open_session(addr);

    for bad_size in ["0", "4097", "300"] {
        send_line(&mut stream, "1");
        read_until(&mut stream, PROMPT);
        send_line(&mut stream, bad_size);
        // Rejected before the level prompt
        let reply = read_until(&mut stream, BANNER_END);
        assert!(contains(&reply, b"[X] INVALID"), "size {bad_size} not rejected");
    }

    assert_eq!(directory.bucket_count(), 0);

    // The loop is still alive after the rejections
    add(&mut stream, 256, "0", b'A');
    assert_eq!(directory.bucket_count(), 1);
}

#[test]
fn test_invalid_level_reports_without_creating_bucket() {
    let (addr, directory) = start_server(1 << 20);
    let mut stream = open_session(addr);

    locate(&mut stream, "1", "256", "7");
    let reply = read_until(&mut stream, BANNER_END);
    assert!(contains(&reply, b"[X] INVALID"));
    assert_eq!(directory.bucket_count(), 0);
}

#[test]
fn test_malformed_size_token_reports_invalid() {
    let (addr, _directory) = start_server(1 << 20);
    let mut stream = open_session(addr);

    send_line(&mut stream, "1");
    read_until(&mut stream, PROMPT);
    send_line(&mut stream, "abc");
    let reply = read_until(&mut stream, BANNER_END);
    assert!(contains(&reply, b"[X] INVALID"));

    add(&mut stream, 256, "0", b'A');
}

#[test]
fn test_missing_bucket_reported_before_position_prompt() {
    let (addr, _directory) = start_server(1 << 20);
    let mut stream = open_session(addr);

    locate(&mut stream, "2", "256", "0");
    let reply = read_until(&mut stream, BANNER_END);
    assert!(contains(&reply, b"No note list found"));
}

#[test]
fn test_out_of_range_position_reported() {
    let (addr, directory) = start_server(1 << 20);
    let mut stream = open_session(addr);

    add(&mut stream, 256, "0", b'A');

    // SHOW far past the end
    locate(&mut stream, "3", "256", "0");
    read_until(&mut stream, PROMPT);
    send_line(&mut stream, "5");
    let reply = read_until(&mut stream, BANNER_END);
    assert!(contains(&reply, b"No such page"));

    // EDIT likewise, and no content is expected after the refusal
    locate(&mut stream, "4", "256", "0");
    read_until(&mut stream, PROMPT);
    send_line(&mut stream, "5");
    let reply = read_until(&mut stream, BANNER_END);
    assert!(contains(&reply, b"No such page"));

    // The record is untouched
    assert_eq!(directory.record_count(notekeep::BucketKey::new(256, 0).unwrap()), Some(1));
    assert_eq!(show(&mut stream, 256, "0", "0"), vec![b'A'; 256]);
}

#[test]
fn test_capacity_reported_as_no_more_space() {
    let (addr, directory) = start_server(256);
    let mut stream = open_session(addr);

    add(&mut stream, 256, "0", b'A');

    // The budget is spent; the next add is refused
    locate(&mut stream, "1", "256", "1");
    stream.write_all(&vec![b'B'; 256]).expect("write content");
    let reply = read_until(&mut stream, BANNER_END);
    assert!(contains(&reply, b"No more space"));

    assert_eq!(directory.bucket_count(), 1);
}

// =============================================================================
// Session Termination Tests
// =============================================================================

#[test]
fn test_unknown_selector_ends_session() {
    let (addr, _directory) = start_server(1 << 20);
    let mut stream = open_session(addr);

    send_line(&mut stream, "9");
    let rest = read_to_eof(&mut stream);
    assert!(rest.is_empty());
}

#[test]
fn test_malformed_selector_ends_session() {
    let (addr, _directory) = start_server(1 << 20);
    let mut stream = open_session(addr);

    send_line(&mut stream, "quit");
    let rest = read_to_eof(&mut stream);
    assert!(rest.is_empty());
}

#[test]
fn test_disconnect_ends_only_that_session() {
    let (addr, directory) = start_server(1 << 20);

    let mut first = open_session(addr);
    add(&mut first, 256, "0", b'A');
    drop(first);

    // A later session still sees the shared state
    let mut second = open_session(addr);
    assert_eq!(show(&mut second, 256, "0", "0"), vec![b'A'; 256]);
    assert_eq!(directory.bucket_count(), 1);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_sessions_share_one_bucket() {
    const SESSIONS: usize = 8;

    let (addr, directory) = start_server(1 << 20);

    let workers: Vec<_> = (0..SESSIONS)
        .map(|worker| {
            thread::spawn(move || {
                let mut stream = open_session(addr);
                add(&mut stream, 1024, "3", worker as u8);
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("session thread");
    }

    let key = notekeep::BucketKey::new(1024, 3).unwrap();
    assert_eq!(directory.bucket_count(), 1);
    assert_eq!(directory.record_count(key), Some(SESSIONS));
}
