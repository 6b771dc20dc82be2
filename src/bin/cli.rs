//! Notekeep CLI Client
//!
//! One-shot client for the notebook protocol: authenticates, runs a single
//! operation, prints the outcome. Useful for poking at a running server
//! without hand-typing the prompt exchange into netcat.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

/// Menu banner marking the server as ready for the next selector
const BANNER_END: &[u8] = b"[+] 4. Edit a note\n";

/// Credential challenge marker
const CRED_MARK: &[u8] = b"cred:\n";

/// Prompt marker
const PROMPT: &[u8] = b"> ";

/// How long to wait for server output before giving up
const REPLY_TIMEOUT: Duration = Duration::from_millis(2000);

/// How long EDIT waits to see whether the server rejected the position
/// before it commits to sending content
const PROBE_TIMEOUT: Duration = Duration::from_millis(300);

/// Notekeep CLI
#[derive(Parser, Debug)]
#[command(name = "notekeep-cli")]
#[command(about = "CLI for the Notekeep notebook store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:29000")]
    server: String,

    /// Admin credential
    #[arg(short, long)]
    cred: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a note (content is padded to the bucket size)
    Add {
        /// Bucket size in bytes (multiple of 256, at most 4096)
        size: usize,

        /// Security level (0-6)
        level: u8,

        /// The content to store
        content: String,
    },

    /// Delete a note by position
    Del {
        /// Bucket size in bytes
        size: usize,

        /// Security level
        level: u8,

        /// Position within the bucket (0 = most recent)
        position: usize,
    },

    /// Show a note's content by position
    Show {
        /// Bucket size in bytes
        size: usize,

        /// Security level
        level: u8,

        /// Position within the bucket
        position: usize,
    },

    /// Overwrite a note's content by position
    Edit {
        /// Bucket size in bytes
        size: usize,

        /// Security level
        level: u8,

        /// Position within the bucket
        position: usize,

        /// The replacement content
        content: String,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> std::io::Result<()> {
    let mut stream = TcpStream::connect(&args.server)?;
    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(REPLY_TIMEOUT))?;

    // Credential gate
    read_until(&mut stream, CRED_MARK)?;
    send_line(&mut stream, &args.cred)?;
    read_until(&mut stream, BANNER_END).map_err(|_| other("credential rejected"))?;

    match &args.command {
        Commands::Add {
            size,
            level,
            content,
        } => {
            locate(&mut stream, 1, *size, *level)?;
            stream.write_all(&pad_content(content, *size))?;
            finish(&mut stream)
        }
        Commands::Del {
            size,
            level,
            position,
        } => {
            locate(&mut stream, 2, *size, *level)?;
            expect_prompt(&mut stream)?;
            send_line(&mut stream, &position.to_string())?;
            finish(&mut stream)
        }
        Commands::Show {
            size,
            level,
            position,
        } => {
            locate(&mut stream, 3, *size, *level)?;
            expect_prompt(&mut stream)?;
            send_line(&mut stream, &position.to_string())?;

            let reply = read_until(&mut stream, BANNER_END)?;
            let body = strip_banner(&reply);
            if let Some(line) = report_line(body) {
                return Err(other(line));
            }
            // Trailing zero padding is display noise, not content
            let text = String::from_utf8_lossy(trim_nuls(body));
            println!("{text}");
            Ok(())
        }
        Commands::Edit {
            size,
            level,
            position,
            content,
        } => {
            locate(&mut stream, 4, *size, *level)?;
            expect_prompt(&mut stream)?;
            send_line(&mut stream, &position.to_string())?;

            // The server answers immediately on a bad position and says
            // nothing when it expects content; probe briefly before sending.
            stream.set_read_timeout(Some(PROBE_TIMEOUT))?;
            let mut probe = [0u8; 64];
            match stream.read(&mut probe) {
                Ok(n) if n > 0 => {
                    stream.set_read_timeout(Some(REPLY_TIMEOUT))?;
                    let mut reply = probe[..n].to_vec();
                    reply.extend(read_until(&mut stream, BANNER_END)?);
                    let body = strip_banner(&reply);
                    return Err(other(report_line(body).unwrap_or("unexpected reply")));
                }
                Ok(_) => return Err(other("server closed the session")),
                Err(ref e) if is_timeout(e) => {}
                Err(e) => return Err(e),
            }
            stream.set_read_timeout(Some(REPLY_TIMEOUT))?;

            stream.write_all(&pad_content(content, *size))?;
            finish(&mut stream)
        }
    }
}

/// Send a selector and walk the size/level prompts
fn locate(stream: &mut TcpStream, selector: u8, size: usize, level: u8) -> std::io::Result<()> {
    send_line(stream, &selector.to_string())?;
    expect_prompt(stream)?;
    send_line(stream, &size.to_string())?;
    expect_prompt(stream)?;
    send_line(stream, &level.to_string())?;
    Ok(())
}

/// Read up to the next `"> "` prompt; a banner arriving instead means the
/// server refused the step, so surface its report line
fn expect_prompt(stream: &mut TcpStream) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 512];

    loop {
        if buf.ends_with(PROMPT) {
            return Ok(());
        }
        if buf.ends_with(BANNER_END) {
            buf.truncate(buf.len() - BANNER_END.len());
            let body = strip_banner(&buf);
            return Err(other(report_line(body).unwrap_or("operation refused")));
        }
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(other("server closed the connection"));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Wait for the next banner and surface any report line in between
fn finish(stream: &mut TcpStream) -> std::io::Result<()> {
    let reply = read_until(stream, BANNER_END)?;
    let body = strip_banner(&reply);
    match report_line(body) {
        Some(line) => Err(other(line)),
        None => {
            println!("ok");
            Ok(())
        }
    }
}

/// Read until the buffer ends with `marker`
fn read_until(stream: &mut TcpStream, marker: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 512];

    loop {
        if buf.ends_with(marker) {
            buf.truncate(buf.len() - marker.len());
            return Ok(buf);
        }
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(other("server closed the connection"));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn send_line(stream: &mut TcpStream, text: &str) -> std::io::Result<()> {
    stream.write_all(text.as_bytes())?;
    stream.write_all(b"\n")
}

/// Pad or truncate content to exactly the bucket size
fn pad_content(content: &str, size: usize) -> Vec<u8> {
    let mut bytes = content.as_bytes().to_vec();
    bytes.resize(size, 0);
    bytes
}

/// Drop the leading part of the next banner from a reply tail
fn strip_banner(reply: &[u8]) -> &[u8] {
    match reply
        .windows(b"[+] Notebook Manager\n".len())
        .rposition(|w| w == b"[+] Notebook Manager\n")
    {
        Some(at) => &reply[..at],
        None => reply,
    }
}

/// Extract a `[X]`/`[-]` report line from a reply body, if any
fn report_line(body: &[u8]) -> Option<&'static str> {
    if body.starts_with(b"[X] INVALID") {
        Some("invalid size or security level")
    } else if body.starts_with(b"[-] No note list found") {
        Some("no such bucket")
    } else if body.starts_with(b"[-] No such page") {
        Some("no such position")
    } else if body.starts_with(b"[X] No more space") {
        Some("server is out of space")
    } else {
        None
    }
}

fn trim_nuls(body: &[u8]) -> &[u8] {
    let end = body.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &body[..end]
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

fn other(msg: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, msg.to_string())
}
