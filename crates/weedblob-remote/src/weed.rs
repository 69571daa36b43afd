//! SeaweedFS (Weed-FS) HTTP client.
//!
//! Talks to a SeaweedFS master for file id assignment and volume lookup, and
//! to volume servers for the object bytes:
//!
//! 1. `GET {master}/dir/assign` returns a fresh `fid` and the volume server url
//! 2. `POST {volume}/{fid}` uploads the content as `multipart/form-data`
//! 3. `GET {master}/dir/lookup?volumeId={vid}` locates the volume of an fid
//! 4. `GET` / `DELETE {volume}/{fid}` download or remove the object
//!
//! Requests are blocking and issued exactly once. Timeouts and retries are
//! left to the caller.

use std::io::{Cursor, Read};

use serde::Deserialize;
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};
use crate::traits::{BlobReader, RemoteStore};

/// Fixed part of the multipart boundary; the fid is mixed in per upload.
const BOUNDARY_TOKEN: &str = "7f3a9c2e51d4b860";

/// Response from `/dir/assign`.
#[derive(Debug, Deserialize)]
struct Assignment {
    #[serde(default)]
    fid: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    error: String,
}

/// Response from `/dir/lookup`.
#[derive(Debug, Deserialize)]
struct Lookup {
    #[serde(default)]
    locations: Vec<Location>,
    #[serde(default)]
    error: String,
}

#[derive(Debug, Deserialize)]
struct Location {
    url: String,
}

/// Response from a volume server upload.
#[derive(Debug, Deserialize)]
struct UploadReply {
    #[serde(default)]
    size: u64,
    #[serde(default)]
    error: String,
}

/// Blocking SeaweedFS client.
#[derive(Clone, Debug)]
pub struct WeedClient {
    /// Base URL of the master, without a trailing slash.
    master_url: String,
    http: ureq::Agent,
}

impl WeedClient {
    /// Create a client for the master at `master_url`.
    ///
    /// A bare `host:port` is treated as `http://host:port`.
    pub fn new(master_url: &str) -> Self {
        Self {
            master_url: with_scheme(master_url),
            http: ureq::Agent::new(),
        }
    }

    /// The normalized master URL.
    pub fn master_url(&self) -> &str {
        &self.master_url
    }

    fn assign(&self) -> RemoteResult<Assignment> {
        let url = format!("{}/dir/assign", self.master_url);
        let assignment: Assignment = self
            .http
            .get(&url)
            .call()
            .map_err(http_error)?
            .into_json()
            .map_err(|e| RemoteError::Protocol(format!("bad assign response: {e}")))?;

        if !assignment.error.is_empty() {
            return Err(RemoteError::Protocol(format!(
                "assign failed: {}",
                assignment.error
            )));
        }
        if assignment.fid.is_empty() || assignment.url.is_empty() {
            return Err(RemoteError::Protocol(
                "assign response is missing fid or url".into(),
            ));
        }
        Ok(assignment)
    }

    /// Resolve the URL of the object stored under `file_id`.
    fn locate(&self, file_id: &str) -> RemoteResult<String> {
        let vid = volume_id(file_id)?;
        let url = format!("{}/dir/lookup?volumeId={vid}", self.master_url);
        let lookup: Lookup = match self.http.get(&url).call() {
            Ok(resp) => resp
                .into_json()
                .map_err(|e| RemoteError::Protocol(format!("bad lookup response: {e}")))?,
            Err(ureq::Error::Status(404, _)) => {
                return Err(RemoteError::NotFound(file_id.to_string()))
            }
            Err(e) => return Err(http_error(e)),
        };

        if !lookup.error.is_empty() {
            return Err(RemoteError::Protocol(format!(
                "lookup of volume {vid} failed: {}",
                lookup.error
            )));
        }
        let location = lookup
            .locations
            .first()
            .ok_or_else(|| RemoteError::NotFound(file_id.to_string()))?;
        Ok(object_url(&location.url, file_id))
    }
}

impl RemoteStore for WeedClient {
    fn upload(
        &self,
        key_hint: &str,
        content_type: &str,
        content: &mut dyn Read,
    ) -> RemoteResult<String> {
        let assignment = self.assign()?;
        let url = object_url(&assignment.url, &assignment.fid);
        let boundary = format!("weedblob-{BOUNDARY_TOKEN}-{}", assignment.fid.replace(',', "-"));

        let head = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {content_type}\r\n\r\n",
            form_filename(key_hint)
        );
        let tail = format!("\r\n--{boundary}--\r\n");
        let body = Cursor::new(head.into_bytes())
            .chain(content)
            .chain(Cursor::new(tail.into_bytes()));

        let reply: UploadReply = self
            .http
            .post(&url)
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .send(body)
            .map_err(http_error)?
            .into_json()
            .map_err(|e| RemoteError::Protocol(format!("bad upload response: {e}")))?;

        if !reply.error.is_empty() {
            return Err(RemoteError::Protocol(format!("upload failed: {}", reply.error)));
        }
        debug!(fid = %assignment.fid, size = reply.size, "uploaded object");
        Ok(assignment.fid)
    }

    fn download(&self, file_id: &str) -> RemoteResult<BlobReader> {
        let url = self.locate(file_id)?;
        match self.http.get(&url).call() {
            Ok(resp) => Ok(resp.into_reader()),
            Err(ureq::Error::Status(404, _)) => Err(RemoteError::NotFound(file_id.to_string())),
            Err(e) => Err(http_error(e)),
        }
    }

    fn delete(&self, file_id: &str) -> RemoteResult<()> {
        let url = self.locate(file_id)?;
        match self.http.delete(&url).call() {
            Ok(_) => {
                debug!(fid = file_id, "deleted object");
                Ok(())
            }
            Err(ureq::Error::Status(404, _)) => Err(RemoteError::NotFound(file_id.to_string())),
            Err(e) => Err(http_error(e)),
        }
    }

    fn status(&self) -> RemoteResult<()> {
        let url = format!("{}/dir/status", self.master_url);
        self.http.get(&url).call().map_err(http_error)?;
        Ok(())
    }
}

fn http_error(err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, resp) => RemoteError::Http {
            status,
            message: resp.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(t) => RemoteError::Unavailable(t.to_string()),
    }
}

/// Prefix `http://` unless the URL already names a scheme; drop trailing `/`.
fn with_scheme(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

fn object_url(volume_url: &str, file_id: &str) -> String {
    format!("{}/{file_id}", with_scheme(volume_url))
}

/// The volume id of a `volume,needle[_n]` file id.
fn volume_id(file_id: &str) -> RemoteResult<&str> {
    match file_id.split_once(',') {
        Some((vid, needle))
            if !vid.is_empty() && vid.bytes().all(|b| b.is_ascii_digit()) && !needle.is_empty() =>
        {
            Ok(vid)
        }
        _ => Err(RemoteError::InvalidFileId(file_id.to_string())),
    }
}

/// Make a key safe to embed in a quoted multipart filename.
fn form_filename(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '"' | '\\' | '\r' | '\n' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    /// One request as the canned server received it.
    struct Seen {
        head: String,
        body: Vec<u8>,
    }

    impl Seen {
        fn request_line(&self) -> &str {
            self.head.lines().next().unwrap_or_default()
        }
    }

    /// Read a request head and its body, undoing chunked transfer coding.
    fn read_request(stream: &TcpStream) -> Seen {
        let mut reader = BufReader::new(stream);
        let mut head = String::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 {
                break;
            }
            let blank = line == "\r\n";
            head.push_str(&line);
            if blank {
                break;
            }
        }

        let lower = head.to_ascii_lowercase();
        let mut body = Vec::new();
        if lower.contains("transfer-encoding: chunked") {
            loop {
                let mut size_line = String::new();
                reader.read_line(&mut size_line).unwrap();
                let size_hex = size_line.trim().split(';').next().unwrap();
                let size = usize::from_str_radix(size_hex, 16).unwrap();
                // Chunk data plus its trailing CRLF.
                let mut chunk = vec![0u8; size + 2];
                reader.read_exact(&mut chunk).unwrap();
                if size == 0 {
                    break;
                }
                body.extend_from_slice(&chunk[..size]);
            }
        } else if let Some(len) = lower
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            body.resize(len, 0);
            reader.read_exact(&mut body).unwrap();
        }
        Seen { head, body }
    }

    /// Serve one connection per scripted `(status line, body)` reply, in
    /// order, and hand back the requests received. `{addr}` in a body is
    /// replaced by the server's own address so replies can point the client
    /// back at it as a volume server.
    fn serve_script(replies: Vec<(&'static str, &'static str)>) -> (String, thread::JoinHandle<Vec<Seen>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let own = addr.clone();
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for (status_line, body) in replies {
                let (mut stream, _) = listener.accept().unwrap();
                seen.push(read_request(&stream));
                let body = body.replace("{addr}", &own);
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).unwrap();
            }
            seen
        });
        (addr, handle)
    }

    fn serve_once(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<Vec<Seen>>) {
        serve_script(vec![(status_line, body)])
    }

    // -----------------------------------------------------------------------
    // URL and file id helpers
    // -----------------------------------------------------------------------

    #[test]
    fn master_url_gets_scheme_and_loses_trailing_slash() {
        assert_eq!(WeedClient::new("localhost:9333/").master_url(), "http://localhost:9333");
        assert_eq!(
            WeedClient::new("https://weed.example.com").master_url(),
            "https://weed.example.com"
        );
    }

    #[test]
    fn object_url_joins_volume_and_fid() {
        assert_eq!(object_url("127.0.0.1:8080", "3,01637037d6"), "http://127.0.0.1:8080/3,01637037d6");
    }

    #[test]
    fn volume_id_parsing() {
        assert_eq!(volume_id("3,01637037d6").unwrap(), "3");
        assert_eq!(volume_id("42,abc_1").unwrap(), "42");
        for bad in ["", "3", ",abc", "x,abc", "3,"] {
            assert!(matches!(volume_id(bad), Err(RemoteError::InvalidFileId(_))), "{bad}");
        }
    }

    #[test]
    fn filename_is_sanitized() {
        assert_eq!(form_filename("a\"b\\c\r\nd"), "a_b_c__d");
        assert_eq!(form_filename("sha1-abc"), "sha1-abc");
    }

    #[test]
    fn assignment_parses_master_reply() {
        let json = r#"{"fid":"3,01637037d6","url":"127.0.0.1:8080","publicUrl":"localhost:8080","count":1}"#;
        let a: Assignment = serde_json::from_str(json).unwrap();
        assert_eq!(a.fid, "3,01637037d6");
        assert_eq!(a.url, "127.0.0.1:8080");
        assert!(a.error.is_empty());
    }

    #[test]
    fn lookup_parses_locations() {
        let json = r#"{"volumeId":"3","locations":[{"url":"127.0.0.1:8080","publicUrl":"localhost:8080"}]}"#;
        let l: Lookup = serde_json::from_str(json).unwrap();
        assert_eq!(l.locations.len(), 1);
        assert_eq!(l.locations[0].url, "127.0.0.1:8080");
    }

    // -----------------------------------------------------------------------
    // HTTP behaviour against a canned server
    // -----------------------------------------------------------------------

    #[test]
    fn status_ok_against_healthy_master() {
        let (addr, handle) = serve_once("200 OK", r#"{"Topology":{}}"#);
        WeedClient::new(&addr).status().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn status_reports_http_failure() {
        let (addr, handle) = serve_once("500 Internal Server Error", "{}");
        let err = WeedClient::new(&addr).status().unwrap_err();
        assert!(matches!(err, RemoteError::Http { status: 500, .. }));
        handle.join().unwrap();
    }

    #[test]
    fn status_unreachable_master_is_unavailable() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = WeedClient::new(&format!("127.0.0.1:{port}")).status().unwrap_err();
        assert!(err.is_unavailable(), "{err}");
    }

    #[test]
    fn download_of_unknown_volume_is_not_found() {
        let (addr, handle) = serve_once("404 Not Found", r#"{"error":"volume id 9 not found"}"#);
        let result = WeedClient::new(&addr).download("9,deadbeef");
        assert!(matches!(result, Err(ref e) if e.is_not_found()));
        handle.join().unwrap();
    }

    #[test]
    fn download_rejects_malformed_fid_without_network() {
        let result = WeedClient::new("127.0.0.1:1").download("not-a-fid");
        assert!(matches!(result, Err(RemoteError::InvalidFileId(_))));
    }

    #[test]
    fn upload_reports_assign_error() {
        let (addr, handle) = serve_once("200 OK", r#"{"error":"No free volumes left!"}"#);
        let err = WeedClient::new(&addr)
            .upload("k", crate::OCTET_STREAM, &mut &b"data"[..])
            .unwrap_err();
        assert!(matches!(err, RemoteError::Protocol(_)), "{err}");
        handle.join().unwrap();
    }

    #[test]
    fn upload_assigns_then_posts_multipart() {
        let (addr, handle) = serve_script(vec![
            ("200 OK", r#"{"fid":"3,01637037d6","url":"{addr}","publicUrl":"{addr}","count":1}"#),
            ("201 Created", r#"{"name":"sha1-abc","size":11}"#),
        ]);
        let fid = WeedClient::new(&addr)
            .upload("sha1-abc", crate::OCTET_STREAM, &mut &b"hello bytes"[..])
            .unwrap();
        assert_eq!(fid, "3,01637037d6");

        let seen = handle.join().unwrap();
        assert!(seen[0].request_line().starts_with("GET /dir/assign "));
        assert!(seen[1].request_line().starts_with("POST /3,01637037d6 "));

        let boundary = "weedblob-7f3a9c2e51d4b860-3-01637037d6";
        let head = seen[1].head.to_ascii_lowercase();
        assert!(head.contains(&format!("content-type: multipart/form-data; boundary={boundary}")));

        let body = String::from_utf8(seen[1].body.clone()).unwrap();
        assert!(body.starts_with(&format!("--{boundary}\r\n")), "{body}");
        assert!(body.contains(r#"name="file"; filename="sha1-abc""#), "{body}");
        assert!(body.contains("Content-Type: application/octet-stream\r\n\r\nhello bytes"), "{body}");
        assert!(body.ends_with(&format!("\r\n--{boundary}--\r\n")), "{body}");
    }

    #[test]
    fn upload_reports_volume_error() {
        let (addr, handle) = serve_script(vec![
            ("200 OK", r#"{"fid":"3,01","url":"{addr}"}"#),
            ("200 OK", r#"{"error":"volume is read only"}"#),
        ]);
        let err = WeedClient::new(&addr)
            .upload("k", crate::OCTET_STREAM, &mut &b"data"[..])
            .unwrap_err();
        assert!(matches!(err, RemoteError::Protocol(ref m) if m.contains("read only")), "{err}");
        handle.join().unwrap();
    }

    #[test]
    fn download_looks_up_volume_then_reads_object() {
        let (addr, handle) = serve_script(vec![
            ("200 OK", r#"{"volumeId":"3","locations":[{"url":"{addr}","publicUrl":"{addr}"}]}"#),
            ("200 OK", "stored content"),
        ]);
        let mut reader = match WeedClient::new(&addr).download("3,01637037d6") {
            Ok(reader) => reader,
            Err(e) => panic!("download failed: {e}"),
        };
        let mut content = String::new();
        reader.read_to_string(&mut content).unwrap();
        assert_eq!(content, "stored content");

        let seen = handle.join().unwrap();
        assert!(seen[0].request_line().starts_with("GET /dir/lookup?volumeId=3 "));
        assert!(seen[1].request_line().starts_with("GET /3,01637037d6 "));
    }

    #[test]
    fn delete_looks_up_volume_then_deletes_object() {
        let (addr, handle) = serve_script(vec![
            ("200 OK", r#"{"volumeId":"3","locations":[{"url":"{addr}"}]}"#),
            ("202 Accepted", r#"{"size":14}"#),
        ]);
        WeedClient::new(&addr).delete("3,01637037d6").unwrap();

        let seen = handle.join().unwrap();
        assert!(seen[0].request_line().starts_with("GET /dir/lookup?volumeId=3 "));
        assert!(seen[1].request_line().starts_with("DELETE /3,01637037d6 "));
    }

    #[test]
    fn delete_of_missing_object_is_not_found() {
        let (addr, handle) = serve_script(vec![
            ("200 OK", r#"{"volumeId":"3","locations":[{"url":"{addr}"}]}"#),
            ("404 Not Found", "{}"),
        ]);
        let err = WeedClient::new(&addr).delete("3,01637037d6").unwrap_err();
        assert!(err.is_not_found(), "{err}");
        handle.join().unwrap();
    }
}
