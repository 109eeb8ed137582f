#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::thread::{self, JoinHandle};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Nothing listens here, so connecting fails immediately.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1/geolife.zip";

pub const SAMPLE_PLT: &[u8] = b"Geolife trajectory\nWGS 84\nAltitude is in Feet\nReserved 3\n\
0,2,255,My Track,0,0,2,8421376\n0\n\
39.984702,116.318417,0,492,39744.1201851852,2008-10-23,02:53:04\n";

/// Write a file, creating parent directories.
pub fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write file");
}

/// Build zip bytes holding `entries`; names ending in '/' become directories.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, body) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).expect("add dir");
        } else {
            writer.start_file(*name, options).expect("start file");
            writer.write_all(body).expect("write entry");
        }
    }
    writer.finish().expect("finish zip").into_inner()
}

pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let bytes = zip_bytes(entries);
    let mut file = File::create(path).expect("create zip");
    file.write_all(&bytes).expect("write zip");
}

/// A zip shaped like the real GeoLife release.
pub fn geolife_zip_bytes() -> Vec<u8> {
    zip_bytes(&[
        ("Geolife Trajectories 1.3/", b""),
        ("Geolife Trajectories 1.3/Data/", b""),
        (
            "Geolife Trajectories 1.3/Data/000/Trajectory/20081023025304.plt",
            SAMPLE_PLT,
        ),
        (
            "Geolife Trajectories 1.3/Data/001/Trajectory/20081028003826.plt",
            SAMPLE_PLT,
        ),
        ("Geolife Trajectories 1.3/User Guide-1.3.pdf", b"%PDF-1.4"),
    ])
}

/// Canned HTTP response for [`serve_once`].
pub struct CannedResponse {
    pub status: &'static str,
    /// Sent as Content-Length; defaults to the body length.
    pub content_length: Option<usize>,
    pub body: Vec<u8>,
}

impl CannedResponse {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: "200 OK",
            content_length: None,
            body,
        }
    }
}

/// Serve a single HTTP request on a loopback port and return its URL.
///
/// The join handle yields the raw request head that was received.
pub fn serve_once(response: CannedResponse) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept connection");

        let mut head = Vec::new();
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            match stream.read(&mut byte) {
                Ok(0) | Err(_) => break,
                Ok(_) => head.push(byte[0]),
            }
        }

        let length = response.content_length.unwrap_or(response.body.len());
        let header = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/zip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            response.status, length
        );
        let _ = stream.write_all(header.as_bytes());
        let _ = stream.write_all(&response.body);
        let _ = stream.flush();

        String::from_utf8_lossy(&head).into_owned()
    });

    (format!("http://{}/geolife.zip", addr), handle)
}
