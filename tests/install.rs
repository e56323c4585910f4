//! End-to-end install and run flows over a loopback HTTP server.

use std::io::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use binwrap::{Arch, BinWrapper, Error, Os};
use tempfile::TempDir;
use url::Url;

fn tar_fixture(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

fn gzip_fixture(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn zip_fixture(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (path, data) in entries {
        writer.start_file(path.to_string(), options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Serve `body` with `status` for every request; returns the base URL and
/// a request counter.
fn serve(body: Vec<u8>, status: u16) -> (String, Arc<AtomicUsize>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();

    let hits = Arc::new(AtomicUsize::new(0));
    let thread_hits = Arc::clone(&hits);

    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            thread_hits.fetch_add(1, Ordering::SeqCst);
            let response = tiny_http::Response::from_data(body.clone()).with_status_code(status);
            let _ = request.respond(response);
        }
    });

    (format!("http://127.0.0.1:{port}"), hits)
}

fn host() -> (Os, Arch) {
    (Os::current().unwrap(), Arch::current().unwrap())
}

fn wrapper_for(url: &str, dest: &TempDir, name: &str) -> BinWrapper {
    let (os, arch) = host();
    BinWrapper::new()
        .src(Url::parse(url).unwrap(), os, arch)
        .dest(dest.path())
        .name(name)
}

#[tokio::test]
async fn installs_member_from_tar() {
    let (base, _) = serve(tar_fixture(&[("dummy.txt", b"dummy-content")]), 200);
    let dest = TempDir::new().unwrap();

    let wrapper = wrapper_for(&format!("{base}/archive.tar"), &dest, "dummy.txt");
    wrapper.install().await.unwrap();

    let installed = dest.path().join("dummy.txt");
    assert_eq!(std::fs::read(&installed).unwrap(), b"dummy-content");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&installed).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}

#[tokio::test]
async fn installs_member_from_gzipped_tar() {
    let archive = gzip_fixture(&tar_fixture(&[("dummy.txt", b"dummy-content")]));
    let (base, _) = serve(archive, 200);
    let dest = TempDir::new().unwrap();

    let wrapper = wrapper_for(&format!("{base}/archive.tar.gz"), &dest, "dummy.txt");
    wrapper.install().await.unwrap();

    assert_eq!(
        std::fs::read(dest.path().join("dummy.txt")).unwrap(),
        b"dummy-content"
    );
}

#[tokio::test]
async fn installs_member_from_zip() {
    let (base, _) = serve(zip_fixture(&[("dummy.txt", b"dummy-content")]), 200);
    let dest = TempDir::new().unwrap();

    let wrapper = wrapper_for(&format!("{base}/archive.zip"), &dest, "dummy.txt");
    wrapper.install().await.unwrap();

    assert_eq!(
        std::fs::read(dest.path().join("dummy.txt")).unwrap(),
        b"dummy-content"
    );
}

#[tokio::test]
async fn second_install_is_a_no_op() {
    let (base, hits) = serve(tar_fixture(&[("dummy.txt", b"dummy-content")]), 200);
    let dest = TempDir::new().unwrap();

    let wrapper = wrapper_for(&format!("{base}/archive.tar"), &dest, "dummy.txt");
    wrapper.install().await.unwrap();
    wrapper.install().await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_member_names_path_and_url() {
    let (base, _) = serve(tar_fixture(&[("other.txt", b"other")]), 200);
    let dest = TempDir::new().unwrap();

    let url = format!("{base}/archive.tar");
    let wrapper = wrapper_for(&url, &dest, "dummy.txt");
    let err = wrapper.install().await.unwrap_err();

    assert!(matches!(err, Error::MemberNotFound { .. }));
    assert_eq!(
        err.to_string(),
        format!("unable to find dummy.txt in {url}")
    );
    assert!(!dest.path().join("dummy.txt").exists());
}

#[tokio::test]
async fn unknown_payload_is_rejected() {
    let (base, _) = serve(b"non-expected-content".to_vec(), 200);
    let dest = TempDir::new().unwrap();

    let wrapper = wrapper_for(&format!("{base}/archive.tar"), &dest, "dummy.txt");
    let err = wrapper.install().await.unwrap_err();

    assert!(matches!(err, Error::UnrecognizedArchive));
    assert_eq!(err.to_string(), "unrecognized archive kind");
}

#[tokio::test]
async fn http_failure_carries_status() {
    let (base, _) = serve(b"gone".to_vec(), 404);
    let dest = TempDir::new().unwrap();

    let wrapper = wrapper_for(&format!("{base}/archive.tar"), &dest, "dummy.txt");
    let err = wrapper.install().await.unwrap_err();

    assert!(matches!(err, Error::Download { .. }));
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn download_errors_redact_credentials() {
    let (base, _) = serve(b"gone".to_vec(), 404);
    let dest = TempDir::new().unwrap();

    let with_creds = base.replace("http://", "http://user:secret@");
    let wrapper = wrapper_for(&format!("{with_creds}/archive.tar"), &dest, "dummy.txt");
    let err = wrapper.install().await.unwrap_err();

    let message = err.to_string();
    assert!(!message.contains("secret"), "leaked credentials: {message}");
    assert!(message.contains("***"));
}

#[tokio::test]
async fn request_headers_are_forwarded() {
    let archive = tar_fixture(&[("dummy.txt", b"dummy-content")]);
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let auth = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("x-dummy-auth"))
                .map(|h| h.value.to_string());
            tx.send(auth).unwrap();
            let _ = request.respond(tiny_http::Response::from_data(archive.clone()));
        }
    });

    let dest = TempDir::new().unwrap();
    let wrapper = wrapper_for(
        &format!("http://127.0.0.1:{port}/archive.tar"),
        &dest,
        "dummy.txt",
    )
    .header("x-dummy-auth", "Bearer XXX");

    wrapper.install().await.unwrap();
    assert_eq!(rx.recv().unwrap().as_deref(), Some("Bearer XXX"));
}

#[tokio::test]
async fn unmatched_platform_downloads_nothing() {
    let (base, hits) = serve(tar_fixture(&[("dummy.txt", b"dummy-content")]), 200);
    let dest = TempDir::new().unwrap();

    // Register a source for some platform other than the host.
    let (os, _) = host();
    let foreign = if os == Os::Windows { Os::Linux } else { Os::Windows };
    let wrapper = BinWrapper::new()
        .src(
            Url::parse(&format!("{base}/archive.tar")).unwrap(),
            foreign,
            Arch::X86_64,
        )
        .dest(dest.path())
        .name("dummy.txt");

    let err = wrapper.install().await.unwrap_err();
    assert!(matches!(err, Error::NoMatch { .. }));
    assert!(err.to_string().starts_with("no package found for"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn occupied_install_path_downloads_nothing() {
    let (base, hits) = serve(tar_fixture(&[("dummy.txt", b"dummy-content")]), 200);
    let dest = TempDir::new().unwrap();
    std::fs::create_dir(dest.path().join("dummy.txt")).unwrap();

    let wrapper = wrapper_for(&format!("{base}/archive.tar"), &dest, "dummy.txt");
    let err = wrapper.install().await.unwrap_err();

    assert!(matches!(err, Error::NotAFile { .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn run_installs_then_reports_exit_code() {
    let script = b"#!/bin/sh\necho ready\nexit 7\n";
    let archive = gzip_fixture(&tar_fixture(&[("tool", script)]));
    let (base, hits) = serve(archive, 200);
    let dest = TempDir::new().unwrap();

    let wrapper = wrapper_for(&format!("{base}/tool.tar.gz"), &dest, "tool");
    let code = wrapper.run(Vec::<String>::new()).await.unwrap();

    assert_eq!(code, 7);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    // A second run reuses the installed binary.
    let code = wrapper.run(Vec::<String>::new()).await.unwrap();
    assert_eq!(code, 7);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
