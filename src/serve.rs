//! Development server with live reload.
//!
//! Builds the site once, then:
//!
//! - serves the output directory over HTTP (`tiny_http`), injecting a small
//!   script into every HTML response that connects back over a WebSocket
//! - accepts those WebSocket connections on the next port up
//!   (`tungstenite`)
//! - watches the content, asset and style directories (`notify`), rebuilds
//!   on change, and tells every connected page to reload
//!
//! The HTTP server and the WebSocket listener run on their own threads; the
//! watch loop runs on the async runtime.

use crate::build::build_site;
use crate::config::Config;
use crate::template::Registry;
use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use percent_encoding::percent_decode_str;
use std::ffi::OsString;
use std::net::{TcpListener, TcpStream};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tiny_http::{Header, Request, Response, Server, StatusCode};
use tokio::sync::mpsc;
use tungstenite::{Message, WebSocket};

/// How long to wait for a burst of file events to settle before rebuilding.
const DEBOUNCE: Duration = Duration::from_millis(200);

const INTERFACE: &str = "127.0.0.1";

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Builds the site and serves it on `port` until the process is killed,
/// rebuilding whenever a source file changes. Live-reload sockets are
/// accepted on `port + 1`.
pub async fn serve(config: Config, registry: Registry, port: u16) -> Result<()> {
    build_site(&config, &registry).await?;

    let reload_port = port
        .checked_add(1)
        .ok_or_else(|| anyhow!("no port above {} for live reload", port))?;
    let server = Server::http((INTERFACE, port))
        .map_err(|err| anyhow!("binding {}:{}: {}", INTERFACE, port, err))?;
    let listener = TcpListener::bind((INTERFACE, reload_port))
        .with_context(|| format!("binding {}:{}", INTERFACE, reload_port))?;

    let root = config.output_directory.clone();
    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            if let Err(err) = handle_request(request, &root, reload_port) {
                warn!("request failed: {:#}", err);
            }
        }
    });

    let clients = Clients::default();
    let accepted = Arc::clone(&clients);
    std::thread::spawn(move || accept_clients(listener, accepted));

    let (tx, mut rx) = mpsc::channel(64);
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
        // only fails once the watch loop below is gone
        let _ = tx.blocking_send(event);
    })?;
    for dir in config.source_directories() {
        if dir.exists() {
            watcher
                .watch(dir, RecursiveMode::Recursive)
                .with_context(|| format!("watching `{}`", dir.display()))?;
        }
    }

    info!("serving `{}` at http://{}:{}", config.output_directory.display(), INTERFACE, port);

    while let Some(event) = rx.recv().await {
        if !triggers_rebuild(event) {
            continue;
        }
        tokio::time::sleep(DEBOUNCE).await;
        while rx.try_recv().is_ok() {}

        info!("change detected, rebuilding");
        match build_site(&config, &registry).await {
            Ok(_) => reload(&clients),
            Err(err) => error!("rebuild failed: {}", err),
        }
    }
    Ok(())
}

/// Reads from the sources (including our own builds) show up as access
/// events; only creations, modifications and removals count.
fn triggers_rebuild(event: notify::Result<Event>) -> bool {
    match event {
        Ok(event) => matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ),
        Err(err) => {
            warn!("watch error: {}", err);
            false
        }
    }
}

fn lock(clients: &Clients) -> MutexGuard<'_, Vec<WebSocket<TcpStream>>> {
    clients.lock().unwrap_or_else(PoisonError::into_inner)
}

fn accept_clients(listener: TcpListener, clients: Clients) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                warn!("accepting reload client: {}", err);
                continue;
            }
        };
        match tungstenite::accept(stream) {
            Ok(socket) => {
                let mut clients = lock(&clients);
                clients.push(socket);
                debug!("reload client connected ({} total)", clients.len());
            }
            Err(err) => warn!("websocket handshake failed: {}", err),
        }
    }
}

/// Tells every connected page to reload, dropping the ones that are gone.
fn reload(clients: &Clients) {
    let mut clients = lock(clients);
    clients.retain_mut(|socket| socket.send(Message::text("reload")).is_ok());
    debug!("reloaded {} clients", clients.len());
}

fn handle_request(request: Request, root: &Path, reload_port: u16) -> Result<()> {
    let (path, status) = match resolve(root, request.url()) {
        Some(path) => (path, 200),
        None => (root.join("404.html"), 404),
    };
    debug!("{} {} -> {:?}", request.method(), request.url(), path);

    let body = match std::fs::read(&path) {
        Ok(body) => body,
        Err(_) => {
            let response = Response::from_string("404 Not Found").with_status_code(StatusCode(404));
            return request.respond(response).context("responding");
        }
    };
    let content_type = content_type(&path);
    let body = match content_type.starts_with("text/html") {
        true => inject_reload(&String::from_utf8_lossy(&body), reload_port).into_bytes(),
        false => body,
    };
    let header = Header::from_bytes("Content-Type", content_type)
        .map_err(|()| anyhow!("invalid content type `{}`", content_type))?;
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header);
    request.respond(response).context("responding")
}

/// Maps a request URL onto a file below `root`: the path is
/// percent-decoded, `/` is `index.html`, extensionless pages get `.html`,
/// and directories serve their `index.html`. Returns `None` for missing
/// files and for URLs that would escape `root`.
fn resolve(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let path = percent_decode_str(path).decode_utf8().ok()?;
    let relative = Path::new(path.trim_start_matches('/'));
    if relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_)))
    {
        return None;
    }

    let candidate = root.join(relative);
    if candidate.is_file() {
        return Some(candidate);
    }
    if !relative.as_os_str().is_empty() {
        let mut html = OsString::from(candidate.as_os_str());
        html.push(".html");
        let html = PathBuf::from(html);
        if html.is_file() {
            return Some(html);
        }
    }
    let index = candidate.join("index.html");
    index.is_file().then_some(index)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("xsl") => "text/xsl; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",
        Some("mp4") => "video/mp4",
        Some("woff2") => "font/woff2",
        Some("woff") => "font/woff",
        _ => "application/octet-stream",
    }
}

/// Adds the live-reload script just before `</body>`.
fn inject_reload(html: &str, port: u16) -> String {
    let script = format!(
        "<script>new WebSocket(`ws://${{location.hostname}}:{}`).onmessage = () => location.reload();</script>",
        port
    );
    match html.rfind("</body>") {
        Some(at) => [&html[..at], &script, &html[at..]].concat(),
        None => html.to_owned() + &script,
    }
}
