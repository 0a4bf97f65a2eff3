//! Transport plumbing shared by clone and fetch: credentials,
//! cancellation, and the caller-side reachability probe.

use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use git2::{Cred, FetchOptions, FetchPrune, RemoteCallbacks};
use tracing::debug;
use trunkflight_core::GitRepo;
use url::Url;

/// Builds callbacks that present the record's HTTP(S) credentials and stop
/// the transfer once `cancel` is set.
///
/// Credentials are offered once; if the remote rejects them libgit2 would
/// otherwise ask again forever.
pub(crate) fn remote_callbacks<'a>(
    repo: &'a GitRepo,
    cancel: Option<&'a AtomicBool>,
) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();

    if let Some((user, pass)) = repo.http_credentials() {
        let mut offered = false;
        callbacks.credentials(move |_url, _username_from_url, _allowed| {
            if offered {
                return Err(git2::Error::from_str(
                    "authentication failed: credentials rejected by remote",
                ));
            }
            offered = true;
            Cred::userpass_plaintext(user, pass)
        });
    }

    if let Some(flag) = cancel {
        callbacks.transfer_progress(move |_progress| !flag.load(Ordering::SeqCst));
    }

    callbacks
}

/// Fetch options for `repo`; `prune` drops remote-tracking refs whose
/// upstream branch is gone.
pub(crate) fn fetch_options<'a>(
    repo: &'a GitRepo,
    cancel: Option<&'a AtomicBool>,
    prune: bool,
) -> FetchOptions<'a> {
    let mut opts = FetchOptions::new();
    opts.remote_callbacks(remote_callbacks(repo, cancel));
    if prune {
        opts.prune(FetchPrune::On);
    }
    opts
}

/// Returns `true` if the error was raised because a callback asked libgit2
/// to stop.
pub(crate) fn is_user_abort(err: &git2::Error) -> bool {
    err.code() == git2::ErrorCode::User
}

// ---------------------------------------------------------------------------
// Reachability probe
// ---------------------------------------------------------------------------

/// Checks whether the host of an HTTP(S) remote accepts TCP connections
/// within `timeout`.
///
/// Remotes on other transports are reported reachable, as is anything that
/// does not parse as a URL; the real operation will surface a proper error.
pub fn probe_remote(url: &str, timeout: Duration) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return true;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return true;
    }
    let (Some(host), Some(port)) = (parsed.host_str(), parsed.port_or_known_default()) else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');

    let addrs = match (host, port).to_socket_addrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            debug!(host, error = %e, "remote host did not resolve");
            return false;
        }
    };

    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(_) => return true,
            Err(e) => debug!(%addr, error = %e, "remote probe failed"),
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[test]
    fn non_http_remotes_are_reachable() {
        assert!(probe_remote("file:///srv/git/app", TIMEOUT));
        assert!(probe_remote("not a url", TIMEOUT));
    }

    #[test]
    fn open_port_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(probe_remote(&format!("http://127.0.0.1:{port}/team/app.git"), TIMEOUT));
    }

    #[test]
    fn closed_port_is_unreachable() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        assert!(!probe_remote(&format!("http://127.0.0.1:{port}/app.git"), TIMEOUT));
    }

    #[test]
    fn unresolvable_host_is_unreachable() {
        assert!(!probe_remote("https://host.invalid/app.git", TIMEOUT));
    }
}
