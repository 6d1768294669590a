use std::future::Future;

use russh::client;
use russh::keys;
use russh::{MethodKind, MethodSet};

/// Client handler that trusts every host key.
///
/// Host keys are not pinned: the browser user has no channel to confirm a
/// fingerprint through the terminal.
pub(super) struct AcceptAllHosts;

impl client::Handler for AcceptAllHosts {
    type Error = russh::Error;

    fn check_server_key(
        &mut self,
        server_public_key: &keys::PublicKey,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        tracing::debug!(algorithm = ?server_public_key.algorithm(), "accepting server host key");
        async { Ok(true) }
    }
}

/// Auth methods the server still accepts, as shown in the auth error.
pub(super) fn allowed_methods(methods: &MethodSet) -> String {
    if methods.is_empty() {
        return "none".into();
    }
    let names: Vec<&'static str> = methods.iter().map(<&'static str>::from).collect();
    names.join(", ")
}
