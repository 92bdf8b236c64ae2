//! Remote commands for the containers running on the appliance.

use crate::domain::quote::quote_arg;

/// Prefix of every command proxied to the daemon with a terminal attached.
pub const DAEMON_EXEC: &str = "docker exec -i -t acroboxd acroboxd";

/// Prints the daemon's metrics document.
pub const METRICS_COMMAND: &str = "docker exec acroboxd acroboxd metrics";

/// Starts a restore; prints `{"container_id": ...}` for the restore job.
pub const RESTORE_COMMAND: &str = "docker exec acroboxd acroboxd restore";

/// Follows the logs of a container given as the next argument.
pub const FOLLOW_LOGS_COMMAND: &str = "docker logs -f";

pub const PSQL_COMMAND: &str = "docker exec -i -t -u postgres postgres psql";

pub const REDIS_CLI_COMMAND: &str = "docker exec -i -t -u redis redis redis-cli";

/// Prints the password of the appliance's postgres user.
pub const DATABASE_PASSWORD_COMMAND: &str =
    r#"jq -r '.environment."acrobox/acroboxd".POSTGRES_PASSWORD' /acrobox/config.json"#;

/// Remote directory deploy archives are pushed into.
pub const IMAGE_STAGING_DIR: &str = "/tmp";

/// Repository part of an image reference: `web:1.2` and `web@sha256:..`
/// both export as `web`.
#[must_use]
pub fn image_name(reference: &str) -> &str {
    reference
        .split([':', '@'])
        .next()
        .unwrap_or(reference)
}

/// Loads the archive at `path` into the remote engine, then deletes it.
#[must_use]
pub fn load_command(path: &str) -> String {
    let archive = quote_arg(path);
    format!(
        "sh -c {}",
        quote_arg(&format!("docker load -i {archive} && rm {archive}"))
    )
}
