//! CLI command implementations.

pub mod users;

use outlay_shell::config::ShellConfig;

/// Initialize Sentry error tracking if a DSN is configured.
///
/// The returned guard must be kept alive for the duration of the command.
pub fn init_sentry(config: &ShellConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    Some(sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    )))
}
