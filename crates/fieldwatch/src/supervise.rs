use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;

use fieldwatch::config::{self, Settings};
use fieldwatch::frame::{FrameConfig, FramingMode};
use fieldwatch::link::SerialOpener;
use fieldwatch::notify::{AlertQueue, AlertSink, SmtpConfig, SmtpNotifier};
use fieldwatch::supervisor::{Dispatcher, LinkConfig, LinkManager, Supervisor, TagTable};
use tracing::info;

use crate::exit::{self, CliError, CliResult};

/// Load settings, wire the components together and supervise forever.
///
/// Only startup can fail; once the loop is running the process exits on a
/// termination signal and nothing else.
pub fn run(path: &Path) -> CliResult<Infallible> {
    let settings = config::load_settings(path).map_err(exit::config_error)?;

    let notifier = SmtpNotifier::new(&smtp_config(&settings))
        .map_err(|err| exit::notify_error("smtp", err))?;
    let (queue, _worker) = AlertQueue::spawn(notifier, settings.smtp.queue_capacity)
        .map_err(|err| exit::notify_error("notifier", err))?;
    let alerts: Arc<dyn AlertSink> = Arc::new(queue);

    let table = TagTable::with_overrides(
        settings.protocol.heartbeat_tag,
        settings.protocol.alerts.clone(),
    )
    .map_err(|err| exit::supervisor_error("protocol", err))?;
    let dispatcher = Dispatcher::new(table, Arc::clone(&alerts));

    let opener = SerialOpener::new(settings.serial.device.clone(), settings.serial.baud)
        .with_read_timeout(settings.serial.read_timeout());
    let links = LinkManager::new(opener, link_config(&settings), alerts);

    ctrlc::set_handler(|| {
        info!("termination requested; exiting");
        std::process::exit(exit::SUCCESS);
    })
    .map_err(|err| CliError::new(exit::INTERNAL, format!("signal handler: {err}")))?;

    info!(
        device = %settings.serial.device,
        baud = settings.serial.baud,
        heartbeat_tag = %dispatcher.table().heartbeat_tag(),
        "fieldwatch starting"
    );
    Supervisor::new(links, dispatcher).run()
}

fn smtp_config(settings: &Settings) -> SmtpConfig {
    let smtp = &settings.smtp;
    SmtpConfig {
        host: smtp.host.clone(),
        port: smtp.port,
        user: smtp.user.clone(),
        password: smtp.password.clone(),
        from: smtp.from.clone(),
        to: Some(smtp.recipient().to_string()),
        subject_prefix: smtp.subject_prefix.clone(),
        starttls: smtp.starttls,
        timeout: smtp.timeout(),
    }
}

fn link_config(settings: &Settings) -> LinkConfig {
    let mode = match settings.framing.mode {
        config::FramingMode::Delimited => FramingMode::Delimited,
        config::FramingMode::FixedLegacy => FramingMode::FixedLegacy,
    };
    LinkConfig {
        reconnect_backoff: settings.serial.reconnect_backoff(),
        heartbeat_timeout: settings.watchdog.timeout(),
        frame: FrameConfig {
            mode,
            max_frame_len: settings.framing.max_frame_len,
        },
    }
}
