use std::borrow::Cow;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub(crate) trait ProgressRenderedText {
    /// Rendered text of a progress step.
    fn msg(&self) -> String;
}

#[derive(Debug)]
pub(crate) enum DeployProgressMessage {
    Reconciling(String),
    Created(String),
    Updated(String),
    WaitingForPods { running: usize, total: usize },
    Success(String),
}

impl ProgressRenderedText for DeployProgressMessage {
    fn msg(&self) -> String {
        use colored::*;

        match self {
            DeployProgressMessage::Reconciling(name) => {
                format!("📝 {} {}", "Reconciling workload".bold(), name)
            }
            DeployProgressMessage::Created(name) => {
                format!("🖥️  {} {}", "Workload created:".bold(), name)
            }
            DeployProgressMessage::Updated(name) => {
                format!("🖥️  {} {}", "Workload updated:".bold(), name)
            }
            DeployProgressMessage::WaitingForPods { running, total } => {
                format!("⏳ Waiting for pods to become ready (running {running} / total {total})")
            }
            DeployProgressMessage::Success(labels) => {
                format!("🎯 {} {}", "Deployment complete with labels:".bold(), labels)
            }
        }
    }
}

/// Renders progress either through an indicatif spinner or plain stdout
/// lines.
#[derive(Debug, Default)]
pub enum ProgressRenderer {
    #[default]
    Plain,
    Indicatif(ProgressBar),
}

impl ProgressRenderer {
    pub fn println(&self, msg: impl Into<Cow<'static, str>>) {
        match self {
            Self::Plain => println!("{}", msg.into()),
            Self::Indicatif(pb) => pb.println(msg.into()),
        }
    }

    pub fn set_message(&self, msg: impl Into<Cow<'static, str>>) {
        match self {
            Self::Plain => println!("{}", msg.into()),
            Self::Indicatif(pb) => pb.set_message(msg),
        }
    }

    pub fn finish_and_clear(&self) {
        if let Self::Indicatif(pb) = self {
            pb.finish_and_clear();
        }
    }
}

impl From<ProgressBar> for ProgressRenderer {
    fn from(pb: ProgressBar) -> Self {
        Self::Indicatif(pb)
    }
}

fn create_spinning_indicator() -> ProgressBar {
    let pb = ProgressBar::new(1);
    if let Ok(style) = ProgressStyle::default_bar().template("{msg} {spinner}") {
        pb.set_style(style.tick_chars("/-\\|"));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[derive(Debug)]
pub struct ProgressBarFactory {
    hide: bool,
}

impl ProgressBarFactory {
    pub fn new(hide: bool) -> Self {
        Self { hide }
    }

    /// Creates a renderer; falls back to plain lines when hidden or in CI.
    pub fn create(&self) -> ProgressRenderer {
        if self.hide || std::env::var("CI").is_ok() {
            Default::default()
        } else {
            create_spinning_indicator().into()
        }
    }
}
