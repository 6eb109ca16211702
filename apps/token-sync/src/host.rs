//! Terminal stand-in for the plugin UI: pull confirmation, push dialog and
//! notifications.

use sync_core::sync::{PushSettings, SyncHost};

use models::{StorageProvider, SyncContext};

use async_trait::async_trait;
use log::{error, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

type Input = Box<dyn AsyncBufRead + Unpin + Send>;
type Output = Box<dyn AsyncWrite + Unpin + Send>;

#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    /// Answer every question with its default, confirming pulls.
    pub assume_yes: bool,
    pub branch: Option<String>,
    pub commit_message: Option<String>,
    pub default_commit_message: String,
}

pub struct TerminalHost {
    input: Mutex<Input>,
    output: Mutex<Output>,
    options: PromptOptions,
}

impl TerminalHost {
    pub fn stdio(options: PromptOptions) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stderr(), options)
    }

    pub fn new(
        input: impl AsyncBufRead + Unpin + Send + 'static,
        output: impl AsyncWrite + Unpin + Send + 'static,
        options: PromptOptions,
    ) -> Self {
        Self {
            input: Mutex::new(Box::new(input)),
            output: Mutex::new(Box::new(output)),
            options,
        }
    }

    async fn say(&self, line: &str) {
        let mut output = self.output.lock().await;
        let written = async {
            output.write_all(line.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await
        }
        .await;
        if let Err(e) = written {
            warn!("Failed to write to terminal: {}", e);
        }
    }

    /// `None` when input is closed.
    async fn ask(&self, question: &str) -> Option<String> {
        {
            let mut output = self.output.lock().await;
            let written = async {
                output.write_all(question.as_bytes()).await?;
                output.flush().await
            }
            .await;
            if let Err(e) = written {
                warn!("Failed to write prompt: {}", e);
            }
        }

        let mut answer = String::new();
        match self.input.lock().await.read_line(&mut answer).await {
            Ok(0) => None,
            Ok(_) => Some(answer.trim().to_string()),
            Err(e) => {
                warn!("Failed to read answer: {}", e);
                None
            }
        }
    }

    /// Preset value, else the default under `--yes`, else a prompt.
    async fn choose(&self, preset: Option<&String>, question: &str, default: &str) -> Option<String> {
        if let Some(preset) = preset {
            return Some(preset.clone());
        }
        if self.options.assume_yes {
            return Some(default.to_string());
        }
        let answer = self.ask(&format!("{question} [{default}]: ")).await?;
        Some(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }
}

#[async_trait]
impl SyncHost for TerminalHost {
    async fn confirm_pull(&self, provider: StorageProvider) -> bool {
        if self.options.assume_yes {
            info!("Pull from {} confirmed by --yes", provider);
            return true;
        }

        let question =
            format!("Tokens on {provider} differ from your local tokens. Overwrite local tokens? [y/N] ");
        matches!(
            self.ask(&question).await.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("y" | "yes")
        )
    }

    async fn push_dialog(&self, context: &SyncContext, branches: &[String]) -> Option<PushSettings> {
        if !self.options.assume_yes && self.options.branch.is_none() {
            self.say(&format!("Branches: {}", branches.join(", "))).await;
        }

        let branch = self
            .choose(self.options.branch.as_ref(), "Branch", context.branch_or_default())
            .await?;
        let commit_message = self
            .choose(
                self.options.commit_message.as_ref(),
                "Commit message",
                &self.options.default_commit_message,
            )
            .await?;

        Some(PushSettings {
            branch,
            commit_message,
        })
    }

    async fn push_succeeded(&self, branch: &str, pull_request_url: Option<&str>) {
        self.say(&format!("Pushed to {branch}")).await;
        if let Some(url) = pull_request_url {
            self.say(&format!("Open a pull request: {url}")).await;
        }
    }

    async fn notify(&self, message: &str, is_error: bool) {
        if is_error {
            error!("{}", message);
            self.say(&format!("error: {message}")).await;
        } else {
            info!("{}", message);
            self.say(message).await;
        }
    }
}
