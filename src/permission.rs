//! One-time permission handshake at startup
//!
//! Recording needs microphone access and a writable cache directory. Both are
//! asked for together, once; a denial of either ends the session.

use crate::error::ControllerError;
use anyhow::Result;
use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use tokio::sync::mpsc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permission {
    RecordAudio,
    WriteStorage,
}

impl Permission {
    pub const REQUIRED: [Permission; 2] = [Permission::RecordAudio, Permission::WriteStorage];

    fn describe(&self) -> &'static str {
        match self {
            Permission::RecordAudio => "record audio from the microphone",
            Permission::WriteStorage => "write recordings to the cache directory",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grant {
    Granted,
    Denied,
}

/// How the grant was obtained
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantSource {
    /// Granted on an earlier launch
    Remembered,
    /// Granted just now; worth persisting
    Prompt,
}

/// Asks the user for permissions. The answer may take arbitrarily long.
#[async_trait(?Send)]
pub trait PermissionPrompt {
    async fn request(&mut self, permissions: &[Permission]) -> Result<Vec<Grant>>;
}

/// Resolve the grant before any control is usable
///
/// The storage directory is created up front; failing that counts as a storage
/// denial regardless of what the user would answer.
pub async fn resolve(
    remembered: bool,
    storage_dir: &Path,
    prompt: &mut dyn PermissionPrompt,
) -> Result<GrantSource, ControllerError> {
    if let Err(e) = ensure_writable(storage_dir) {
        tracing::error!("Storage not writable at {}: {}", storage_dir.display(), e);
        return Err(ControllerError::PermissionDenied);
    }

    if remembered {
        tracing::debug!("Permissions granted on a previous launch");
        return Ok(GrantSource::Remembered);
    }

    let grants = prompt
        .request(&Permission::REQUIRED)
        .await
        .map_err(|e| {
            tracing::error!("Permission prompt failed: {:#}", e);
            ControllerError::PermissionDenied
        })?;

    let all_granted =
        grants.len() == Permission::REQUIRED.len() && grants.iter().all(|g| *g == Grant::Granted);

    if !all_granted {
        tracing::warn!("Permission denied: {:?}", grants);
        return Err(ControllerError::PermissionDenied);
    }

    tracing::info!("Permissions granted");
    Ok(GrantSource::Prompt)
}

fn ensure_writable(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    if std::fs::metadata(dir)?.permissions().readonly() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "directory is read-only",
        ));
    }
    Ok(())
}

/// Interpret a yes/no answer. Anything other than yes is a no.
pub fn parse_answer(line: &str) -> Grant {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Grant::Granted,
        _ => Grant::Denied,
    }
}

/// Yes/no question on the terminal, answered through the shared stdin lines
pub struct TerminalPrompt<'a> {
    lines: &'a mut mpsc::Receiver<String>,
}

impl<'a> TerminalPrompt<'a> {
    pub fn new(lines: &'a mut mpsc::Receiver<String>) -> Self {
        Self { lines }
    }
}

#[async_trait(?Send)]
impl PermissionPrompt for TerminalPrompt<'_> {
    async fn request(&mut self, permissions: &[Permission]) -> Result<Vec<Grant>> {
        let mut stdout = std::io::stdout();
        writeln!(stdout, "recplay needs permission to:")?;
        for permission in permissions {
            writeln!(stdout, "  - {}", permission.describe())?;
        }
        write!(stdout, "Allow? [y/N] ")?;
        stdout.flush()?;

        // Closed stdin counts as a denial
        let grant = match self.lines.recv().await {
            Some(line) => parse_answer(&line),
            None => Grant::Denied,
        };

        Ok(vec![grant; permissions.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedPrompt {
        answer: Vec<Grant>,
        asked: usize,
    }

    #[async_trait(?Send)]
    impl PermissionPrompt for ScriptedPrompt {
        async fn request(&mut self, permissions: &[Permission]) -> Result<Vec<Grant>> {
            assert_eq!(permissions, &Permission::REQUIRED);
            self.asked += 1;
            Ok(self.answer.clone())
        }
    }

    fn prompt(answer: Vec<Grant>) -> ScriptedPrompt {
        ScriptedPrompt { answer, asked: 0 }
    }

    #[tokio::test]
    async fn test_grant_from_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path().join("cache");
        let mut p = prompt(vec![Grant::Granted, Grant::Granted]);

        let source = resolve(false, &storage, &mut p).await.unwrap();
        assert_eq!(source, GrantSource::Prompt);
        assert_eq!(p.asked, 1);
        assert!(storage.is_dir());
    }

    #[tokio::test]
    async fn test_any_denial_ends_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = prompt(vec![Grant::Granted, Grant::Denied]);

        let err = resolve(false, dir.path(), &mut p).await.unwrap_err();
        assert!(matches!(err, ControllerError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_remembered_grant_skips_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = prompt(vec![Grant::Denied, Grant::Denied]);

        let source = resolve(true, dir.path(), &mut p).await.unwrap();
        assert_eq!(source, GrantSource::Remembered);
        assert_eq!(p.asked, 0);
    }

    #[tokio::test]
    async fn test_unusable_storage_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let mut p = prompt(vec![Grant::Granted, Grant::Granted]);

        let err = resolve(true, &blocker.join("cache"), &mut p).await.unwrap_err();
        assert!(matches!(err, ControllerError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_terminal_prompt_reads_answer() {
        let (tx, mut rx) = mpsc::channel(4);
        tx.send("Yes\n".to_string()).await.unwrap();
        let grants = TerminalPrompt::new(&mut rx)
            .request(&Permission::REQUIRED)
            .await
            .unwrap();
        assert_eq!(grants, vec![Grant::Granted, Grant::Granted]);

        drop(tx);
        let grants = TerminalPrompt::new(&mut rx)
            .request(&Permission::REQUIRED)
            .await
            .unwrap();
        assert_eq!(grants, vec![Grant::Denied, Grant::Denied]);
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("y"), Grant::Granted);
        assert_eq!(parse_answer("  YES "), Grant::Granted);
        assert_eq!(parse_answer(""), Grant::Denied);
        assert_eq!(parse_answer("no"), Grant::Denied);
        assert_eq!(parse_answer("sure"), Grant::Denied);
    }
}
