use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::contract::Cloner;
use crate::error::CloneError;
use crate::selection::CloneTarget;

/// Clones through the system tools: `git clone` for URLs and
/// `gh repo clone` for `owner/repo` references.
///
/// Both run without stdin and with terminal prompting disabled, so a
/// repository that needs credentials fails instead of hanging the batch.
/// No timeout is applied.
#[derive(Debug, Clone)]
pub struct CommandCloner {
    git: String,
    gh: String,
}

impl Default for CommandCloner {
    fn default() -> Self {
        Self {
            git: "git".into(),
            gh: "gh".into(),
        }
    }
}

impl CommandCloner {
    /// Use explicit executables instead of looking up `git` and `gh` on `PATH`.
    pub fn with_programs(git: impl Into<String>, gh: impl Into<String>) -> Self {
        Self {
            git: git.into(),
            gh: gh.into(),
        }
    }

    fn command_for(&self, target: &CloneTarget, dest: &Path) -> Command {
        let mut command = match target {
            CloneTarget::Url(url) => {
                let mut c = Command::new(&self.git);
                c.arg("clone").arg(url).arg(dest);
                c
            }
            CloneTarget::Reference(reference) => {
                let mut c = Command::new(&self.gh);
                c.args(["repo", "clone", reference.as_str()]).arg(dest);
                c
            }
        };
        command
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

#[async_trait::async_trait]
impl Cloner for CommandCloner {
    async fn clone_repo(&self, target: &CloneTarget, dest: &Path) -> Result<(), CloneError> {
        let program = match target {
            CloneTarget::Url(_) => &self.git,
            CloneTarget::Reference(_) => &self.gh,
        };

        let output = self
            .command_for(target, dest)
            .output()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    program = %program,
                    path = %dest.display(),
                    "Failed to launch clone process"
                );
                CloneError::new(format!("failed to launch {program}: {e}"))
            })?;

        if output.status.success() {
            tracing::info!(
                clone_target = ?target,
                path = %dest.display(),
                status = ?output.status,
                "Successfully cloned repository"
            );
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("no diagnostic output")
            .trim()
            .to_string();
        tracing::error!(
            clone_target = ?target,
            path = %dest.display(),
            stderr = %stderr,
            "{} exited with non-zero code: {}", program, output.status
        );
        Err(CloneError::new(format!(
            "{program} exited with {}: {detail}",
            output.status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// Write an executable shell script into `dir` and return its path.
    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn passes_source_then_destination() {
        let dir = tempfile::tempdir().unwrap();
        let git_args = dir.path().join("git.args");
        let gh_args = dir.path().join("gh.args");
        let git = script(
            dir.path(),
            "fake-git",
            &format!("printf '%s\\n' \"$@\" > '{}'", git_args.display()),
        );
        let gh = script(
            dir.path(),
            "fake-gh",
            &format!("printf '%s\\n' \"$@\" > '{}'", gh_args.display()),
        );
        let cloner = CommandCloner::with_programs(git.to_string_lossy(), gh.to_string_lossy());
        let dest = dir.path().join("alpha");

        cloner
            .clone_repo(
                &CloneTarget::Url("https://github.com/acme/alpha.git".into()),
                &dest,
            )
            .await
            .unwrap();
        cloner
            .clone_repo(&CloneTarget::Reference("acme/alpha".into()), &dest)
            .await
            .unwrap();

        let dest = dest.display().to_string();
        assert_eq!(
            fs::read_to_string(&git_args).unwrap(),
            format!("clone\nhttps://github.com/acme/alpha.git\n{dest}\n")
        );
        assert_eq!(
            fs::read_to_string(&gh_args).unwrap(),
            format!("repo\nclone\nacme/alpha\n{dest}\n")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failure_reports_last_stderr_line() {
        let dir = tempfile::tempdir().unwrap();
        let git = script(
            dir.path(),
            "failing-git",
            "echo \"Cloning into 'alpha'...\" >&2\n\
             echo 'fatal: repository not found' >&2\n\
             echo '' >&2\n\
             exit 128",
        );
        let cloner = CommandCloner::with_programs(git.to_string_lossy(), "gh");

        let err = cloner
            .clone_repo(
                &CloneTarget::Url("https://github.com/acme/alpha.git".into()),
                &dir.path().join("alpha"),
            )
            .await
            .unwrap_err();

        assert!(err.message.contains("128"), "{}", err.message);
        assert!(
            err.message.ends_with(": fatal: repository not found"),
            "{}",
            err.message
        );
        assert!(!err.message.contains("Cloning into"), "{}", err.message);
    }

    #[tokio::test]
    async fn missing_program_is_a_clone_error() {
        let cloner = CommandCloner::with_programs(
            "repo-harvester-no-such-git",
            "repo-harvester-no-such-gh",
        );
        let dir = tempfile::tempdir().unwrap();
        let err = cloner
            .clone_repo(
                &CloneTarget::Url("https://example.invalid/x.git".into()),
                &dir.path().join("x"),
            )
            .await
            .unwrap_err();
        assert!(err.message.contains("failed to launch"), "{}", err.message);
    }
}
