// `cp`: copy between the local disk and a library, or between two libraries.
// Which of the three happens depends on which side carries the `sf://`
// scheme; a library-to-library copy runs on the server.

use super::util::{parent_dir, parse_remote, spinner, strip_remote, RemotePath};
use crate::client::Client;
use crate::file::base_name;
use anyhow::{bail, Context, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const USAGE: &str = "
  cp <src> <dst>         copy a file; a dst ending in / keeps the source name
  cp local.txt sf://library/dir/      upload
  cp sf://library/a.txt ./a.txt       download
  cp sf://lib1/a.txt sf://lib2/dir/   copy between libraries on the server
";

/// What a `cp` invocation resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyPlan {
    Upload { local: PathBuf, remote: RemotePath },
    Download { remote: RemotePath, local: PathBuf },
    Transfer { from: RemotePath, to: RemotePath },
}

pub fn run(client: &Client, args: &[String]) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with(client, args, &mut out)
}

/// `run` with an explicit sink for the `src -> dst` line.
pub fn run_with(client: &Client, args: &[String], out: &mut dyn Write) -> Result<()> {
    let [src, dst] = args else {
        bail!("cp takes exactly two arguments{}", USAGE);
    };
    let plan = plan_copy(src, dst)?;
    writeln!(out, "{} -> {}", src, plan.destination())?;
    execute(client, &plan)
}

/// Decide the direction of the copy and fill in the destination name.
pub fn plan_copy(src: &str, dst: &str) -> Result<CopyPlan> {
    let mut dst = dst.to_string();
    if dst.ends_with('/') {
        dst.push_str(base_name(strip_remote(src).unwrap_or(src)));
    }

    let plan = match (strip_remote(src), strip_remote(&dst)) {
        (Some(from), Some(to)) => CopyPlan::Transfer {
            from: parse_remote(from),
            to: parse_remote(to),
        },
        (Some(from), None) => CopyPlan::Download {
            remote: parse_remote(from),
            local: PathBuf::from(&dst),
        },
        (None, Some(to)) => CopyPlan::Upload {
            local: PathBuf::from(src),
            remote: parse_remote(to),
        },
        (None, None) => bail!("local to local copy is not supported"),
    };
    Ok(plan)
}

impl CopyPlan {
    /// Where the copy ends up, in the same notation the user types.
    pub fn destination(&self) -> String {
        match self {
            CopyPlan::Upload { remote, .. } => remote.to_string(),
            CopyPlan::Download { local, .. } => local.display().to_string(),
            CopyPlan::Transfer { to, .. } => to.to_string(),
        }
    }
}

pub fn execute(client: &Client, plan: &CopyPlan) -> Result<()> {
    match plan {
        CopyPlan::Upload { local, remote } => upload(client, local, remote),
        CopyPlan::Download { remote, local } => download(client, remote, local),
        CopyPlan::Transfer { from, to } => transfer(client, from, to),
    }
}

fn upload(client: &Client, local: &Path, remote: &RemotePath) -> Result<()> {
    let content = std::fs::read(local).with_context(|| format!("reading {}", local.display()))?;
    let library = client
        .get_library_by_name(&remote.library)
        .with_context(|| format!("looking up library {:?}", remote.library))?;

    let progress = spinner("Uploading...");
    let result = client
        .repo(&library.id)
        .upload_file(&parent_dir(&remote.path), base_name(&remote.path), content);
    progress.finish_and_clear();

    result.with_context(|| format!("uploading to {}{}", library.name, remote.path))?;
    Ok(())
}

fn download(client: &Client, remote: &RemotePath, local: &Path) -> Result<()> {
    let library = client
        .get_library_by_name(&remote.library)
        .with_context(|| format!("looking up library {:?}", remote.library))?;

    let local = if local.is_dir() {
        local.join(base_name(&remote.path))
    } else {
        local.to_path_buf()
    };

    let progress = spinner("Downloading...");
    let result = client.repo(&library.id).download_file(&remote.path);
    progress.finish_and_clear();

    let content = result.with_context(|| format!("downloading {}{}", library.name, remote.path))?;
    std::fs::write(&local, content).with_context(|| format!("writing {}", local.display()))?;
    Ok(())
}

fn transfer(client: &Client, from: &RemotePath, to: &RemotePath) -> Result<()> {
    let src_library = client
        .get_library_by_name(&from.library)
        .with_context(|| format!("looking up source library {:?}", from.library))?;
    let dst_library = client
        .get_library_by_name(&to.library)
        .with_context(|| format!("looking up destination library {:?}", to.library))?;

    if base_name(&from.path) != base_name(&to.path) {
        warn!(from = %from.path, to = %to.path, "server-side copy keeps the source file name");
    }

    client
        .repo(&src_library.id)
        .copy_file(&from.path, &dst_library.id, &parent_dir(&to.path))
        .with_context(|| format!("copying {}{} to {}", src_library.name, from.path, dst_library.name))?;
    Ok(())
}
