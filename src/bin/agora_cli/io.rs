#![deny(clippy::all, clippy::pedantic)]

use std::fs;
use std::path::{Path, PathBuf};

use agora::application::repos::AvatarUpload;
use bytes::Bytes;

use crate::client::CliError;

fn read_error(path: &Path, source: std::io::Error) -> CliError {
    CliError::InputFile {
        path: path.display().to_string(),
        source,
    }
}

pub fn read_value(val: Option<String>, file: Option<PathBuf>) -> Result<String, CliError> {
    if let Some(path) = file {
        fs::read_to_string(&path).map_err(|source| read_error(&path, source))
    } else if let Some(v) = val {
        Ok(v)
    } else {
        Err(CliError::InvalidInput("value required".into()))
    }
}

pub fn read_avatar(path: &Path) -> Result<AvatarUpload, CliError> {
    let data = fs::read(path).map_err(|source| read_error(path, source))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::InvalidInput(format!("{} is not a file", path.display())))?;

    Ok(AvatarUpload {
        content_type: image_content_type(path).map(str::to_string),
        file_name,
        bytes: Bytes::from(data),
    })
}

fn image_content_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
