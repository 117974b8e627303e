//! # 图像读写模块
//!
//! 负责在图像文件与像素网格之间转换，决定默认的输出路径，
//! 并保证隐写结果只会以无损格式写出。

use crate::constants::{
    DEFAULT_IMAGE_EXTENSION, DEFAULT_TEXT_EXTENSION, HIDDEN_PREFIX, RECOVERED_PREFIX,
};
use anyhow::{Context, Result};
use colored::Colorize;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 判断格式是否能逐位保留像素值。
///
/// `image` 的 WebP 编码器只支持无损模式，因此 WebP 也被视为无损格式。
pub fn is_lossless(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png
            | ImageFormat::Bmp
            | ImageFormat::Tiff
            | ImageFormat::Qoi
            | ImageFormat::WebP
    )
}

/// 读取并解码图像文件。
///
/// 对于有损格式 (如 JPEG) 只给出警告：作为载体图像可以接受，
/// 但从中恢复的隐藏数据很可能已经损坏。
pub fn load(path: &Path) -> Result<DynamicImage> {
    match ImageFormat::from_path(path) {
        Ok(format) if !is_lossless(format) => warn!(
            path = %path.display(),
            ?format,
            "lossy image format, hidden data may be corrupted"
        ),
        _ => {}
    }

    let picture = image::open(path).with_context(|| {
        format!(
            "Unable to read image file: {}",
            path.to_string_lossy().red().bold()
        )
    })?;
    debug!(
        width = picture.width(),
        height = picture.height(),
        color = ?picture.color(),
        "image decoded"
    );
    Ok(picture)
}

/// 确定隐写结果的保存格式。没有扩展名的路径会补上 `.png`。
///
/// # Errors
///
/// 当目标扩展名无法识别或对应有损格式时返回错误。
pub fn resolve_output(dest: PathBuf) -> Result<(PathBuf, ImageFormat)> {
    let dest = if dest.extension().is_none() {
        dest.with_extension(DEFAULT_IMAGE_EXTENSION)
    } else {
        dest
    };

    let format = ImageFormat::from_path(&dest).with_context(|| {
        format!(
            "Unsupported output image format: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    anyhow::ensure!(
        is_lossless(format),
        "Output format {:?} is lossy and would destroy the hidden data. \nSave the result as {} instead.",
        format,
        "PNG".green().bold()
    );

    Ok((dest, format))
}

/// 写出隐写结果图像。
pub fn save(picture: &DynamicImage, dest: &Path, format: ImageFormat) -> Result<()> {
    picture.save_with_format(dest, format).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })
}

/// 在输出文件已存在且未指定 `--force` 时拒绝继续。
pub fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 隐写结果的默认路径：与输入图像同目录的 `doctored_<stem>.png`。
pub fn default_hidden_path(image: &Path) -> PathBuf {
    sibling(image, HIDDEN_PREFIX, DEFAULT_IMAGE_EXTENSION)
}

/// 恢复文本的默认路径：与图像同目录的 `recovered_<stem>.txt`。
pub fn default_recovered_path(image: &Path) -> PathBuf {
    sibling(image, RECOVERED_PREFIX, DEFAULT_TEXT_EXTENSION)
}

fn sibling(path: &Path, prefix: &str, extension: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    let name = format!("{prefix}{stem}.{extension}");
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}
