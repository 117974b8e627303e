//! # 命令处理逻辑模块
//!
//! 包含处理 `hide`、`recover` 和 `capacity` 子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、调用核心隐写算法以及向用户报告结果。

use crate::cli::{CapacityArgs, FramingKind, HideArgs, RecoverArgs};
use crate::constants::MAX_PAYLOAD_LEN;
use crate::error::StegoError;
use crate::image_io::{self, default_hidden_path, default_recovered_path, ensure_writable};
use crate::steganography::channel;
use crate::steganography::framing::{Framing, LengthPrefixed, Terminated};
use crate::steganography::{decode_bytes, decode_text, encode_bytes, encode_text};
use anyhow::{Context, Result};
use colored::Colorize;
use image::DynamicImage;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

/// 解码失败时附加在错误信息后的常见原因。
const RECOVER_HINTS: &str = "This could be because: \n\
    1. The image does not contain a hidden message\n\
    2. The image was saved in a lossy format like JPEG, which corrupts hidden data\n\
    3. The image was modified after the message was hidden";

/// 图像能够承载的负载大小。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityReport {
    pub width: u32,
    pub height: u32,
    /// 可用的隐写位数。
    pub bits: usize,
    /// 终止符分帧下可隐藏的最大字节数。
    pub terminated_bytes: usize,
    /// 长度前缀分帧下可隐藏的最大字节数。
    pub length_bytes: usize,
}

/// 处理 'Hide' 命令的执行逻辑。
///
/// 负责读取载体图像和待隐藏文本、按所选分帧方式调用隐写核心函数，
/// 最后将结果以无损格式写入目标图像文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径和分帧方式的 `HideArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像或文本文件，或文本不是合法的 UTF-8。
/// * 输出文件已存在且未指定 `--force`，或输出格式是有损格式。
/// * 图像文件没有足够的空间来隐藏文本。
/// * 无法写入到目标图像文件。
#[instrument(skip_all, fields(image = %args.image.display(), framing = ?args.framing))]
pub fn handle_hide(args: HideArgs) -> Result<()> {
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| default_hidden_path(&args.image));
    let (dest, format) = image_io::resolve_output(dest)?;
    ensure_writable(&dest, args.force)?;

    let text = read_payload(&args)?;
    if args.framing == FramingKind::Length {
        anyhow::ensure!(!text.is_empty(), "The credential to hide cannot be empty.");
    }

    let cover = image_io::load(&args.image)?;
    let doctored =
        hide_in(&cover, args.framing, &text).map_err(|err| explain_hide(err, &args.image))?;

    image_io::save(&doctored, &dest, format)?;
    info!(dest = %dest.display(), bytes = text.len(), "payload hidden");

    println!(
        "The text has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 负责读取经过隐写的图像文件、按所选分帧方式恢复隐藏的文本，
/// 最后将恢复的文本内容写入目标文本文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径和分帧方式的 `RecoverArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像文件。
/// * 输出文件已存在且未指定 `--force`。
/// * 图像中没有可识别的隐藏数据，或数据已损坏。
/// * 无法写入到目标文本文件。
#[instrument(skip_all, fields(image = %args.image.display(), framing = ?args.framing))]
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    let dest = args
        .text
        .clone()
        .unwrap_or_else(|| default_recovered_path(&args.image));
    ensure_writable(&dest, args.force)?;

    let picture = image_io::load(&args.image)?;
    let text = recover_from(&picture, args.framing).map_err(|err| {
        let diagnosis = err.diagnosis();
        anyhow::Error::new(err).context(format!(
            "Failed to recover the hidden message from '{}'. \n{}\n{}",
            args.image.to_string_lossy().red().bold(),
            diagnosis,
            RECOVER_HINTS
        ))
    })?;

    fs::write(&dest, &text).with_context(|| {
        format!(
            "Unable to write to target text file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;
    info!(dest = %dest.display(), bytes = text.len(), "payload recovered");

    println!(
        "The text has been successfully recovered and saved: {}",
        dest.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'Capacity' 命令的执行逻辑：计算并打印图像的隐写容量。
pub fn handle_capacity(args: CapacityArgs) -> Result<()> {
    let report = capacity_report(&args.image)?;

    println!(
        "{} ({} x {}): {} bits",
        args.image.to_string_lossy().bold(),
        report.width,
        report.height,
        report.bits.to_string().green().bold()
    );
    println!(
        "  terminated framing: up to {} bytes of text",
        report.terminated_bytes.to_string().green().bold()
    );
    println!(
        "  length framing:     up to {} bytes (limit {})",
        report.length_bytes.to_string().green().bold(),
        MAX_PAYLOAD_LEN
    );
    Ok(())
}

/// 读取图像并计算两种分帧方式下的最大负载。
pub fn capacity_report(path: &Path) -> Result<CapacityReport> {
    let picture = image_io::load(path)?;
    let grid = picture.to_rgb8();
    let bits = channel::capacity(&grid);

    Ok(CapacityReport {
        width: grid.width(),
        height: grid.height(),
        bits,
        terminated_bytes: Terminated.max_payload_len(bits),
        length_bytes: LengthPrefixed.max_payload_len(bits),
    })
}

fn read_payload(args: &HideArgs) -> Result<String> {
    match (&args.message, &args.text) {
        (Some(message), _) => Ok(message.clone()),
        (None, Some(path)) => fs::read_to_string(path).with_context(|| {
            format!(
                "Unable to read text file: {}",
                path.to_string_lossy().red().bold()
            )
        }),
        (None, None) => anyhow::bail!("Either a text file or a message is required."),
    }
}

/// 终止符分帧保留载体的透明通道；长度前缀分帧统一转换为 RGB。
fn hide_in(
    cover: &DynamicImage,
    framing: FramingKind,
    text: &str,
) -> Result<DynamicImage, StegoError> {
    match framing {
        FramingKind::Terminated if cover.color().has_alpha() => {
            encode_text(&cover.to_rgba8(), text).map(DynamicImage::ImageRgba8)
        }
        FramingKind::Terminated => encode_text(&cover.to_rgb8(), text).map(DynamicImage::ImageRgb8),
        FramingKind::Length => {
            encode_bytes(&cover.to_rgb8(), text.as_bytes()).map(DynamicImage::ImageRgb8)
        }
    }
}

fn recover_from(picture: &DynamicImage, framing: FramingKind) -> Result<String, StegoError> {
    match framing {
        FramingKind::Terminated => decode_text(&picture.to_rgb8()),
        FramingKind::Length => {
            let bytes = decode_bytes(&picture.to_rgb8())?;
            String::from_utf8(bytes).map_err(|err| StegoError::DecodeFormat(err.utf8_error()))
        }
    }
}

fn explain_hide(err: StegoError, image: &Path) -> anyhow::Error {
    match err {
        StegoError::Capacity {
            required,
            available,
        } => anyhow::anyhow!(
            "Not enough space in the image to hide the text. \nRequired: {} bits, Available: {} bits",
            required.to_string().red().bold(),
            available.to_string().green().bold()
        ),
        other => {
            let diagnosis = other.diagnosis();
            anyhow::Error::new(other).context(format!(
                "Failed to hide the text in '{}'. \n{}",
                image.to_string_lossy().red().bold(),
                diagnosis
            ))
        }
    }
}
