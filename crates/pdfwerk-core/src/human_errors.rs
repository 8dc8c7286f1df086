// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to a plain sentence with a suggestion, in
// the user's display language. The severity drives how the presentation layer
// frames the message.

use crate::error::PdfwerkError;
use crate::i18n::Locale;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Trying again may work (I/O hiccup, one bad page).
    Transient,
    /// The user must change something (pick files, fix the page range, install
    /// a language pack).
    ActionRequired,
    /// The input cannot be processed as given.
    Permanent,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain summary (shown first).
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
    pub severity: Severity,
}

impl HumanError {
    fn new(message: &str, suggestion: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            severity,
        }
    }
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `PdfwerkError` into a `HumanError` in the given locale.
pub fn humanize_error(err: &PdfwerkError, locale: Locale) -> HumanError {
    match locale {
        Locale::Zh => humanize_zh(err),
        Locale::En => humanize_en(err),
    }
}

fn humanize_en(err: &PdfwerkError) -> HumanError {
    use Severity::*;
    match err {
        PdfwerkError::InputValidation(detail) => HumanError::new(
            "That request can't be carried out as entered.",
            format!("Check the files and page numbers and try again. ({detail})"),
            ActionRequired,
        ),
        PdfwerkError::PdfError(_) => HumanError::new(
            "There's a problem with this PDF file.",
            "The file may be damaged or password-protected. Try opening it in a PDF viewer first.",
            Permanent,
        ),
        PdfwerkError::Render(detail) => HumanError::new(
            "A page couldn't be drawn.",
            format!("Try a smaller scale, or check the page in a PDF viewer. ({detail})"),
            Transient,
        ),
        PdfwerkError::ImageError(_) => HumanError::new(
            "A page image couldn't be encoded.",
            "Try a different image format.",
            Transient,
        ),
        PdfwerkError::Export(_) => HumanError::new(
            "The output file couldn't be assembled.",
            "Check there is enough free disk space, then try again.",
            Transient,
        ),
        PdfwerkError::EngineInit(detail) => HumanError::new(
            "Text recognition couldn't start.",
            format!(
                "Make sure the OCR engine and the language data for the chosen language are installed. ({detail})"
            ),
            ActionRequired,
        ),
        PdfwerkError::PageProcessing { page, .. } => HumanError::new(
            "One page couldn't be recognized.",
            format!("Page {page} may be blank or unreadable; the other pages were still processed."),
            Transient,
        ),
        PdfwerkError::OcrError(_) => HumanError::new(
            "Text recognition didn't work on this document.",
            "Make sure the PDF is clear and legible, then try again.",
            Transient,
        ),
        PdfwerkError::Config(detail) => HumanError::new(
            "The settings file has a problem.",
            format!("Fix or delete the config file and try again. ({detail})"),
            ActionRequired,
        ),
        PdfwerkError::Io(io_err) => humanize_io_en(io_err),
        PdfwerkError::Serialization(_) => HumanError::new(
            "The results couldn't be written out.",
            "Try again. If this keeps happening, please report it.",
            Transient,
        ),
    }
}

fn humanize_io_en(io_err: &std::io::Error) -> HumanError {
    match io_err.kind() {
        std::io::ErrorKind::NotFound => HumanError::new(
            "The file couldn't be found.",
            "It may have been moved or deleted. Check the path and try again.",
            Severity::ActionRequired,
        ),
        std::io::ErrorKind::PermissionDenied => HumanError::new(
            "pdfwerk doesn't have permission to use that file.",
            "Check the file permissions, or choose a different output location.",
            Severity::ActionRequired,
        ),
        _ => HumanError::new(
            "There was a problem reading or writing a file.",
            "Try again. If this keeps happening, your disk may be full.",
            Severity::Transient,
        ),
    }
}

fn humanize_zh(err: &PdfwerkError) -> HumanError {
    use Severity::*;
    match err {
        PdfwerkError::InputValidation(detail) => HumanError::new(
            "输入无效，操作未执行。",
            format!("请检查所选文件和页码后重试。（{detail}）"),
            ActionRequired,
        ),
        PdfwerkError::PdfError(_) => HumanError::new(
            "这个PDF文件有问题。",
            "文件可能已损坏或受密码保护，请先用PDF阅读器打开确认。",
            Permanent,
        ),
        PdfwerkError::Render(detail) => HumanError::new(
            "页面渲染失败。",
            format!("请尝试更小的缩放比例，或在PDF阅读器中检查该页。（{detail}）"),
            Transient,
        ),
        PdfwerkError::ImageError(_) => HumanError::new(
            "页面图片编码失败。",
            "请尝试其他图片格式。",
            Transient,
        ),
        PdfwerkError::Export(_) => HumanError::new(
            "输出文件生成失败。",
            "请确认磁盘空间充足后重试。",
            Transient,
        ),
        PdfwerkError::EngineInit(detail) => HumanError::new(
            "文字识别引擎无法启动。",
            format!("请确认已安装OCR引擎及所选语言的语言包。（{detail}）"),
            ActionRequired,
        ),
        PdfwerkError::PageProcessing { page, .. } => HumanError::new(
            "有一页未能识别。",
            format!("第 {page} 页可能为空白或无法辨认，其余页面已正常处理。"),
            Transient,
        ),
        PdfwerkError::OcrError(_) => HumanError::new(
            "文字识别失败。",
            "请确保PDF文件清晰可读后重试。",
            Transient,
        ),
        PdfwerkError::Config(detail) => HumanError::new(
            "配置文件有误。",
            format!("请修正或删除配置文件后重试。（{detail}）"),
            ActionRequired,
        ),
        PdfwerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError::new(
                "找不到该文件。",
                "文件可能已被移动或删除，请检查路径后重试。",
                ActionRequired,
            ),
            std::io::ErrorKind::PermissionDenied => HumanError::new(
                "没有访问该文件的权限。",
                "请检查文件权限，或选择其他输出位置。",
                ActionRequired,
            ),
            _ => HumanError::new(
                "读写文件时出错。",
                "请重试。如果问题持续出现，磁盘可能已满。",
                Transient,
            ),
        },
        PdfwerkError::Serialization(_) => HumanError::new(
            "结果无法写出。",
            "请重试。如果问题持续出现，请反馈此问题。",
            Transient,
        ),
    }
}
